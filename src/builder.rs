//! Entity construction from one record's worth of fields.
//!
//! [`EntityBuilder`] is a closed set of builders, one per entity kind. The
//! deserializer handles property and ignored columns itself and hands every
//! other column to the builder, which stashes side data (ids, labels,
//! endpoints) until the record is complete.

use crate::entity::{InputEntity, InputNode, InputRelationship, Properties, Value};
use crate::error::InputError;
use crate::header::{Entry, Role};

const INITIAL_PROPERTY_CAPACITY: usize = 10;

/// Reusable scratch storage for the properties of the record being read.
///
/// Slots are kept between records and overwritten; only the first `len`
/// slots belong to the current record. Capacity grows and never shrinks.
#[derive(Debug)]
pub struct PropertyBuffer {
    slots: Vec<(String, Value)>,
    len: usize,
}

impl PropertyBuffer {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_PROPERTY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    /// Append a property to the current record
    pub fn push(&mut self, key: &str, value: Value) {
        if self.len < self.slots.len() {
            let slot = &mut self.slots[self.len];
            slot.0.clear();
            slot.0.push_str(key);
            slot.1 = value;
        } else {
            self.ensure_capacity(self.len + 1);
            self.slots.push((key.to_string(), value));
        }
        self.len += 1;
    }

    fn ensure_capacity(&mut self, required: usize) {
        let capacity = self.slots.capacity();
        if required > capacity {
            let target = (capacity * 2).max(required);
            self.slots.reserve_exact(target - self.slots.len());
        }
    }

    /// Exact-length copy of the current record's properties
    pub fn snapshot(&self) -> Properties {
        self.slots[..self.len].to_vec()
    }

    /// Reset the logical length; slot storage is kept for reuse
    pub fn reset(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}

impl Default for PropertyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds nodes from id and label columns
#[derive(Debug, Clone, Default)]
pub struct NodeBuilder {
    require_id: bool,
    id: Option<Value>,
    labels: Vec<String>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject nodes that end up without an id
    pub fn requiring_id() -> Self {
        Self {
            require_id: true,
            ..Self::default()
        }
    }

    fn handle_value(&mut self, entry: &Entry, value: Option<Value>, properties: &mut PropertyBuffer) {
        match entry.role() {
            Role::Id => {
                // A named id column is also a property
                if let (Some(name), Some(value)) = (entry.name(), value.as_ref()) {
                    properties.push(name, value.clone());
                }
                self.id = value;
            }
            Role::Label => match value {
                Some(Value::Array(values)) => {
                    self.labels.extend(values.into_iter().map(label_name));
                }
                Some(value) => self.labels.push(label_name(value)),
                None => {}
            },
            _ => {}
        }
    }

    fn build(&mut self, properties: Properties, source_description: String, position: u64) -> InputNode {
        InputNode {
            source_description,
            position,
            id: self.id.take(),
            labels: std::mem::take(&mut self.labels),
            properties,
        }
    }

    fn validate(&self, node: &InputNode) -> Result<(), InputError> {
        if self.require_id && node.id.is_none() {
            return Err(InputError::Data("No node id specified".to_string()));
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.id = None;
        self.labels.clear();
    }
}

fn label_name(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Builds relationships from start, end and type columns
#[derive(Debug, Clone, Default)]
pub struct RelationshipBuilder {
    start_id: Option<Value>,
    end_id: Option<Value>,
    rel_type: Option<String>,
}

impl RelationshipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle_value(&mut self, entry: &Entry, value: Option<Value>) {
        match entry.role() {
            Role::StartId => self.start_id = value,
            Role::EndId => self.end_id = value,
            Role::Type => self.rel_type = value.map(label_name),
            _ => {}
        }
    }

    fn build(
        &mut self,
        properties: Properties,
        source_description: String,
        position: u64,
    ) -> InputRelationship {
        InputRelationship {
            source_description,
            position,
            start_id: self.start_id.take(),
            end_id: self.end_id.take(),
            rel_type: self.rel_type.take(),
            properties,
        }
    }

    fn validate(relationship: &InputRelationship) -> Result<(), InputError> {
        if relationship.start_id.is_none() {
            return Err(InputError::Data("No start id specified".to_string()));
        }
        if relationship.end_id.is_none() {
            return Err(InputError::Data("No end id specified".to_string()));
        }
        if relationship.rel_type.is_none() {
            return Err(InputError::Data("No relationship type specified".to_string()));
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.start_id = None;
        self.end_id = None;
        self.rel_type = None;
    }
}

/// Kind-specific half of the deserializer
#[derive(Debug, Clone)]
pub enum EntityBuilder {
    Node(NodeBuilder),
    Relationship(RelationshipBuilder),
}

impl EntityBuilder {
    pub fn nodes() -> Self {
        EntityBuilder::Node(NodeBuilder::new())
    }

    pub fn relationships() -> Self {
        EntityBuilder::Relationship(RelationshipBuilder::new())
    }

    /// Handle a column whose role is neither property nor ignore
    pub fn handle_value(&mut self, entry: &Entry, value: Option<Value>, properties: &mut PropertyBuffer) {
        match self {
            EntityBuilder::Node(builder) => builder.handle_value(entry, value, properties),
            EntityBuilder::Relationship(builder) => builder.handle_value(entry, value),
        }
    }

    /// Create the entity from the record's properties and stashed side data
    pub fn build(&mut self, properties: Properties, source_description: String, position: u64) -> InputEntity {
        match self {
            EntityBuilder::Node(builder) => {
                InputEntity::Node(builder.build(properties, source_description, position))
            }
            EntityBuilder::Relationship(builder) => InputEntity::Relationship(builder.build(
                properties,
                source_description,
                position,
            )),
        }
    }

    /// Check a built, decorated entity
    pub fn validate(&self, entity: &InputEntity) -> Result<(), InputError> {
        match (self, entity) {
            (EntityBuilder::Node(builder), InputEntity::Node(node)) => builder.validate(node),
            (EntityBuilder::Relationship(_), InputEntity::Relationship(rel)) => {
                RelationshipBuilder::validate(rel)
            }
            _ => Err(InputError::Data(
                "Decorator changed the kind of entity".to_string(),
            )),
        }
    }

    /// Drop side data stashed for an unfinished record
    pub fn reset(&mut self) {
        match self {
            EntityBuilder::Node(builder) => builder.reset(),
            EntityBuilder::Relationship(builder) => builder.reset(),
        }
    }
}
