//! Graph entities produced from delimited records.
//!
//! A record becomes either an [`InputNode`] or an [`InputRelationship`],
//! wrapped in [`InputEntity`]. Both carry their properties as an ordered list
//! of `(name, value)` pairs in header order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a decoded field value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Char(char),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Long(l) => write!(f, "{}", l),
            Value::Double(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Ordered property list, alternating name and value as pairs
pub type Properties = Vec<(String, Value)>;

/// A node read from one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputNode {
    /// Description of the data source the record came from
    pub source_description: String,
    /// Byte offset in the source just after the record
    pub position: u64,
    pub id: Option<Value>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

/// A relationship read from one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRelationship {
    pub source_description: String,
    pub position: u64,
    pub start_id: Option<Value>,
    pub end_id: Option<Value>,
    #[serde(rename = "type")]
    pub rel_type: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

/// Entity produced by the deserializer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEntity {
    Node(InputNode),
    Relationship(InputRelationship),
}

impl InputEntity {
    pub fn properties(&self) -> &[(String, Value)] {
        match self {
            InputEntity::Node(node) => &node.properties,
            InputEntity::Relationship(rel) => &rel.properties,
        }
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn position(&self) -> u64 {
        match self {
            InputEntity::Node(node) => node.position,
            InputEntity::Relationship(rel) => rel.position,
        }
    }

    pub fn as_node(&self) -> Option<&InputNode> {
        match self {
            InputEntity::Node(node) => Some(node),
            InputEntity::Relationship(_) => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&InputRelationship> {
        match self {
            InputEntity::Relationship(rel) => Some(rel),
            InputEntity::Node(_) => None,
        }
    }

    pub fn into_node(self) -> Option<InputNode> {
        match self {
            InputEntity::Node(node) => Some(node),
            InputEntity::Relationship(_) => None,
        }
    }

    pub fn into_relationship(self) -> Option<InputRelationship> {
        match self {
            InputEntity::Relationship(rel) => Some(rel),
            InputEntity::Node(_) => None,
        }
    }
}

/// Common serialization surface for produced entities.
pub trait Entity: Serialize + Sized {
    /// Convert entity to JSON string
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Convert entity to NDJSON line (newline-delimited JSON)
    fn to_ndjson_line(&self) -> Result<String, serde_json::Error> {
        let json = self.to_json()?;
        Ok(format!("{}\n", json))
    }
}

impl Entity for InputNode {}

impl Entity for InputRelationship {}

impl Entity for InputEntity {}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> InputNode {
        InputNode {
            source_description: "people.csv".to_string(),
            position: 12,
            id: Some(Value::Long(1)),
            labels: vec!["Person".to_string()],
            properties: vec![
                ("name".to_string(), Value::from("Alice")),
                ("age".to_string(), Value::Long(30)),
            ],
        }
    }

    #[test]
    fn test_property_lookup() {
        let entity = InputEntity::Node(node());
        assert_eq!(entity.property("name"), Some(&Value::from("Alice")));
        assert_eq!(entity.property("missing"), None);
        assert_eq!(entity.position(), 12);
        assert!(entity.as_relationship().is_none());
    }

    #[test]
    fn test_entity_to_json() {
        let json = InputEntity::Node(node()).to_json().unwrap();
        assert!(json.contains("\"kind\":\"node\""));
        assert!(json.contains("Alice"));
        assert!(json.contains("\"labels\":[\"Person\"]"));
    }

    #[test]
    fn test_relationship_type_renamed() {
        let rel = InputRelationship {
            source_description: "knows.csv".to_string(),
            position: 0,
            start_id: Some(Value::Long(1)),
            end_id: Some(Value::Long(2)),
            rel_type: Some("KNOWS".to_string()),
            properties: vec![],
        };
        let line = rel.to_ndjson_line().unwrap();
        assert!(line.ends_with('\n'));
        assert!(line.contains("\"type\":\"KNOWS\""));
    }

    #[test]
    fn test_value_display() {
        let value = Value::Array(vec![Value::Long(1), Value::from("a")]);
        assert_eq!(value.to_string(), "[1, a]");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }
}
