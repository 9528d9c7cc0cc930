//! Post-build transforms applied to every entity.
//!
//! A [`Decorator`] runs after an entity is built and before it is validated,
//! typically to fill in defaults the input left out.

use uuid::Uuid;

use crate::entity::{InputEntity, Value};

/// Transform applied to each built entity
pub trait Decorator: Send {
    fn apply(&self, entity: InputEntity) -> InputEntity;
}

/// Closures are decorators
impl<F> Decorator for F
where
    F: Fn(InputEntity) -> InputEntity + Send,
{
    fn apply(&self, entity: InputEntity) -> InputEntity {
        self(entity)
    }
}

/// Leave entities as they are
pub fn no_decorator() -> impl Decorator {
    |entity: InputEntity| entity
}

/// Add labels to every node, skipping labels it already has
pub fn additive_labels<I, S>(labels: I) -> impl Decorator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
    move |entity: InputEntity| match entity {
        InputEntity::Node(mut node) => {
            for label in &labels {
                if !node.labels.contains(label) {
                    node.labels.push(label.clone());
                }
            }
            InputEntity::Node(node)
        }
        other => other,
    }
}

/// Give relationships without a type the given one
pub fn default_relationship_type(rel_type: impl Into<String>) -> impl Decorator {
    let rel_type = rel_type.into();
    move |entity: InputEntity| match entity {
        InputEntity::Relationship(mut rel) => {
            if rel.rel_type.is_none() {
                rel.rel_type = Some(rel_type.clone());
            }
            InputEntity::Relationship(rel)
        }
        other => other,
    }
}

/// Assign a random UUID id to nodes that have none
pub fn generated_ids() -> impl Decorator {
    |entity: InputEntity| match entity {
        InputEntity::Node(mut node) => {
            if node.id.is_none() {
                node.id = Some(Value::String(Uuid::new_v4().to_string()));
            }
            InputEntity::Node(node)
        }
        other => other,
    }
}

/// Apply `first`, then `second`
pub fn chain(first: impl Decorator, second: impl Decorator) -> impl Decorator {
    move |entity: InputEntity| second.apply(first.apply(entity))
}

/// Apply each decorator in order
pub fn all(decorators: Vec<Box<dyn Decorator>>) -> impl Decorator {
    move |entity: InputEntity| {
        decorators
            .iter()
            .fold(entity, |entity, decorator| decorator.apply(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{InputNode, InputRelationship};

    fn node(id: Option<Value>, labels: &[&str]) -> InputEntity {
        InputEntity::Node(InputNode {
            source_description: "test".to_string(),
            position: 0,
            id,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties: vec![],
        })
    }

    fn relationship(rel_type: Option<&str>) -> InputEntity {
        InputEntity::Relationship(InputRelationship {
            source_description: "test".to_string(),
            position: 0,
            start_id: Some(Value::Long(1)),
            end_id: Some(Value::Long(2)),
            rel_type: rel_type.map(str::to_string),
            properties: vec![],
        })
    }

    #[test]
    fn test_additive_labels() {
        let decorator = additive_labels(["Person", "Imported"]);
        let decorated = decorator.apply(node(None, &["Person"]));
        assert_eq!(decorated.as_node().unwrap().labels, vec!["Person", "Imported"]);
    }

    #[test]
    fn test_default_relationship_type() {
        let decorator = default_relationship_type("KNOWS");
        let filled = decorator.apply(relationship(None));
        assert_eq!(filled.as_relationship().unwrap().rel_type.as_deref(), Some("KNOWS"));

        let kept = decorator.apply(relationship(Some("LIKES")));
        assert_eq!(kept.as_relationship().unwrap().rel_type.as_deref(), Some("LIKES"));
    }

    #[test]
    fn test_generated_ids() {
        let decorator = generated_ids();
        let generated = decorator.apply(node(None, &[]));
        let id = generated.as_node().unwrap().id.clone().unwrap();
        assert!(Uuid::parse_str(id.as_str().unwrap()).is_ok());

        let kept = decorator.apply(node(Some(Value::Long(5)), &[]));
        assert_eq!(kept.as_node().unwrap().id, Some(Value::Long(5)));
    }

    #[test]
    fn test_chain_and_all() {
        let chained = chain(additive_labels(["A"]), additive_labels(["B"]));
        let decorated = chained.apply(node(None, &[]));
        assert_eq!(decorated.as_node().unwrap().labels, vec!["A", "B"]);

        let boxed: Vec<Box<dyn Decorator>> =
            vec![Box::new(additive_labels(["C"])), Box::new(generated_ids())];
        let decorated = all(boxed).apply(node(None, &[]));
        assert_eq!(decorated.as_node().unwrap().labels, vec!["C"]);
        assert!(decorated.as_node().unwrap().id.is_some());

        let identity = no_decorator();
        assert_eq!(identity.apply(node(None, &["X"])), node(None, &["X"]));
    }
}
