//! Header catalog: the ordered column descriptors applied to every record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extraction::Extractor;

/// Semantic role of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Value stored as a property under the column name
    Property,
    /// Value read and discarded
    Ignore,
    /// Node identifier
    Id,
    /// Node label(s)
    Label,
    /// Relationship start node reference
    StartId,
    /// Relationship end node reference
    EndId,
    /// Relationship type
    Type,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Property => "PROPERTY",
            Role::Ignore => "IGNORE",
            Role::Id => "ID",
            Role::Label => "LABEL",
            Role::StartId => "START_ID",
            Role::EndId => "END_ID",
            Role::Type => "TYPE",
        };
        write!(f, "{}", name)
    }
}

/// One column descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: Option<String>,
    role: Role,
    extractor: Extractor,
}

impl Entry {
    pub fn new(name: Option<String>, role: Role, extractor: Extractor) -> Self {
        Self {
            name,
            role,
            extractor,
        }
    }

    /// Named property column
    pub fn property(name: impl Into<String>, extractor: Extractor) -> Self {
        Self::new(Some(name.into()), Role::Property, extractor)
    }

    /// Unnamed column with the given role
    pub fn unnamed(role: Role, extractor: Extractor) -> Self {
        Self::new(None, role, extractor)
    }

    /// Named column with the given role
    pub fn named(name: impl Into<String>, role: Role, extractor: Extractor) -> Self {
        Self::new(Some(name.into()), role, extractor)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Column name, or its index when the column is unnamed
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => index.to_string(),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}({})",
            self.name.as_deref().unwrap_or(""),
            self.role,
            self.extractor
        )
    }
}

/// Ordered, immutable list of column descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    entries: Vec<Entry>,
}

impl Header {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of columns that produce properties
    pub fn property_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.role == Role::Property)
            .count()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", entry)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ElementType;

    #[test]
    fn test_header_description() {
        let header = Header::new(vec![
            Entry::named("id", Role::Id, Extractor::Long),
            Entry::property("name", Extractor::String),
            Entry::unnamed(Role::Label, Extractor::array(ElementType::String)),
        ]);

        assert_eq!(
            header.to_string(),
            "[id:ID(long), name:PROPERTY(string), :LABEL(string[])]"
        );
        assert_eq!(header.len(), 3);
        assert_eq!(header.property_count(), 1);
    }

    #[test]
    fn test_entry_label() {
        let named = Entry::property("name", Extractor::String);
        let unnamed = Entry::unnamed(Role::Ignore, Extractor::String);
        assert_eq!(named.label(4), "name");
        assert_eq!(unnamed.label(4), "4");
    }
}
