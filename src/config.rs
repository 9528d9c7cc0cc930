//! Import configuration loaded from YAML.
//!
//! Describes one input: which entity kind it holds, how its fields are
//! delimited, the column catalog, and which decorators to apply.
//!
//! ```yaml
//! kind: nodes
//! delimiter: ","
//! array_delimiter: ";"
//! has_header_line: true
//! columns:
//!   - name: id
//!     role: id
//!     type: long
//!   - name: name
//!   - role: label
//!     type: string[]
//! decorate:
//!   labels: [Imported]
//! ```

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::{EntityBuilder, NodeBuilder, RelationshipBuilder};
use crate::cursor::{BufferedCharSeeker, DEFAULT_QUOTE};
use crate::decorator::{self, Decorator};
use crate::deserializer::InputEntityDeserializer;
use crate::extraction::{Extractor, DEFAULT_ARRAY_DELIMITER};
use crate::header::{Entry, Header, Role};

/// Errors raised while loading or applying an import configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Kind of entity an input holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Nodes,
    Relationships,
}

/// One column of the input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_role")]
    pub role: Role,

    /// Type name, e.g. `long` or `string[]`
    #[serde(rename = "type", default = "default_type")]
    pub column_type: String,
}

/// Decorators to apply to every entity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecorateConfig {
    /// Labels added to every node
    #[serde(default)]
    pub labels: Vec<String>,

    /// Type given to relationships that have none
    #[serde(default)]
    pub default_type: Option<String>,

    /// Assign UUID ids to nodes without one
    #[serde(default)]
    pub generate_ids: bool,
}

/// Configuration of one delimited input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub kind: EntityKind,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default = "default_array_delimiter")]
    pub array_delimiter: char,

    #[serde(default = "default_quote")]
    pub quote: char,

    /// Skip the first line of the input
    #[serde(default)]
    pub has_header_line: bool,

    /// Reject nodes without an id
    #[serde(default)]
    pub require_id: bool,

    pub columns: Vec<ColumnConfig>,

    #[serde(default)]
    pub decorate: DecorateConfig,
}

fn default_role() -> Role {
    Role::Property
}

fn default_type() -> String {
    "string".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_array_delimiter() -> char {
    DEFAULT_ARRAY_DELIMITER
}

fn default_quote() -> char {
    DEFAULT_QUOTE as char
}

impl ImportConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Example
    /// ```ignore
    /// use csvgraph::ImportConfig;
    ///
    /// let config = ImportConfig::load_from_file("config/people.yaml")?;
    /// let header = config.header()?;
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: ImportConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::Invalid("no columns defined".to_string()));
        }
        let delimiter = ascii_byte("delimiter", self.delimiter)?;
        let quote = ascii_byte("quote", self.quote)?;
        if delimiter == quote {
            return Err(ConfigError::Invalid(
                "delimiter and quote must differ".to_string(),
            ));
        }
        if self.array_delimiter == self.delimiter {
            return Err(ConfigError::Invalid(
                "array delimiter and delimiter must differ".to_string(),
            ));
        }

        for (index, column) in self.columns.iter().enumerate() {
            let allowed = match (self.kind, column.role) {
                (_, Role::Property | Role::Ignore) => true,
                (EntityKind::Nodes, Role::Id | Role::Label) => true,
                (EntityKind::Relationships, Role::StartId | Role::EndId | Role::Type) => true,
                _ => false,
            };
            if !allowed {
                return Err(ConfigError::Invalid(format!(
                    "column {} has role {} which {:?} inputs do not accept",
                    index, column.role, self.kind
                )));
            }
            column
                .column_type
                .parse::<Extractor>()
                .map_err(|e| ConfigError::Invalid(format!("column {}: {}", index, e)))?;
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        ascii_byte("delimiter", self.delimiter)
    }

    pub fn quote_byte(&self) -> Result<u8, ConfigError> {
        ascii_byte("quote", self.quote)
    }

    /// Build the column catalog
    pub fn header(&self) -> Result<Header, ConfigError> {
        let entries = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let extractor = match column.column_type.parse::<Extractor>() {
                    Ok(Extractor::Array { element, .. }) => Extractor::Array {
                        element,
                        delimiter: self.array_delimiter,
                    },
                    Ok(extractor) => extractor,
                    Err(e) => {
                        return Err(ConfigError::Invalid(format!("column {}: {}", index, e)))
                    }
                };
                Ok(Entry::new(column.name.clone(), column.role, extractor))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Header::new(entries))
    }

    pub fn builder(&self) -> EntityBuilder {
        match self.kind {
            EntityKind::Nodes if self.require_id => EntityBuilder::Node(NodeBuilder::requiring_id()),
            EntityKind::Nodes => EntityBuilder::nodes(),
            EntityKind::Relationships => EntityBuilder::Relationship(RelationshipBuilder::new()),
        }
    }

    /// Decorator combining every configured decoration
    pub fn decorator(&self) -> impl Decorator {
        let mut decorators: Vec<Box<dyn Decorator>> = Vec::new();
        if !self.decorate.labels.is_empty() {
            decorators.push(Box::new(decorator::additive_labels(
                self.decorate.labels.clone(),
            )));
        }
        if let Some(rel_type) = &self.decorate.default_type {
            decorators.push(Box::new(decorator::default_relationship_type(
                rel_type.clone(),
            )));
        }
        if self.decorate.generate_ids {
            decorators.push(Box::new(decorator::generated_ids()));
        }
        decorator::all(decorators)
    }

    /// Open a file as configured and create its deserializer
    pub fn open<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<InputEntityDeserializer<BufferedCharSeeker<File>>, ConfigError> {
        let path = path.as_ref();
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut seeker = BufferedCharSeeker::from_path(path)
            .map_err(io_error)?
            .with_quote(self.quote_byte()?)
            .with_delimiter(self.delimiter_byte()?);
        if self.has_header_line {
            seeker.skip_line().map_err(io_error)?;
        }

        Ok(InputEntityDeserializer::new(
            Arc::new(self.header()?),
            seeker,
            self.delimiter_byte()?,
            self.builder(),
            self.decorator(),
        ))
    }
}

fn ascii_byte(what: &str, c: char) -> Result<u8, ConfigError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(ConfigError::Invalid(format!("{} '{}' is not ASCII", what, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES: &str = r#"
kind: nodes
array_delimiter: "|"
columns:
  - name: id
    role: id
    type: long
  - name: name
  - role: label
    type: string[]
decorate:
  labels: [Imported]
"#;

    #[test]
    fn test_parse_nodes_config() {
        let config = ImportConfig::from_yaml_str(NODES).unwrap();
        assert_eq!(config.kind, EntityKind::Nodes);
        assert_eq!(config.delimiter_byte().unwrap(), b',');
        assert_eq!(config.quote_byte().unwrap(), b'"');
        assert!(!config.has_header_line);

        let header = config.header().unwrap();
        assert_eq!(header.len(), 3);
        assert_eq!(header.entries()[1].role(), Role::Property);
        assert_eq!(header.entries()[1].extractor(), &Extractor::String);
        assert!(matches!(
            header.entries()[2].extractor(),
            Extractor::Array { delimiter: '|', .. }
        ));
        assert!(matches!(config.builder(), EntityBuilder::Node(_)));
    }

    #[test]
    fn test_role_must_match_kind() {
        let yaml = r#"
kind: nodes
columns:
  - role: start_id
"#;
        let err = ImportConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("START_ID"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let yaml = r#"
kind: relationships
columns:
  - role: start_id
    type: uuid
"#;
        let err = ImportConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Unknown column type 'uuid'"));
    }

    #[test]
    fn test_delimiter_checks() {
        let yaml = r#"
kind: nodes
delimiter: "\""
columns:
  - name: a
"#;
        assert!(ImportConfig::from_yaml_str(yaml).is_err());
        assert!(ImportConfig::from_yaml_str("kind: nodes\ncolumns: []\n").is_err());
        assert!(matches!(
            ImportConfig::from_yaml_str("kind: [").unwrap_err(),
            ConfigError::Yaml(_)
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = ImportConfig::load_from_file("/nonexistent/import.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
