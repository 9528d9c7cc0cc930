//! # csvgraph: delimited records to graph entities
//!
//! csvgraph reads delimited text (CSV, TSV, ...) and turns every record into a
//! graph node or relationship ready for bulk import.
//!
//! ## Features
//!
//! - **Header catalog**: each column has a role (property, ignored, id,
//!   label, start/end id, type) and a typed extractor
//! - **Streaming deserializer**: one record per call, reused scratch storage,
//!   rich diagnostics naming source, field, header and raw value on failure
//! - **Decorators**: fill in labels, relationship types or generated ids
//! - **YAML configuration** and a CLI writing NDJSON
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use csvgraph::{
//!     decorator::default_relationship_type, BufferedCharSeeker, Entry, Extractor,
//!     Header, InputEntityDeserializer, Role,
//! };
//!
//! let header = Arc::new(Header::new(vec![
//!     Entry::unnamed(Role::StartId, Extractor::Long),
//!     Entry::unnamed(Role::EndId, Extractor::Long),
//!     Entry::property("since", Extractor::Int),
//! ]));
//! let data = BufferedCharSeeker::new("1,2,2019\n".as_bytes(), "knows.csv");
//! let mut rels = InputEntityDeserializer::relationships(
//!     header,
//!     data,
//!     b',',
//!     default_relationship_type("KNOWS"),
//! );
//!
//! let knows = rels.next_entity().unwrap().unwrap().into_relationship().unwrap();
//! assert_eq!(knows.rel_type.as_deref(), Some("KNOWS"));
//! ```

pub mod builder;
pub mod config;
pub mod cursor;
pub mod decorator;
pub mod deserializer;
pub mod entity;
pub mod error;
pub mod extraction;
pub mod header;
pub mod serialization;

// Re-export key types
pub use builder::{EntityBuilder, NodeBuilder, PropertyBuffer, RelationshipBuilder};
pub use config::{ConfigError, EntityKind, ImportConfig};
pub use cursor::{BufferedCharSeeker, CharSeeker, Mark};
pub use decorator::Decorator;
pub use deserializer::InputEntityDeserializer;
pub use entity::{Entity, InputEntity, InputNode, InputRelationship, Properties, Value};
pub use error::{ErrorContext, ErrorKind, InputError, InputResult};
pub use extraction::{ElementType, ExtractError, Extractor};
pub use header::{Entry, Header, Role};
pub use serialization::{JsonArrayWriter, NdjsonWriter, SerializationError};
