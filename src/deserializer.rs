//! Record deserialization engine.
//!
//! [`InputEntityDeserializer`] reads one record per call through a
//! [`CharSeeker`], routes each field by the role its header column declares,
//! and turns the record into an [`InputEntity`].
//!
//! # Record flow
//! 1. Seek a token per header column, extract it with the column's extractor
//! 2. Property values go to a reused scratch buffer, ignored columns are
//!    dropped, everything else goes to the [`EntityBuilder`]
//! 3. Build the entity from a copy of the scratch buffer
//! 4. Drop any extra fields left on the record
//! 5. Decorate, then validate
//!
//! Failures come back with an [`ErrorContext`](crate::error::ErrorContext)
//! naming the source, field, header and raw value. The scratch buffer is
//! reset after every record whatever the outcome.

use std::fmt;
use std::sync::Arc;

use crate::builder::{EntityBuilder, PropertyBuffer};
use crate::cursor::{CharSeeker, Mark};
use crate::decorator::Decorator;
use crate::entity::InputEntity;
use crate::error::{ErrorContext, InputError, InputResult, UNKNOWN_RAW_VALUE};
use crate::extraction::Extractor;
use crate::header::{Header, Role};

/// Pull-based reader of entities from delimited input.
///
/// One instance serves one caller and one input; parallel imports create one
/// deserializer per input partition.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use csvgraph::{
///     decorator::no_decorator, BufferedCharSeeker, Entry, Extractor, Header,
///     InputEntityDeserializer, Role, Value,
/// };
///
/// let header = Arc::new(Header::new(vec![
///     Entry::unnamed(Role::Id, Extractor::Long),
///     Entry::property("name", Extractor::String),
/// ]));
/// let data = BufferedCharSeeker::new("1,Alice\n2,Bob\n".as_bytes(), "people");
/// let mut nodes = InputEntityDeserializer::nodes(header, data, b',', no_decorator());
///
/// let alice = nodes.next_entity().unwrap().unwrap();
/// assert_eq!(alice.property("name"), Some(&Value::from("Alice")));
/// assert_eq!(nodes.count(), 1);
/// ```
pub struct InputEntityDeserializer<S> {
    header: Arc<Header>,
    data: S,
    mark: Mark,
    delimiter: u8,
    builder: EntityBuilder,
    decorator: Box<dyn Decorator>,
    properties: PropertyBuffer,
}

impl<S: CharSeeker> InputEntityDeserializer<S> {
    pub fn new(
        header: Arc<Header>,
        data: S,
        delimiter: u8,
        builder: EntityBuilder,
        decorator: impl Decorator + 'static,
    ) -> Self {
        Self {
            header,
            data,
            mark: Mark::default(),
            delimiter,
            builder,
            decorator: Box::new(decorator),
            properties: PropertyBuffer::new(),
        }
    }

    /// Deserializer producing nodes
    pub fn nodes(
        header: Arc<Header>,
        data: S,
        delimiter: u8,
        decorator: impl Decorator + 'static,
    ) -> Self {
        Self::new(header, data, delimiter, EntityBuilder::nodes(), decorator)
    }

    /// Deserializer producing relationships
    pub fn relationships(
        header: Arc<Header>,
        data: S,
        delimiter: u8,
        decorator: impl Decorator + 'static,
    ) -> Self {
        Self::new(header, data, delimiter, EntityBuilder::relationships(), decorator)
    }

    /// Read the next entity.
    ///
    /// # Returns
    /// * `Ok(Some(entity))` - next record converted
    /// * `Ok(None)` - no more records; repeated calls keep returning it
    /// * `Err(InputError)` - the record could not be read or converted
    pub fn next_entity(&mut self) -> InputResult<Option<InputEntity>> {
        let mut field_index = 0;
        let result = self.read_entity(&mut field_index);

        self.properties.reset();
        self.builder.reset();

        result.map_err(|error| {
            let fatal = matches!(error, InputError::Read(_));
            let error = self.contextualize(error, field_index);
            if !fatal {
                // A read failure here resurfaces on the next call
                let _ = self.skip_rest_of_record();
            }
            error
        })
    }

    /// Discard tokens up to the end of the current record
    fn skip_rest_of_record(&mut self) -> InputResult<()> {
        while !self.mark.is_end_of_line() {
            if !self
                .data
                .seek(&mut self.mark, self.delimiter)
                .map_err(InputError::Read)?
            {
                break;
            }
        }
        Ok(())
    }

    fn read_entity(&mut self, field_index: &mut usize) -> InputResult<Option<InputEntity>> {
        let entries = self.header.entries();
        if entries.is_empty() {
            return Ok(None);
        }

        while *field_index < entries.len() {
            if !self
                .data
                .seek(&mut self.mark, self.delimiter)
                .map_err(InputError::Read)?
            {
                if *field_index > 0 {
                    return Err(InputError::UnexpectedEndOfInput {
                        near: self.mark.to_string(),
                    });
                }
                return Ok(None);
            }

            let entry = &entries[*field_index];
            let value = self.data.try_extract(&self.mark, entry.extractor())?;
            match entry.role() {
                Role::Property => {
                    // Empty fields record no property
                    if let Some(value) = value {
                        match entry.name() {
                            Some(name) => self.properties.push(name, value),
                            None => self.properties.push(&field_index.to_string(), value),
                        }
                    }
                }
                Role::Ignore => {}
                _ => self
                    .builder
                    .handle_value(entry, value, &mut self.properties),
            }

            if self.mark.is_end_of_line() {
                break;
            }
            *field_index += 1;
        }

        // Fields beyond the header are dropped
        self.skip_rest_of_record()?;

        let entity = self.builder.build(
            self.properties.snapshot(),
            self.data.source_description(),
            self.data.position(),
        );

        let entity = self.decorator.apply(entity);
        self.builder.validate(&entity)?;
        Ok(Some(entity))
    }

    fn contextualize(&self, error: InputError, field_index: usize) -> InputError {
        if matches!(error, InputError::Read(_)) {
            return error;
        }

        let entries = self.header.entries();
        let index = field_index.min(entries.len().saturating_sub(1));
        let field = match entries.get(index) {
            Some(entry) => format!("{}:{}", entry.label(index), index + 1),
            None => UNKNOWN_RAW_VALUE.to_string(),
        };
        let raw_value = match self.data.try_extract(&self.mark, &Extractor::String) {
            Ok(Some(value)) => value.to_string(),
            _ => UNKNOWN_RAW_VALUE.to_string(),
        };

        let context = ErrorContext {
            source: self.data.source_description(),
            field,
            header: self.header.to_string(),
            raw_value,
            original_error: error.to_string(),
        };
        error.with_context(context)
    }

    /// Current offset in the source, for progress reporting
    pub fn position(&self) -> u64 {
        self.data.position()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Release the underlying source
    pub fn close(self) -> InputResult<()> {
        let mut data = self.data;
        data.close().map_err(InputError::Close)
    }
}

impl<S: CharSeeker> Iterator for InputEntityDeserializer<S> {
    type Item = InputResult<InputEntity>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entity().transpose()
    }
}

impl<S: CharSeeker> fmt::Display for InputEntityDeserializer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data.source_description())
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl<S: CharSeeker> fmt::Debug for InputEntityDeserializer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputEntityDeserializer")
            .field("source", &self.data.source_description())
            .field("header", &self.header.to_string())
            .field("delimiter", &(self.delimiter as char))
            .field("builder", &self.builder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::BufferedCharSeeker;
    use crate::decorator::no_decorator;
    use crate::entity::Value;
    use crate::header::Entry;

    fn nodes(
        entries: Vec<Entry>,
        data: &'static str,
    ) -> InputEntityDeserializer<BufferedCharSeeker<&'static [u8]>> {
        InputEntityDeserializer::nodes(
            Arc::new(Header::new(entries)),
            BufferedCharSeeker::new(data.as_bytes(), "nodes.csv"),
            b',',
            no_decorator(),
        )
    }

    #[test]
    fn test_properties_in_header_order() {
        let mut deserializer = nodes(
            vec![
                Entry::unnamed(Role::Id, Extractor::Long),
                Entry::property("name", Extractor::String),
                Entry::unnamed(Role::Ignore, Extractor::String),
                Entry::property("age", Extractor::Int),
            ],
            "1,Alice,skip me,30\n",
        );

        let entity = deserializer.next_entity().unwrap().unwrap();
        assert_eq!(
            entity.properties(),
            &[
                ("name".to_string(), Value::from("Alice")),
                ("age".to_string(), Value::Long(30)),
            ]
        );
        assert_eq!(entity.as_node().unwrap().id, Some(Value::Long(1)));
        assert!(deserializer.next_entity().unwrap().is_none());
    }

    #[test]
    fn test_unnamed_property_keyed_by_index() {
        let mut deserializer = nodes(
            vec![
                Entry::property("a", Extractor::String),
                Entry::unnamed(Role::Property, Extractor::String),
            ],
            "x,y\n",
        );
        let entity = deserializer.next_entity().unwrap().unwrap();
        assert_eq!(entity.property("1"), Some(&Value::from("y")));
    }

    #[test]
    fn test_short_record_stops_at_end_of_line() {
        let mut deserializer = nodes(
            vec![
                Entry::property("a", Extractor::String),
                Entry::property("b", Extractor::String),
                Entry::property("c", Extractor::String),
            ],
            "1,2,3\n4\n",
        );
        assert_eq!(deserializer.next_entity().unwrap().unwrap().properties().len(), 3);
        let short = deserializer.next_entity().unwrap().unwrap();
        assert_eq!(short.properties(), &[("a".to_string(), Value::from("4"))]);
    }

    #[test]
    fn test_failed_record_is_skipped_whole() {
        let mut deserializer = nodes(
            vec![
                Entry::property("name", Extractor::String),
                Entry::property("age", Extractor::Long),
                Entry::property("city", Extractor::String),
            ],
            "Alice,old,Oslo\nBob,40,Rome\n",
        );

        let err = deserializer.next_entity().unwrap_err();
        assert_eq!(err.context().unwrap().field, "age:2");

        let bob = deserializer.next_entity().unwrap().unwrap();
        assert_eq!(
            bob.properties(),
            &[
                ("name".to_string(), Value::from("Bob")),
                ("age".to_string(), Value::Long(40)),
                ("city".to_string(), Value::from("Rome")),
            ]
        );
        assert!(deserializer.next_entity().unwrap().is_none());
    }

    #[test]
    fn test_position_includes_dropped_fields() {
        let mut deserializer = nodes(
            vec![Entry::property("a", Extractor::String)],
            "a,x,y,z\nb\n",
        );
        let first = deserializer.next_entity().unwrap().unwrap();
        assert!(first.position() >= 7, "position {}", first.position());
        let second = deserializer.next_entity().unwrap().unwrap();
        assert_eq!(second.property("a"), Some(&Value::from("b")));
        assert!(second.position() > first.position());
    }

    #[test]
    fn test_empty_header_yields_nothing() {
        let mut deserializer = nodes(vec![], "a,b\n");
        assert!(deserializer.next_entity().unwrap().is_none());
    }

    #[test]
    fn test_iterator_and_position() {
        let mut deserializer = nodes(
            vec![Entry::property("name", Extractor::String)],
            "a\nb\nc\n",
        );
        assert_eq!(deserializer.position(), 0);
        let names: Vec<String> = deserializer
            .by_ref()
            .map(|entity| entity.unwrap().property("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(deserializer.position(), 6);
        assert_eq!(deserializer.to_string(), "nodes.csv");
    }
}
