//! Error types for record deserialization.
//!
//! Per-record failures carry an [`ErrorContext`] describing where in the
//! input they happened. Wrapping keeps the kind of the original failure
//! reachable through [`InputError::kind`].

use std::error::Error as StdError;
use std::fmt;
use std::io;

use thiserror::Error;

use crate::extraction::ExtractError;

/// Placeholder used when the raw text of a failing field cannot be recovered
pub const UNKNOWN_RAW_VALUE: &str = "??";

/// Result alias for deserialization operations.
pub type InputResult<T> = Result<T, InputError>;

/// Discriminant of an [`InputError`], looking through context wrappers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnexpectedEndOfInput,
    Data,
    Extract,
    Read,
    Close,
    Ingestion,
}

/// Diagnostic parts describing the field a record failed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Data source description
    pub source: String,
    /// Failing field as `<name-or-index>:<1-based ordinal>`
    pub field: String,
    /// Full header description
    pub header: String,
    /// Raw field text, or [`UNKNOWN_RAW_VALUE`]
    pub raw_value: String,
    /// Message of the original failure
    pub original_error: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ERROR in input\n  data source: {}\n  in field: {}\n  for header: {}\n  raw field value: {}\n  original error: {}",
            self.source, self.field, self.header, self.raw_value, self.original_error
        )
    }
}

/// Errors raised while reading entities from delimited input
#[derive(Debug, Error)]
pub enum InputError {
    /// The record ended before every header column was read
    #[error("unexpected end of input near {near}")]
    UnexpectedEndOfInput { near: String },

    /// The assembled entity was rejected by validation
    #[error("{0}")]
    Data(String),

    /// A field could not be read as its declared type
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The underlying source failed
    #[error("unable to read more data from input stream")]
    Read(#[source] io::Error),

    /// Releasing the underlying source failed
    #[error("unable to close data iterator")]
    Close(#[source] io::Error),

    /// A non-input failure wrapped with record context
    #[error("{context}")]
    Ingestion {
        context: Box<ErrorContext>,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// An input failure with record context, keeping the original kind
    #[error("{context}")]
    WithContext {
        context: Box<ErrorContext>,
        #[source]
        source: Box<InputError>,
    },
}

impl InputError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InputError::UnexpectedEndOfInput { .. } => ErrorKind::UnexpectedEndOfInput,
            InputError::Data(_) => ErrorKind::Data,
            InputError::Extract(_) => ErrorKind::Extract,
            InputError::Read(_) => ErrorKind::Read,
            InputError::Close(_) => ErrorKind::Close,
            InputError::Ingestion { .. } => ErrorKind::Ingestion,
            InputError::WithContext { source, .. } => source.kind(),
        }
    }

    /// Diagnostic context, if the error was raised while processing a record
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            InputError::Ingestion { context, .. } | InputError::WithContext { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Whether this error is one of the crate's own input failures
    fn is_input_error(&self) -> bool {
        matches!(
            self,
            InputError::UnexpectedEndOfInput { .. }
                | InputError::Data(_)
                | InputError::WithContext { .. }
        )
    }

    /// Attach record context.
    ///
    /// Input failures keep their kind; anything else becomes
    /// [`InputError::Ingestion`] with the original as its source. Source
    /// failures stay as they are.
    pub(crate) fn with_context(self, context: ErrorContext) -> InputError {
        if matches!(self, InputError::Read(_) | InputError::Close(_)) {
            return self;
        }
        let context = Box::new(context);
        if self.is_input_error() {
            return InputError::WithContext {
                context,
                source: Box::new(self),
            };
        }
        let source: Box<dyn StdError + Send + Sync> = match self {
            InputError::Extract(e) => Box::new(e),
            other => Box::new(other),
        };
        InputError::Ingestion { context, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(original: &str) -> ErrorContext {
        ErrorContext {
            source: "people.csv".to_string(),
            field: "age:2".to_string(),
            header: "[name:PROPERTY(string), age:PROPERTY(long)]".to_string(),
            raw_value: "abc".to_string(),
            original_error: original.to_string(),
        }
    }

    #[test]
    fn test_context_display() {
        let rendered = context("boom").to_string();
        assert!(rendered.starts_with("ERROR in input"));
        assert!(rendered.contains("\n  data source: people.csv"));
        assert!(rendered.contains("\n  in field: age:2"));
        assert!(rendered.contains("\n  raw field value: abc"));
        assert!(rendered.ends_with("original error: boom"));
    }

    #[test]
    fn test_input_error_keeps_kind() {
        let err = InputError::Data("No start id specified".to_string());
        let wrapped = err.with_context(context("No start id specified"));
        assert_eq!(wrapped.kind(), ErrorKind::Data);
        assert!(matches!(wrapped, InputError::WithContext { .. }));
        assert!(wrapped.to_string().contains("in field: age:2"));

        let source = wrapped.source().unwrap();
        assert_eq!(source.to_string(), "No start id specified");
    }

    #[test]
    fn test_other_errors_become_ingestion() {
        let err = InputError::Extract(ExtractError {
            text: "abc".to_string(),
            target: "long",
            reason: "invalid digit found in string".to_string(),
        });
        let wrapped = err.with_context(context("cannot parse"));
        assert_eq!(wrapped.kind(), ErrorKind::Ingestion);
        assert!(wrapped.context().is_some());
        assert!(wrapped
            .source()
            .unwrap()
            .downcast_ref::<ExtractError>()
            .is_some());
    }

    #[test]
    fn test_read_errors_are_not_wrapped() {
        let err = InputError::Read(io::Error::new(io::ErrorKind::Other, "disk gone"));
        let wrapped = err.with_context(context("disk gone"));
        assert_eq!(wrapped.kind(), ErrorKind::Read);
        assert!(wrapped.context().is_none());
    }
}
