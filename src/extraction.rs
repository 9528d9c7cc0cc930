//! Typed value extraction for delimited fields.
//!
//! Every header column is bound to an [`Extractor`] that turns the raw text of
//! a field into a [`Value`]. Extraction distinguishes an empty field (no value)
//! from a malformed one (an [`ExtractError`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Value;

/// Default separator between elements of an array field
pub const DEFAULT_ARRAY_DELIMITER: char = ';';

/// Error produced when a field's text cannot be read as its declared type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse '{text}' as {target}: {reason}")]
pub struct ExtractError {
    /// The raw field text
    pub text: String,
    /// Name of the type the field was declared as
    pub target: &'static str,
    /// Why the conversion failed
    pub reason: String,
}

impl ExtractError {
    fn new(text: &str, target: &'static str, reason: impl fmt::Display) -> Self {
        Self {
            text: text.to_string(),
            target,
            reason: reason.to_string(),
        }
    }
}

/// Element type of an array column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    String,
    Long,
    Int,
    Double,
    Float,
    Boolean,
}

impl ElementType {
    fn scalar(self) -> Extractor {
        match self {
            ElementType::String => Extractor::String,
            ElementType::Long => Extractor::Long,
            ElementType::Int => Extractor::Int,
            ElementType::Double => Extractor::Double,
            ElementType::Float => Extractor::Float,
            ElementType::Boolean => Extractor::Boolean,
        }
    }
}

/// Decoder bound to a header column
///
/// # Example
///
/// ```
/// use csvgraph::{Extractor, Value};
///
/// let value = Extractor::Long.extract("42", false).unwrap();
/// assert_eq!(value, Some(Value::Long(42)));
///
/// // Empty fields carry no value
/// assert_eq!(Extractor::Long.extract("", false).unwrap(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extractor {
    String,
    Long,
    Int,
    Double,
    Float,
    Boolean,
    Char,
    Array { element: ElementType, delimiter: char },
}

impl Extractor {
    /// Array extractor using the default `;` element separator
    pub fn array(element: ElementType) -> Self {
        Extractor::Array {
            element,
            delimiter: DEFAULT_ARRAY_DELIMITER,
        }
    }

    /// Type name used in header descriptions and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Extractor::String => "string",
            Extractor::Long => "long",
            Extractor::Int => "int",
            Extractor::Double => "double",
            Extractor::Float => "float",
            Extractor::Boolean => "boolean",
            Extractor::Char => "char",
            Extractor::Array { element, .. } => match element {
                ElementType::String => "string[]",
                ElementType::Long => "long[]",
                ElementType::Int => "int[]",
                ElementType::Double => "double[]",
                ElementType::Float => "float[]",
                ElementType::Boolean => "boolean[]",
            },
        }
    }

    /// Extract a value from raw field text.
    ///
    /// `quoted` tells whether the field was enclosed in quotes; a quoted empty
    /// field is an empty string for string columns and no value otherwise.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(value))` - field decoded
    /// * `Ok(None)` - field was empty
    /// * `Err(ExtractError)` - field text does not match the declared type
    pub fn extract(&self, text: &str, quoted: bool) -> Result<Option<Value>, ExtractError> {
        if text.is_empty() {
            return Ok(match self {
                Extractor::String if quoted => Some(Value::String(String::new())),
                _ => None,
            });
        }

        match self {
            Extractor::String => Ok(Some(Value::String(text.to_string()))),
            Extractor::Long => parse_number::<i64>(text, "long").map(|v| Some(Value::Long(v))),
            Extractor::Int => {
                parse_number::<i32>(text, "int").map(|v| Some(Value::Long(i64::from(v))))
            }
            Extractor::Double => {
                parse_number::<f64>(text, "double").map(|v| Some(Value::Double(v)))
            }
            Extractor::Float => {
                parse_number::<f32>(text, "float").map(|v| Some(Value::Double(f64::from(v))))
            }
            Extractor::Boolean => Ok(Some(Value::Boolean(
                text.trim().eq_ignore_ascii_case("true"),
            ))),
            Extractor::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Some(Value::Char(c))),
                    _ => Err(ExtractError::new(text, "char", "expected a single character")),
                }
            }
            Extractor::Array { element, delimiter } => {
                let scalar = element.scalar();
                let mut values = Vec::new();
                for part in text.split(*delimiter) {
                    if let Some(value) = scalar.extract(part, false)? {
                        values.push(value);
                    }
                }
                Ok(Some(Value::Array(values)))
            }
        }
    }
}

fn parse_number<T>(text: &str, target: &'static str) -> Result<T, ExtractError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| ExtractError::new(text, target, e))
}

impl fmt::Display for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Extractor {
    type Err = String;

    /// Parse a type name such as `long` or `string[]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Some(element) = name.strip_suffix("[]") {
            let element = match element {
                "string" => ElementType::String,
                "long" => ElementType::Long,
                "int" => ElementType::Int,
                "double" => ElementType::Double,
                "float" => ElementType::Float,
                "boolean" => ElementType::Boolean,
                other => return Err(format!("Unknown array element type '{}'", other)),
            };
            return Ok(Extractor::array(element));
        }

        match name.as_str() {
            "string" => Ok(Extractor::String),
            "long" => Ok(Extractor::Long),
            "int" => Ok(Extractor::Int),
            "double" => Ok(Extractor::Double),
            "float" => Ok(Extractor::Float),
            "boolean" => Ok(Extractor::Boolean),
            "char" => Ok(Extractor::Char),
            other => Err(format!("Unknown column type '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_scalars() {
        assert_eq!(
            Extractor::String.extract("Alice", false).unwrap(),
            Some(Value::String("Alice".to_string()))
        );
        assert_eq!(Extractor::Long.extract(" 17 ", false).unwrap(), Some(Value::Long(17)));
        assert_eq!(Extractor::Int.extract("-3", false).unwrap(), Some(Value::Long(-3)));
        assert_eq!(Extractor::Double.extract("2.5", false).unwrap(), Some(Value::Double(2.5)));
        assert_eq!(Extractor::Boolean.extract("TRUE", false).unwrap(), Some(Value::Boolean(true)));
        assert_eq!(Extractor::Boolean.extract("no", false).unwrap(), Some(Value::Boolean(false)));
        assert_eq!(Extractor::Char.extract("x", false).unwrap(), Some(Value::Char('x')));
    }

    #[test]
    fn test_empty_field_has_no_value() {
        assert_eq!(Extractor::Long.extract("", false).unwrap(), None);
        assert_eq!(Extractor::String.extract("", false).unwrap(), None);
        assert_eq!(
            Extractor::String.extract("", true).unwrap(),
            Some(Value::String(String::new()))
        );
        assert_eq!(Extractor::Long.extract("", true).unwrap(), None);
    }

    #[test]
    fn test_malformed_number() {
        let err = Extractor::Long.extract("abc", false).unwrap_err();
        assert_eq!(err.text, "abc");
        assert_eq!(err.target, "long");
        assert!(err.to_string().starts_with("cannot parse 'abc' as long"));
    }

    #[test]
    fn test_int_out_of_range() {
        assert!(Extractor::Int.extract("4294967296", false).is_err());
    }

    #[test]
    fn test_extract_array() {
        let value = Extractor::array(ElementType::Long).extract("1;2;;3", false).unwrap();
        assert_eq!(
            value,
            Some(Value::Array(vec![Value::Long(1), Value::Long(2), Value::Long(3)]))
        );

        let labels = Extractor::Array {
            element: ElementType::String,
            delimiter: '|',
        }
        .extract("Person|Actor", false)
        .unwrap();
        assert_eq!(
            labels,
            Some(Value::Array(vec![
                Value::String("Person".to_string()),
                Value::String("Actor".to_string()),
            ]))
        );
    }

    #[test]
    fn test_parse_type_names() {
        assert_eq!("long".parse::<Extractor>().unwrap(), Extractor::Long);
        assert_eq!("String".parse::<Extractor>().unwrap(), Extractor::String);
        assert_eq!(
            "int[]".parse::<Extractor>().unwrap(),
            Extractor::array(ElementType::Int)
        );
        assert!("decimal".parse::<Extractor>().is_err());
        assert_eq!(Extractor::array(ElementType::String).to_string(), "string[]");
    }
}
