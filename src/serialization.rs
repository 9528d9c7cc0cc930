//! Writers for imported entities.

use std::io::Write;

use thiserror::Error;

use crate::entity::Entity;

/// Error type for serialization operations
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// NDJSON (Newline Delimited JSON) writer
///
/// Writes entities as NDJSON, one JSON object per line.
pub struct NdjsonWriter<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Write a single entity as an NDJSON line
    pub fn write<T: Entity>(&mut self, entity: &T) -> Result<(), SerializationError> {
        let line = entity.to_ndjson_line()?;
        self.writer.write_all(line.as_bytes())?;
        self.written += 1;
        Ok(())
    }

    /// Number of entities written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON array writer
///
/// Writes entities as a JSON array.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a new JSON array writer and write the opening bracket
    pub fn new(mut writer: W) -> Result<Self, SerializationError> {
        write!(writer, "[")?;
        Ok(Self { writer, written: 0 })
    }

    /// Write a single entity to the JSON array
    pub fn write<T: Entity>(&mut self, entity: &T) -> Result<(), SerializationError> {
        if self.written > 0 {
            write!(self.writer, ",")?;
        }
        write!(self.writer, "{}", entity.to_json()?)?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Finish writing the array and close the bracket
    pub fn finish(mut self) -> Result<(), SerializationError> {
        write!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(())
    }
}
