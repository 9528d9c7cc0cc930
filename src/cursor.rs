//! Field cursor over delimited text.
//!
//! [`CharSeeker`] is the seam the deserializer reads through: it finds the
//! next delimiter-bounded token, reports whether that token ended the record,
//! and decodes the token with a column's [`Extractor`].
//! [`BufferedCharSeeker`] implements it over any [`Read`] source.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use csv_core::{ReadFieldResult, Reader, ReaderBuilder};

use crate::entity::Value;
use crate::extraction::{ExtractError, Extractor};

pub const DEFAULT_QUOTE: u8 = b'"';
pub const DEFAULT_DELIMITER: u8 = b',';

const INITIAL_TOKEN_CAPACITY: usize = 1024;

/// Position and shape of the most recently sought token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mark {
    start: u64,
    end: u64,
    quoted: bool,
    end_of_line: bool,
}

impl Mark {
    pub fn set(&mut self, start: u64, end: u64, quoted: bool, end_of_line: bool) {
        self.start = start;
        self.end = end;
        self.quoted = quoted;
        self.end_of_line = end_of_line;
    }

    /// Whether the token was the last one of its record
    pub fn is_end_of_line(&self) -> bool {
        self.end_of_line
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    pub fn start_position(&self) -> u64 {
        self.start
    }

    pub fn end_position(&self) -> u64 {
        self.end
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mark[from:{},to:{},quoted:{}]",
            self.start, self.end, self.quoted
        )
    }
}

/// Delimiter-aware token cursor.
///
/// Implementations are used by exactly one deserializer at a time.
pub trait CharSeeker {
    /// Seek the next token and describe it in `mark`.
    ///
    /// # Returns
    /// * `Ok(true)` - a token was found (possibly empty)
    /// * `Ok(false)` - no more tokens in the source
    fn seek(&mut self, mark: &mut Mark, delimiter: u8) -> io::Result<bool>;

    /// Decode the token described by `mark`.
    ///
    /// An empty token yields `Ok(None)`.
    fn try_extract(&self, mark: &Mark, extractor: &Extractor)
        -> Result<Option<Value>, ExtractError>;

    /// Number of bytes consumed from the source so far
    fn position(&self) -> u64;

    /// Release the underlying source
    fn close(&mut self) -> io::Result<()>;

    /// Human-readable description of the source, e.g. a file path
    fn source_description(&self) -> String;
}

/// Streaming [`CharSeeker`] over a byte source, tokenized by `csv-core`.
///
/// Records end at `\n`, `\r` or `\r\n`. Fields starting with the quote byte
/// may contain delimiters, line breaks and doubled quotes. Blank lines between
/// records are skipped.
pub struct BufferedCharSeeker<R> {
    reader: Option<BufReader<R>>,
    core: Reader,
    description: String,
    delimiter: u8,
    quote: u8,
    position: u64,
    line_start: bool,
    token: Vec<u8>,
    token_len: usize,
}

impl BufferedCharSeeker<File> {
    /// Open a file; the path becomes the source description
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::new(file, path.display().to_string()))
    }
}

impl<R: Read> BufferedCharSeeker<R> {
    pub fn new(reader: R, description: impl Into<String>) -> Self {
        Self {
            reader: Some(BufReader::new(reader)),
            core: tokenizer(DEFAULT_DELIMITER, DEFAULT_QUOTE),
            description: description.into(),
            delimiter: DEFAULT_DELIMITER,
            quote: DEFAULT_QUOTE,
            position: 0,
            line_start: true,
            token: vec![0; INITIAL_TOKEN_CAPACITY],
            token_len: 0,
        }
    }

    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self.core = tokenizer(self.delimiter, quote);
        self
    }

    /// Delimiter used before the first `seek`, e.g. by [`skip_line`](Self::skip_line)
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self.core = tokenizer(delimiter, self.quote);
        self
    }

    /// Consume one whole record, e.g. a header line
    pub fn skip_line(&mut self) -> io::Result<()> {
        let mut mark = Mark::default();
        while self.seek(&mut mark, self.delimiter)? {
            if mark.is_end_of_line() {
                break;
            }
        }
        Ok(())
    }
}

fn tokenizer(delimiter: u8, quote: u8) -> Reader {
    ReaderBuilder::new().delimiter(delimiter).quote(quote).build()
}

/// First byte of the next field, skipping line breaks when a record starts
fn first_field_byte(input: &[u8], line_start: bool) -> Option<u8> {
    input
        .iter()
        .copied()
        .find(|&b| !(line_start && matches!(b, b'\n' | b'\r')))
}

impl<R: Read> CharSeeker for BufferedCharSeeker<R> {
    fn seek(&mut self, mark: &mut Mark, delimiter: u8) -> io::Result<bool> {
        if delimiter != self.delimiter {
            // Tokenizer state restarts; callers switch only between records
            self.delimiter = delimiter;
            self.core = tokenizer(delimiter, self.quote);
        }

        let reader = self.reader.as_mut().ok_or_else(closed)?;
        let start = self.position;
        let mut quoted = None;
        self.token_len = 0;

        loop {
            let input = reader.fill_buf()?;
            let at_eof = input.is_empty();
            if quoted.is_none() {
                quoted = first_field_byte(input, self.line_start).map(|b| b == self.quote);
            }

            let (result, nin, nout) = self
                .core
                .read_field(input, &mut self.token[self.token_len..]);
            reader.consume(nin);
            self.position += nin as u64;
            self.token_len += nout;

            match result {
                ReadFieldResult::InputEmpty if !at_eof => {}
                ReadFieldResult::OutputFull => {
                    let grown = (self.token.len() * 2).max(INITIAL_TOKEN_CAPACITY);
                    self.token.resize(grown, 0);
                }
                ReadFieldResult::Field { record_end } => {
                    mark.set(start, self.position, quoted.unwrap_or(false), record_end);
                    self.line_start = record_end;
                    return Ok(true);
                }
                ReadFieldResult::InputEmpty | ReadFieldResult::End => {
                    self.token_len = 0;
                    mark.set(start, self.position, false, true);
                    self.line_start = true;
                    return Ok(false);
                }
            }
        }
    }

    fn try_extract(
        &self,
        mark: &Mark,
        extractor: &Extractor,
    ) -> Result<Option<Value>, ExtractError> {
        let raw = &self.token[..self.token_len];
        let text = std::str::from_utf8(raw).map_err(|e| ExtractError {
            text: String::from_utf8_lossy(raw).into_owned(),
            target: extractor.name(),
            reason: e.to_string(),
        })?;
        extractor.extract(text, mark.is_quoted())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping the reader releases the source
        self.reader.take();
        self.token = Vec::new();
        self.token_len = 0;
        Ok(())
    }

    fn source_description(&self) -> String {
        self.description.clone()
    }
}

impl<R> fmt::Display for BufferedCharSeeker<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "cursor is closed")
}
