//! Rendering of pipeline results into the single JSON array printed on stdout.

use std::io::{self, Write};
use std::str::FromStr;

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, Serializer};

use crate::error::AppError;
use crate::types::ScoredListing;

/// How non-ASCII text is written to the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// Raw UTF-8.
    #[default]
    Utf8,
    /// Every non-ASCII character escaped as `\uXXXX`; the output is pure ASCII.
    AsciiEscaped,
}

impl FromStr for OutputEncoding {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(OutputEncoding::Utf8),
            "ascii" => Ok(OutputEncoding::AsciiEscaped),
            other => Err(AppError::Config(format!(
                "OUTPUT_ENCODING must be 'utf8' or 'ascii', got '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

/// One element of the printed array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Deal {
        #[serde(flatten)]
        listing: ScoredListing,
        #[serde(skip_serializing_if = "Option::is_none")]
        db_status: Option<String>,
    },
    Error(ErrorRecord),
}

impl OutputRecord {
    pub fn deal(listing: ScoredListing) -> Self {
        OutputRecord::Deal {
            listing,
            db_status: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        OutputRecord::Error(ErrorRecord::new(message))
    }
}

/// Listing-shaped stand-in returned when a batch cannot be scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub name: &'static str,
    pub price: i64,
    /// Carries the error message.
    pub grade: String,
    pub z_score: i64,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "Error",
            price: 0,
            grade: message.into(),
            z_score: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Serializes `records` as one JSON array followed by a newline.
pub fn render_payload(records: &[OutputRecord], encoding: OutputEncoding) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    match encoding {
        OutputEncoding::Utf8 => {
            let mut ser = Serializer::with_formatter(&mut buf, CompactFormatter);
            records.serialize(&mut ser).map_err(io::Error::from)?;
        }
        OutputEncoding::AsciiEscaped => {
            let mut ser = Serializer::with_formatter(&mut buf, AsciiFormatter);
            records.serialize(&mut ser).map_err(io::Error::from)?;
        }
    }
    buf.push(b'\n');
    Ok(buf)
}

/// Renders the payload in full before touching `writer`, so a serialization
/// failure never leaves half an array on the stream.
pub fn write_payload<W: Write>(
    writer: &mut W,
    records: &[OutputRecord],
    encoding: OutputEncoding,
) -> io::Result<()> {
    let payload = render_payload(records, encoding)?;
    writer.write_all(&payload)?;
    writer.flush()
}

/// Compact formatter that escapes non-ASCII string content as UTF-16 `\u` units.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}
