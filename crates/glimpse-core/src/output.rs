//! JSON and JSON Lines output.
//!
//! JSON Lines output is streamed: each record is written as soon as it is
//! produced. JSON output is collected and written as one document by
//! [`OutputWriter::finish`], a bare object for a single record and an array
//! otherwise.

use serde::Serialize;
use std::io::{self, Write};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Writes serializable records in the configured format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<serde_json::Value>,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects JSON output; JSON Lines is always one object per line.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            items_written: 0,
        }
    }

    /// Emit (JSON Lines) or queue (JSON) one record.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let value = serde_json::to_value(item).map_err(io::Error::other)?;
                self.pending.push(value);
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
        }
        self.items_written += 1;
        Ok(())
    }

    /// Get the number of records accepted so far.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Write any queued JSON document and flush.
    ///
    /// A JSON run with no records produces an empty array.
    pub fn finish(mut self) -> io::Result<W> {
        if self.format == OutputFormat::Json {
            let pending = std::mem::take(&mut self.pending);
            let document = match pending.len() {
                1 => pending.into_iter().next().unwrap_or_default(),
                _ => serde_json::Value::Array(pending),
            };
            if self.pretty {
                serde_json::to_writer_pretty(&mut self.writer, &document)
                    .map_err(io::Error::other)?;
            } else {
                serde_json::to_writer(&mut self.writer, &document).map_err(io::Error::other)?;
            }
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}
