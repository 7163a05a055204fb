//! Minimal CSV writing for the export file.
//!
//! Quoting follows the common "minimal" dialect: a field is wrapped in
//! double quotes only when it contains a comma, a quote, CR or LF, and
//! embedded quotes are doubled. Rows end with CRLF.

use std::io::{self, Write};

use crate::error::{Error, Result};

/// Escape a value for CSV output.
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render a vector as a bracketed list literal: `[0.5, -0.25, 1.0]`.
///
/// Each number uses the shortest form that reads back to the same `f32`,
/// and whole numbers keep their `.0`.
#[must_use]
pub fn format_vector_literal(vector: &[f32]) -> String {
    let items: Vec<String> = vector.iter().map(|x| format!("{x:?}")).collect();
    format!("[{}]", items.join(", "))
}

/// Parse a list literal written by [`format_vector_literal`].
///
/// # Errors
///
/// Returns `InvalidArgument` if the brackets are missing or an element is
/// not a number.
pub fn parse_vector_literal(s: &str) -> Result<Vec<f32>> {
    let inner = s
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| Error::InvalidArgument(format!("Not a vector literal: {s}")))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|item| {
            let item = item.trim();
            item.parse::<f32>()
                .map_err(|e| Error::InvalidArgument(format!("Bad vector element '{item}': {e}")))
        })
        .collect()
}

/// Streaming CSV row writer.
pub struct CsvWriter<W: Write> {
    inner: W,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_record(&mut self, fields: &[&str]) -> io::Result<()> {
        let line: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        self.inner.write_all(line.join(",").as_bytes())?;
        self.inner.write_all(b"\r\n")
    }

    /// Flush buffered rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Split one CSV line into fields, honoring quotes.
///
/// Only handles single-line records, which is all the export ever writes.
#[must_use]
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);

    fields
}
