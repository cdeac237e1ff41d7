//! Workbook source buffering.
//! The whole file is held in memory so that every loader backend can re-read
//! the same bytes during sequential fallback, and so the content hash used by
//! the downstream persistence layer is computed exactly once.

use std::fs;
use std::io::Cursor;
use std::path::Path;

/// An in-memory workbook source with a human-readable origin label.
pub struct SourceBuffer {
    origin: String,
    bytes: Vec<u8>,
}

impl SourceBuffer {
    /// Reads a workbook file from a local path into memory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<SourceBuffer, std::io::Error> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Ok(SourceBuffer {
            origin: path.display().to_string(),
            bytes,
        })
    }

    /// Wraps an already-fetched byte buffer, e.g. a downloaded workbook.
    pub fn from_bytes(bytes: Vec<u8>, origin: &str) -> SourceBuffer {
        SourceBuffer {
            origin: origin.to_owned(),
            bytes,
        }
    }

    /// Label identifying where the bytes came from (path or caller-supplied).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// A fresh seekable cursor over the buffered bytes.
    pub fn cursor(&self) -> Cursor<&[u8]> {
        Cursor::new(&self.bytes)
    }

    /// Stable content hash of the whole file, hex-encoded.
    /// The persistence layer deduplicates re-parses by this value.
    pub fn content_hash(&self) -> String {
        format!("{:016x}", fxhash::hash64(&self.bytes))
    }
}
