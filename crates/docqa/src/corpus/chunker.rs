//! Fixed-window text chunking
//!
//! Splits text into overlapping character windows. Window boundaries ignore
//! sentence structure entirely; the overlap is what preserves continuity
//! across a boundary.

use crate::error::{Error, Result};

/// Overlapping fixed-window chunker
#[derive(Debug, Clone)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker. `overlap` must be strictly smaller than `size`,
    /// otherwise the window could never advance.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if overlap >= size {
            return Err(Error::config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    /// Window size in characters
    pub fn size(&self) -> usize {
        self.size
    }

    /// Overlap between consecutive windows in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into windows of up to `size` characters, each starting
    /// `size - overlap` characters after the previous one. The final window
    /// may be shorter; iteration stops once a window reaches the end of the
    /// text. Empty text yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += self.size - self.overlap;
        }

        chunks
    }
}
