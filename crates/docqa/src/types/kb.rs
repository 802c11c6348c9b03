//! Knowledge-base domain types

use serde::{Deserialize, Serialize};

/// One retrievable unit of corpus text with its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct KbChunk {
    /// Chunk text
    pub text: String,
    /// Base name of the file the chunk came from
    pub source: String,
    /// Embedding vector, dimension opaque
    pub embedding: Vec<f32>,
}

/// Lightweight identity of a corpus file.
///
/// Equality of a corpus against a snapshot is judged on name and size only;
/// `mtime_ms` is recorded for diagnostics but ignored, so a redeploy that
/// rewrites timestamps does not invalidate the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFingerprint {
    /// Base file name
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Modification time in milliseconds since the epoch
    pub mtime_ms: f64,
}

impl SourceFingerprint {
    /// Same source file by name and size, mtime excluded
    pub fn matches(&self, other: &SourceFingerprint) -> bool {
        self.name == other.name && self.size == other.size
    }
}
