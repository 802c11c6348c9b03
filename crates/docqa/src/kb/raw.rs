//! Raw full-text snapshot
//!
//! The offline precompute can bake every corpus file, bytes and extracted
//! text together, into one snapshot. When present it takes priority over
//! embedding retrieval: the whole corpus is packed into the context instead
//! of a ranked selection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::ContextPiece;
use crate::types::SourceFingerprint;

/// Version written into new raw snapshots
pub const RAW_SNAPSHOT_VERSION: u32 = 1;

/// Wire form of the raw snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSnapshot {
    #[serde(default)]
    pub version: u32,
    /// Fingerprints of the corpus files the snapshot was built from
    #[serde(rename = "sourceFiles", default)]
    pub source_files: Vec<SourceFingerprint>,
    /// One entry per corpus file
    pub files: Vec<RawFile>,
}

/// One corpus file in the raw snapshot. Individual fields are lenient on
/// load; only `files` itself is required to be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFile {
    /// Base file name
    #[serde(default)]
    pub name: String,
    /// File kind, the extension without its dot
    #[serde(rename = "type", default)]
    pub file_type: String,
    /// Size of the original bytes
    #[serde(default)]
    pub size: u64,
    /// Hex SHA-256 of the original bytes
    #[serde(default)]
    pub sha256: String,
    /// Base64 of the original bytes
    #[serde(default)]
    pub bytes_b64: String,
    /// Extracted text
    #[serde(default)]
    pub text: String,
    /// Page count for paginated formats, when known
    #[serde(
        rename = "numPages",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub num_pages: Option<u32>,
}

/// Name and extracted text of one raw-snapshot file, the runtime view
#[derive(Debug, Clone, PartialEq)]
pub struct RawDoc {
    pub name: String,
    pub text: String,
}

impl RawSnapshot {
    /// Load a raw snapshot. Any read or parse failure means there is no
    /// raw snapshot, never an error.
    pub fn load(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<RawSnapshot>(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %path.display(), "malformed raw snapshot ignored: {}", e);
                None
            }
        }
    }

    /// Runtime view of the snapshot, heavy byte payloads dropped
    pub fn docs(self) -> Vec<RawDoc> {
        self.files
            .into_iter()
            .map(|file| RawDoc {
                name: file.name,
                text: file.text,
            })
            .collect()
    }

    /// Persist the snapshot. A write failure is a warning, not an error.
    pub fn save(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        match serde_json::to_string(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!(path = %path.display(), "failed to persist raw snapshot: {}", e);
                } else {
                    tracing::info!(
                        path = %path.display(),
                        files = self.files.len(),
                        "raw snapshot persisted"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to serialize raw snapshot: {}", e);
            }
        }
    }
}

/// Context pieces for the raw docs, in corpus order. Files with empty text
/// contribute nothing; a file with no recorded name is attributed to
/// "unknown".
pub fn raw_context_pieces(docs: &[RawDoc]) -> Vec<ContextPiece> {
    docs.iter()
        .filter(|doc| !doc.text.is_empty())
        .map(|doc| ContextPiece {
            source: if doc.name.is_empty() {
                "unknown".to_string()
            } else {
                doc.name.clone()
            },
            text: doc.text.clone(),
        })
        .collect()
}
