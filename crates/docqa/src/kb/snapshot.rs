//! Embedded knowledge-base snapshot
//!
//! On disk the snapshot stores chunks, embeddings and sources as parallel
//! arrays under camelCase keys. In memory each chunk is one record; the
//! arrays exist only at this serialization boundary.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{KbChunk, SourceFingerprint};

/// Version written into new snapshots. Not checked on load; compatibility
/// is judged by the model and chunk parameters instead.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Wire form of the embedded knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KbSnapshot {
    #[serde(default)]
    pub version: u32,
    /// Embedding model the vectors were produced with
    pub model: String,
    /// Chunk window size the chunks were produced with
    pub chunk_size: usize,
    /// Chunk overlap the chunks were produced with
    pub chunk_overlap: usize,
    /// Fingerprints of the corpus files the snapshot was built from
    #[serde(default)]
    pub source_files: Vec<SourceFingerprint>,
    /// Chunk texts
    pub chunks: Vec<String>,
    /// Embedding vectors, parallel to `chunks`
    pub embeddings: Vec<Vec<f32>>,
    /// Source file names, parallel to `chunks`
    pub sources: Vec<String>,
}

impl KbSnapshot {
    /// Assemble a snapshot from in-memory chunk records
    pub fn from_chunks(
        model: impl Into<String>,
        chunk_size: usize,
        chunk_overlap: usize,
        source_files: Vec<SourceFingerprint>,
        chunks: &[KbChunk],
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            model: model.into(),
            chunk_size,
            chunk_overlap,
            source_files,
            chunks: chunks.iter().map(|c| c.text.clone()).collect(),
            embeddings: chunks.iter().map(|c| c.embedding.clone()).collect(),
            sources: chunks.iter().map(|c| c.source.clone()).collect(),
        }
    }

    /// Rebuild in-memory chunk records. Callers must have checked
    /// `is_valid_for` first; the zip silently stops at the shortest array.
    pub fn into_chunks(self) -> Vec<KbChunk> {
        self.chunks
            .into_iter()
            .zip(self.embeddings)
            .zip(self.sources)
            .map(|((text, embedding), source)| KbChunk {
                text,
                source,
                embedding,
            })
            .collect()
    }

    /// Whether this snapshot can serve the given configuration and corpus.
    ///
    /// The model and chunk parameters must match exactly and the three data
    /// arrays must agree in length. When `current` fingerprints are given
    /// and non-empty, the recorded set must contain exactly the same files
    /// with the same sizes; mtimes are ignored. Pass `None` to skip the
    /// fingerprint check for immutable deployment bundles.
    pub fn is_valid_for(
        &self,
        model: &str,
        chunk_size: usize,
        chunk_overlap: usize,
        current: Option<&[SourceFingerprint]>,
    ) -> bool {
        if self.model != model {
            return false;
        }
        if self.chunk_size != chunk_size || self.chunk_overlap != chunk_overlap {
            return false;
        }
        if self.chunks.len() != self.embeddings.len() || self.chunks.len() != self.sources.len() {
            return false;
        }

        if let Some(current) = current {
            if !current.is_empty() {
                if self.source_files.len() != current.len() {
                    return false;
                }
                for fingerprint in current {
                    let recorded = self
                        .source_files
                        .iter()
                        .find(|recorded| recorded.name == fingerprint.name);
                    match recorded {
                        Some(recorded) if recorded.size == fingerprint.size => {}
                        _ => return false,
                    }
                }
            }
        }

        true
    }

    /// Load a snapshot from disk. Any read or parse failure is a miss.
    pub fn load(path: &Path) -> Option<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return None,
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %path.display(), "malformed snapshot, rebuilding: {}", e);
                None
            }
        }
    }

    /// Persist the snapshot. Best-effort: failures are logged and swallowed
    /// so a read-only filesystem never takes the service down.
    pub fn save(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        match serde_json::to_string(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!(path = %path.display(), "failed to persist snapshot: {}", e);
                } else {
                    tracing::info!(
                        path = %path.display(),
                        chunks = self.chunks.len(),
                        "snapshot persisted"
                    );
                }
            }
            Err(e) => {
                tracing::warn!("failed to serialize snapshot: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint(name: &str, size: u64) -> SourceFingerprint {
        SourceFingerprint {
            name: name.to_string(),
            size,
            mtime_ms: 1000.0,
        }
    }

    fn sample_snapshot() -> KbSnapshot {
        let chunks = vec![
            KbChunk {
                text: "alpha".to_string(),
                source: "a.txt".to_string(),
                embedding: vec![1.0, 0.0],
            },
            KbChunk {
                text: "beta".to_string(),
                source: "b.txt".to_string(),
                embedding: vec![0.0, 1.0],
            },
        ];
        KbSnapshot::from_chunks(
            "text-embedding-3-small",
            2000,
            200,
            vec![fingerprint("a.txt", 5), fingerprint("b.txt", 4)],
            &chunks,
        )
    }

    #[test]
    fn test_accepts_matching_config_and_corpus() {
        let snapshot = sample_snapshot();
        let current = vec![fingerprint("a.txt", 5), fingerprint("b.txt", 4)];
        assert!(snapshot.is_valid_for("text-embedding-3-small", 2000, 200, Some(&current)));
    }

    #[test]
    fn test_rejects_different_model_or_chunk_params() {
        let snapshot = sample_snapshot();
        let current = vec![fingerprint("a.txt", 5), fingerprint("b.txt", 4)];
        assert!(!snapshot.is_valid_for("text-embedding-3-large", 2000, 200, Some(&current)));
        assert!(!snapshot.is_valid_for("text-embedding-3-small", 1000, 200, Some(&current)));
        assert!(!snapshot.is_valid_for("text-embedding-3-small", 2000, 100, Some(&current)));
    }

    #[test]
    fn test_rejects_parallel_array_disagreement() {
        let mut snapshot = sample_snapshot();
        snapshot.embeddings.pop();
        let current = vec![fingerprint("a.txt", 5), fingerprint("b.txt", 4)];
        assert!(!snapshot.is_valid_for("text-embedding-3-small", 2000, 200, Some(&current)));
    }

    #[test]
    fn test_rejects_single_size_drift() {
        let snapshot = sample_snapshot();
        let current = vec![fingerprint("a.txt", 5), fingerprint("b.txt", 999)];
        assert!(!snapshot.is_valid_for("text-embedding-3-small", 2000, 200, Some(&current)));
    }

    #[test]
    fn test_rejects_added_or_removed_files() {
        let snapshot = sample_snapshot();
        let added = vec![
            fingerprint("a.txt", 5),
            fingerprint("b.txt", 4),
            fingerprint("c.txt", 9),
        ];
        assert!(!snapshot.is_valid_for("text-embedding-3-small", 2000, 200, Some(&added)));
        let removed = vec![fingerprint("a.txt", 5)];
        assert!(!snapshot.is_valid_for("text-embedding-3-small", 2000, 200, Some(&removed)));
    }

    #[test]
    fn test_mtime_drift_does_not_invalidate() {
        let snapshot = sample_snapshot();
        let mut current = vec![fingerprint("a.txt", 5), fingerprint("b.txt", 4)];
        current[0].mtime_ms = 99_999_999.0;
        assert!(snapshot.is_valid_for("text-embedding-3-small", 2000, 200, Some(&current)));
    }

    #[test]
    fn test_empty_current_corpus_skips_fingerprint_check() {
        let snapshot = sample_snapshot();
        assert!(snapshot.is_valid_for("text-embedding-3-small", 2000, 200, Some(&[])));
    }

    #[test]
    fn test_none_skips_fingerprint_check_entirely() {
        let snapshot = sample_snapshot();
        assert!(snapshot.is_valid_for("text-embedding-3-small", 2000, 200, None));
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb_cache.json");
        let snapshot = sample_snapshot();
        snapshot.save(&path);

        let loaded = KbSnapshot::load(&path).unwrap();
        assert_eq!(loaded.model, "text-embedding-3-small");
        let chunks = loaded.into_chunks();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "alpha");
        assert_eq!(chunks[0].source, "a.txt");
        assert_eq!(chunks[1].embedding, vec![0.0, 1.0]);
    }

    #[test]
    fn test_wire_keys_are_camel_case() {
        let json = serde_json::to_string(&sample_snapshot()).unwrap();
        assert!(json.contains("\"chunkSize\":2000"));
        assert!(json.contains("\"chunkOverlap\":200"));
        assert!(json.contains("\"sourceFiles\""));
        assert!(json.contains("\"mtimeMs\""));
    }

    #[test]
    fn test_load_misses_on_absent_or_malformed_file() {
        assert!(KbSnapshot::load(Path::new("/nope/kb_cache.json")).is_none());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb_cache.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(KbSnapshot::load(&path).is_none());
    }
}
