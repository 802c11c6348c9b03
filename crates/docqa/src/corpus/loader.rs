//! Corpus directory enumeration

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::corpus::extract::{extension_of, RUNTIME_EXTENSIONS};
use crate::error::Result;
use crate::types::SourceFingerprint;

/// Lists and reads the flat corpus directory.
///
/// Subdirectories are not descended into; the corpus is a single directory
/// of files, enumerated in lexicographic name order so that fingerprint
/// comparisons are deterministic.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    dir: PathBuf,
    extensions: &'static [&'static str],
}

impl CorpusLoader {
    /// Loader over the runtime-supported plain-text formats
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extensions: RUNTIME_EXTENSIONS,
        }
    }

    /// Replace the supported extension set
    pub fn with_extensions(mut self, extensions: &'static [&'static str]) -> Self {
        self.extensions = extensions;
        self
    }

    /// Corpus directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Supported file names, sorted. A missing or unreadable directory is
    /// an empty corpus, never an error.
    pub fn list(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), "corpus directory unreadable: {}", e);
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_type()
                    .map(|file_type| file_type.is_file())
                    .unwrap_or(false)
            })
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| {
                extension_of(Path::new(name))
                    .map(|ext| self.extensions.contains(&ext.as_str()))
                    .unwrap_or(false)
            })
            .collect();

        names.sort();
        names
    }

    /// Fingerprints of the current corpus files, in list order
    pub fn fingerprints(&self) -> Result<Vec<SourceFingerprint>> {
        let mut fingerprints = Vec::new();
        for name in self.list() {
            let metadata = std::fs::metadata(self.dir.join(&name))?;
            let mtime_ms = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as f64)
                .unwrap_or(0.0);
            fingerprints.push(SourceFingerprint {
                name,
                size: metadata.len(),
                mtime_ms,
            });
        }
        Ok(fingerprints)
    }

    /// Read one corpus file as UTF-8 text
    pub fn read_text(&self, name: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.dir.join(name))?)
    }

    /// Read one corpus file as raw bytes
    pub fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.dir.join(name))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::extract::PRECOMPUTE_EXTENSIONS;

    #[test]
    fn test_missing_directory_is_an_empty_corpus() {
        let loader = CorpusLoader::new("/definitely/not/a/real/dir");
        assert!(loader.list().is_empty());
        assert!(loader.fingerprints().unwrap().is_empty());
    }

    #[test]
    fn test_lists_supported_files_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("C.TXT"), "c").unwrap();
        std::fs::write(dir.path().join("skip.pdf"), "binary").unwrap();
        std::fs::write(dir.path().join("skip.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let loader = CorpusLoader::new(dir.path());
        assert_eq!(loader.list(), vec!["C.TXT", "a.txt", "b.md"]);
    }

    #[test]
    fn test_precompute_extension_set_includes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.pdf"), "binary").unwrap();
        std::fs::write(dir.path().join("doc.txt"), "text").unwrap();

        let loader = CorpusLoader::new(dir.path()).with_extensions(PRECOMPUTE_EXTENSIONS);
        assert_eq!(loader.list(), vec!["doc.pdf", "doc.txt"]);
    }

    #[test]
    fn test_fingerprints_record_name_and_size() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.txt"), "0123456789").unwrap();

        let loader = CorpusLoader::new(dir.path());
        let fingerprints = loader.fingerprints().unwrap();
        assert_eq!(fingerprints.len(), 1);
        assert_eq!(fingerprints[0].name, "doc.txt");
        assert_eq!(fingerprints[0].size, 10);
        assert!(fingerprints[0].mtime_ms > 0.0);
    }
}
