//! Source file text extraction
//!
//! The running service only reads plain-text formats. PDF extraction is
//! heavyweight and happens in the offline precompute, which bakes the result
//! into the raw snapshot.

use std::path::Path;

use crate::error::{Error, Result};

/// Extensions the running service reads directly, without the dot
pub const RUNTIME_EXTENSIONS: &[&str] = &["txt", "md"];

/// Extensions the offline precompute understands
pub const PRECOMPUTE_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

/// Lowercased extension of a path, without the dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// True when the running service can read this file
pub fn is_runtime_supported(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| RUNTIME_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// True when the offline precompute can extract text from this file
pub fn is_precompute_supported(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| PRECOMPUTE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Text extracted from one source file
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Extracted text
    pub text: String,
    /// Page count when the format exposes one
    pub num_pages: Option<u32>,
}

/// Extract text from file bytes according to the file extension
pub fn extract(name: &str, data: &[u8]) -> Result<ExtractedText> {
    let extension = name.rsplit('.').next().unwrap_or("").to_lowercase();

    match extension.as_str() {
        "txt" | "md" => {
            let text = String::from_utf8(data.to_vec())
                .map_err(|e| Error::corpus(format!("{} is not valid UTF-8: {}", name, e)))?;
            Ok(ExtractedText {
                text,
                num_pages: None,
            })
        }
        "pdf" => {
            let text = pdf_extract::extract_text_from_mem(data)
                .map_err(|e| Error::corpus(format!("failed to extract {}: {}", name, e)))?;
            Ok(ExtractedText {
                text,
                num_pages: None,
            })
        }
        other => Err(Error::corpus(format!(
            "unsupported file type for {}: {}",
            name, other
        ))),
    }
}
