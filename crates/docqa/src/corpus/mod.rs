//! Corpus enumeration, text extraction and chunking

pub mod chunker;
pub mod extract;
pub mod loader;

pub use chunker::Chunker;
pub use loader::CorpusLoader;
