//! docqa: document question-answering service with retrieval-grounded answers
//!
//! Loads a document corpus, chunks and embeds it into a cached knowledge
//! base, retrieves the passages closest to each question, and answers
//! through an OpenAI-compatible chat API with source-grounded framing.
//! Answers are served as JSON or as a relayed SSE stream that carries a
//! model attribution frame.

pub mod config;
pub mod context;
pub mod corpus;
pub mod error;
pub mod generation;
pub mod kb;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod streaming;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use kb::KnowledgeBase;
pub use server::ChatServer;
pub use types::{ChatMessage, ChatRequest, ChatResponse};
