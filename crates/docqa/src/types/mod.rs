//! Core types for the document QA service

pub mod chat;
pub mod kb;

pub use chat::{ChatMessage, ChatRequest, ChatResponse};
pub use kb::{KbChunk, SourceFingerprint};
