//! Chat request and response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The question to answer
    #[serde(default)]
    pub message: Option<String>,
    /// Prior conversation turns, oldest first. Entries are filtered rather
    /// than validated: anything that is not a user/assistant message with
    /// string content is dropped.
    #[serde(default)]
    pub history: Option<Vec<Value>>,
}

impl ChatRequest {
    /// The trimmed question, if one was supplied
    pub fn question(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// History entries that survive the lenient filter, in order
    pub fn sanitized_history(&self) -> Vec<ChatMessage> {
        let Some(entries) = &self.history else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|entry| {
                let role = entry.get("role")?.as_str()?;
                let content = entry.get("content")?.as_str()?;
                if role == "user" || role == "assistant" {
                    Some(ChatMessage {
                        role: role.to_string(),
                        content: content.to_string(),
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

/// One conversation message in provider wire shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Non-streaming chat response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Answer text, with a trailing model attribution line when non-empty
    pub reply: String,
    /// Model that produced the answer
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_trims_and_rejects_blank() {
        let request = ChatRequest {
            message: Some("  what is x?  ".to_string()),
            history: None,
        };
        assert_eq!(request.question(), Some("what is x?"));

        let blank = ChatRequest {
            message: Some("   ".to_string()),
            history: None,
        };
        assert_eq!(blank.question(), None);

        let missing = ChatRequest {
            message: None,
            history: None,
        };
        assert_eq!(missing.question(), None);
    }

    #[test]
    fn test_history_filter_drops_malformed_entries() {
        let request = ChatRequest {
            message: Some("q".to_string()),
            history: Some(vec![
                json!({"role": "user", "content": "hello"}),
                json!({"role": "assistant", "content": "hi"}),
                json!({"role": "system", "content": "sneaky"}),
                json!({"role": "user", "content": 42}),
                json!({"role": "user"}),
                json!("not an object"),
                json!(null),
            ]),
        };

        let history = request.sanitized_history();
        assert_eq!(
            history,
            vec![
                ChatMessage::user("hello"),
                ChatMessage {
                    role: "assistant".to_string(),
                    content: "hi".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_request_deserializes_without_optional_fields() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(request.question(), Some("hi"));
        assert!(request.sanitized_history().is_empty());
    }
}
