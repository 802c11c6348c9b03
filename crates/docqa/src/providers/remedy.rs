//! Typed remediation of upstream parameter rejections
//!
//! Different upstream models accept different generation parameters, and the
//! rejections only surface at call time. This module classifies a rejection
//! into the payload adjustments it demands so the caller can retry without
//! the offending parameters.

use serde_json::Value;

/// Payload adjustments an upstream rejection may demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Drop the `reasoning` block
    RemoveReasoning,
    /// Drop `temperature`
    RemoveTemperature,
    /// Rename `max_completion_tokens` to `max_tokens`
    RenameMaxCompletionTokens,
}

impl Remediation {
    /// Every known remediation, in application order
    pub const ALL: [Remediation; 3] = [
        Remediation::RemoveReasoning,
        Remediation::RemoveTemperature,
        Remediation::RenameMaxCompletionTokens,
    ];

    /// Whether the lowercased rejection text demands this adjustment
    fn matches(&self, error_text: &str) -> bool {
        match self {
            Remediation::RemoveReasoning => {
                (error_text.contains("unknown parameter") && error_text.contains("reasoning"))
                    || error_text.contains(r#""param": "reasoning""#)
            }
            Remediation::RemoveTemperature => {
                (error_text.contains("unsupported value") && error_text.contains("temperature"))
                    || (error_text.contains("unknown parameter")
                        && error_text.contains("temperature"))
                    || error_text.contains(r#""param": "temperature""#)
            }
            Remediation::RenameMaxCompletionTokens => {
                (error_text.contains("unknown parameter")
                    && error_text.contains("max_completion_tokens"))
                    || error_text.contains(r#""param": "max_completion_tokens""#)
            }
        }
    }

    /// Whether applying this adjustment would change the payload
    fn applicable(&self, payload: &Value) -> bool {
        match self {
            Remediation::RemoveReasoning => payload.get("reasoning").is_some(),
            Remediation::RemoveTemperature => payload.get("temperature").is_some(),
            Remediation::RenameMaxCompletionTokens => {
                payload.get("max_completion_tokens").is_some()
            }
        }
    }

    /// Apply the adjustment in place
    pub fn apply(&self, payload: &mut Value) {
        let Some(object) = payload.as_object_mut() else {
            return;
        };
        match self {
            Remediation::RemoveReasoning => {
                object.remove("reasoning");
            }
            Remediation::RemoveTemperature => {
                object.remove("temperature");
            }
            Remediation::RenameMaxCompletionTokens => {
                if let Some(value) = object.remove("max_completion_tokens") {
                    object.insert("max_tokens".to_string(), value);
                }
            }
        }
    }
}

/// Remediations the rejection demands, restricted to ones that would change
/// the given payload. Empty means the rejection is not a parameter problem
/// this layer knows how to fix and must surface as-is.
pub fn plan(error_text: &str, payload: &Value) -> Vec<Remediation> {
    let lowered = error_text.to_lowercase();
    Remediation::ALL
        .iter()
        .copied()
        .filter(|remediation| remediation.matches(&lowered) && remediation.applicable(payload))
        .collect()
}

/// Whether the rejection text says the requested model does not exist or
/// cannot be accessed by this key
pub fn is_model_unavailable(error_text: &str) -> bool {
    let lowered = error_text.to_lowercase();
    lowered.contains("model_not_found")
        || lowered.contains("does not exist")
        || lowered.contains("not have access")
        || lowered.contains(" 404")
}
