//! Answer generation

pub mod prompt;

/// Model id reported when the upstream response never names one
pub const UNKNOWN_MODEL: &str = "unknown-model";

/// Attribution line appended to non-streaming replies and injected into
/// streams before the terminal frame
pub fn model_attribution(model: &str) -> String {
    format!("\n\n— model: {}", model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribution_names_the_model() {
        assert_eq!(model_attribution("o3"), "\n\n— model: o3");
    }
}
