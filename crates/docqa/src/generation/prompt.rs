//! System prompt framing
//!
//! Two framings cover every answer: a strict one that confines the model
//! to the packed document context, and a best-effort one used when the
//! evidence is missing or too weak to trust.

use crate::retrieval::RetrievedContext;

/// Prompt builder for document-grounded answers
pub struct PromptBuilder;

impl PromptBuilder {
    /// Pick the system framing for a retrieval outcome
    pub fn system_for(retrieved: &RetrievedContext) -> String {
        if retrieved.grounded {
            Self::grounded_system(&retrieved.context)
        } else {
            Self::inference_system(&retrieved.context)
        }
    }

    /// Strict framing: answer only from the supplied context, cite
    /// sources, conclusion first.
    pub fn grounded_system(context: &str) -> String {
        if context.is_empty() {
            return "You are a helpful assistant. Answer concisely.".to_string();
        }
        format!(
            "-Respond as complete and concise as possible, make sure the information given is accurate. \n\
             -Do not answer questions outside of the knowledge files. \n\
             -For each response, give source, reference, and page number at the end of each response for each information mentioned (reference to the documents within the documents because each file uploaded may contain multiple documents).\n\
             -Crosscheck all of the information in the response with the reference. \n\
             -Give the short conclusion first and follow with the explanation\n\
             -Crosscheck and validate all responses strictly against the uploaded document sources before replying. Do not provide any response unless it can be fully supported with evidence from the documents.\n\
             -If the sources state a numeric rule/ratio (e.g., '1 A requires 1 B'), USE that rule to compute implied quantities for the user's asked amount using basic arithmetic. Show the calculation steps and cite the rule's source. Do not invent rules.\n\
             \n\
             {context}",
            context = context
        )
    }

    /// Best-effort framing: labelled inference over whatever partial
    /// evidence is available.
    pub fn inference_system(context: &str) -> String {
        if context.is_empty() {
            return "-No direct document evidence found. Provide a best-effort inferred answer using clear assumptions and basic arithmetic/logic. Keep it concise and label as 'Best-effort inference'. Ask for missing details if necessary.".to_string();
        }
        format!(
            "-When sources are insufficient to fully answer, provide the best-effort inferred answer using clear assumptions and basic arithmetic/logic.\n\
             -Label it as 'Best-effort inference' and prefer any partial evidence available.\n\
             -If a numeric rule/ratio exists, scale it to the asked quantity and show steps.\n\
             -If later documents contradict assumptions, state that the document rule should prevail.\n\
             \n\
             {context}",
            context = context
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounded_framing_carries_the_context() {
        let retrieved = RetrievedContext {
            context: "Source: doc.txt\nX is 42".to_string(),
            grounded: true,
        };
        let system = PromptBuilder::system_for(&retrieved);
        assert!(system.starts_with("-Respond as complete and concise"));
        assert!(system.ends_with("\n\nSource: doc.txt\nX is 42"));
        assert!(system.contains("Do not invent rules."));
    }

    #[test]
    fn test_weak_evidence_gets_inference_framing_with_context() {
        let retrieved = RetrievedContext {
            context: "Source: doc.txt\nmaybe related".to_string(),
            grounded: false,
        };
        let system = PromptBuilder::system_for(&retrieved);
        assert!(system.starts_with("-When sources are insufficient"));
        assert!(system.contains("'Best-effort inference'"));
        assert!(system.ends_with("\n\nSource: doc.txt\nmaybe related"));
    }

    #[test]
    fn test_no_evidence_gets_fixed_inference_text() {
        let retrieved = RetrievedContext {
            context: String::new(),
            grounded: false,
        };
        let system = PromptBuilder::system_for(&retrieved);
        assert!(system.starts_with("-No direct document evidence found."));
        assert!(!system.contains('\n'));
    }

    #[test]
    fn test_grounded_framing_preserves_line_structure() {
        let system = PromptBuilder::grounded_system("ctx");
        let lines: Vec<&str> = system.lines().collect();
        assert_eq!(lines[0], "-Respond as complete and concise as possible, make sure the information given is accurate. ");
        assert_eq!(lines[1], "-Do not answer questions outside of the knowledge files. ");
        assert_eq!(lines.last(), Some(&"ctx"));
    }
}
