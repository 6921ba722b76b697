//! Instruction prompts for claim-document analysis.
//!
//! Centralising the prompt text here serves two purposes:
//!
//! 1. **Single source of truth** — changing how the model is instructed
//!    requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the exact request input built
//!    for a chunk without spinning up a real generation endpoint.
//!
//! Callers can override the default via
//! [`crate::config::AnalysisConfig::prompt`]; the constant here is used only
//! when no override is provided.

/// Default instruction preamble sent ahead of every chunk's text.
///
/// Used when `AnalysisConfig::prompt` is `None`.
pub const INSURANCE_CLAIM_PROMPT: &str = "Summarize and extract key insights from the given document in all details in a structured table format.";

/// Separator between the instruction preamble and the chunk text.
pub const DOCUMENT_CONTENT_HEADER: &str = "\n\nDOCUMENT CONTENT:\n";

/// Build the full generation input for one chunk.
///
/// Layout: instruction preamble, a fixed `DOCUMENT CONTENT:` header, then the
/// newline-joined page texts of the chunk, order preserved.
pub fn build_input(prompt: &str, chunk_text: &str) -> String {
    format!("{prompt}{DOCUMENT_CONTENT_HEADER}{chunk_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_layout_is_prompt_then_header_then_text() {
        let input = build_input(INSURANCE_CLAIM_PROMPT, "Page one text\nPage two text");
        assert!(input.starts_with(INSURANCE_CLAIM_PROMPT));
        assert!(input.contains("\n\nDOCUMENT CONTENT:\n"));
        assert!(input.ends_with("Page one text\nPage two text"));
    }

    #[test]
    fn custom_prompt_replaces_default() {
        let input = build_input("List every date mentioned.", "text");
        assert!(input.starts_with("List every date mentioned."));
        assert!(!input.contains(INSURANCE_CLAIM_PROMPT));
    }
}
