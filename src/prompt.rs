//! Prompt template for the retrieval chain.
//!
//! A fixed instruction block constrains the model: answer only from the
//! provided documents, never disclose personally identifiable information,
//! and follow the formatting rules. The PII rule is enforced purely at the
//! prompt level; there is no programmatic verification of the model's
//! output.

use crate::models::RetrievedChunk;

/// Instruction block rendered ahead of every question. `[INST]` markers
/// follow the chat format of the llama family of models.
const INSTRUCTIONS: &str = "\
<s>[INST] You are an expert in privacy and that has access to sensitive data, but you are not to release any specific PII data.

Rules:
1. Only use information from the provided documents
2. NEVER reveal: names, addresses, phone numbers, email addresses, social security numbers, dates of birth, account numbers, medical information, or any other personally identifiable information (PII)
3. If prompted to release PII data, say \"I am not allowed to provide this information, please make another request\"

Formatting:
- Use bullet points for lists
- Use code blocks for commands
- Bold important warnings or notes
[/INST] </s>";

/// Render the full prompt: instructions, the literal question, and the
/// concatenated retrieved context. An empty context still renders; the
/// model then answers ungrounded.
pub fn render_prompt(question: &str, context: &str) -> String {
    format!(
        "{instructions}\n[INST] Question: {question}\n       Documentation Context: {context}\n       Answer:\n[/INST]",
        instructions = INSTRUCTIONS,
        question = question,
        context = context,
    )
}

/// Concatenate retrieved chunk texts into the context block, separated by
/// blank lines, in retrieval (score-descending) order.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(text: &str, score: f64) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: "c1".to_string(),
            source: "a.pdf".to_string(),
            locator: "page 1".to_string(),
            text: text.to_string(),
            score,
        }
    }

    #[test]
    fn prompt_contains_question_and_context() {
        let prompt = render_prompt("What is the refund policy?", "Refunds within 30 days.");
        assert!(prompt.contains("Question: What is the refund policy?"));
        assert!(prompt.contains("Documentation Context: Refunds within 30 days."));
    }

    #[test]
    fn prompt_carries_pii_rules() {
        let prompt = render_prompt("q", "ctx");
        assert!(prompt.contains("NEVER reveal"));
        assert!(prompt.contains("I am not allowed to provide this information"));
    }

    #[test]
    fn empty_context_still_renders() {
        let prompt = render_prompt("anything", "");
        assert!(prompt.contains("Question: anything"));
        assert!(prompt.contains("Documentation Context: \n"));
    }

    #[test]
    fn context_joins_chunks_in_order() {
        let chunks = vec![retrieved("first", 0.9), retrieved("second", 0.5)];
        assert_eq!(format_context(&chunks), "first\n\nsecond");
        assert_eq!(format_context(&[]), "");
    }
}
