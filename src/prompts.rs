//! System prompts for the vision tasks.
//!
//! Every instruction the tasks send lives here so a wording change touches
//! one place and tests can inspect the prompts without a model.

/// Asks whether a page shows the paper's method beating GPT-4o.
///
/// Sent with JSON-object mode; the answer is persisted verbatim.
pub const SUPERIORITY_PROMPT: &str = "This is a part of a paper. Determine whether this section \
indicates that the proposed method in this paper is superior to GPT-4o. If GPT-4o is not \
mentioned, set is_superior_to_gpt_4o to null. Provide the reason in the following JSON format: \
{\"is_superior_to_gpt_4o\": bool | null, \"reason\": string}";

/// Asks for the reference list and the citation occurrences.
///
/// Used for a single page and, unchanged, for a whole document sent in one
/// request.
pub const CITATION_PROMPT: &str = r#"The following image is a part of a paper. I would like to understand which sources are being cited and where they are cited in the paper. Please refer to the content listed in the reference section. Output the information in the following json format:
{
   "References": [{"index": str(reference number), "title": str(reference title)}, ...],
   "Citations": [{"ref": [str(reference number), ...], "content": str(citation content)}, ...]
}
"#;

/// Free-text page summary.
pub const SUMMARY_PROMPT: &str = "Summarize and explain this page.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superiority_prompt_names_both_keys() {
        assert!(SUPERIORITY_PROMPT.contains("is_superior_to_gpt_4o"));
        assert!(SUPERIORITY_PROMPT.contains("\"reason\""));
    }

    #[test]
    fn citation_prompt_matches_report_keys() {
        assert!(CITATION_PROMPT.contains("\"References\""));
        assert!(CITATION_PROMPT.contains("\"Citations\""));
        assert!(CITATION_PROMPT.contains("\"ref\""));
        // JSON mode on OpenAI requires the word "json" in the prompt.
        assert!(CITATION_PROMPT.to_lowercase().contains("json"));
    }
}
