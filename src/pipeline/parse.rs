//! Turn a model answer that should be JSON into a [`ModelOutput`].
//!
//! Even in JSON mode some providers wrap the object in a ```` ```json ````
//! fence or pad it with whitespace. Those are stripped before parsing.
//! JSON of the wrong shape is kept as [`ModelOutput::Untyped`]; anything
//! that is not JSON at all is kept verbatim as [`ModelOutput::Unparsed`].
//! Both are logged.

use crate::output::ModelOutput;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::warn;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\s*\n(.*?)\n?```$").unwrap());

/// Remove a single outer code fence and surrounding whitespace.
pub fn strip_code_fence(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parse `raw` as `T`, else as any JSON value, else keep it as text.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> ModelOutput<T> {
    let body = strip_code_fence(raw);
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to decode JSON ({}): {}", e, raw);
            return ModelOutput::Unparsed(raw.to_string());
        }
    };
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => ModelOutput::Parsed(parsed),
        Err(e) => {
            warn!("Unexpected JSON shape ({}): {}", e, body);
            ModelOutput::Untyped(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{CitationReport, SuperiorityVerdict};

    #[test]
    fn plain_json_parses() {
        let out: ModelOutput<SuperiorityVerdict> =
            parse_model_json(r#"{"is_superior_to_gpt_4o": true, "reason": "Table 2"}"#);
        assert_eq!(out.parsed().unwrap().is_superior_to_gpt_4o, Some(true));
    }

    #[test]
    fn fenced_json_parses() {
        let raw = "```json\n{\"References\": [], \"Citations\": []}\n```";
        let out: ModelOutput<CitationReport> = parse_model_json(raw);
        assert!(out.is_parsed());
    }

    #[test]
    fn prose_is_kept_verbatim() {
        let raw = "Sorry, I cannot read this page.";
        let out: ModelOutput<CitationReport> = parse_model_json(raw);
        assert_eq!(out, ModelOutput::Unparsed(raw.to_string()));
    }

    #[test]
    fn off_schema_json_is_kept_as_value() {
        let raw = r#"{"references": [{"index": "1", "title": "Attention"}], "citations": []}"#;
        let out: ModelOutput<CitationReport> = parse_model_json(raw);
        match out {
            ModelOutput::Untyped(value) => {
                assert_eq!(value["references"][0]["title"], "Attention");
            }
            other => panic!("expected untyped JSON, got {other:?}"),
        }
    }

    #[test]
    fn empty_object_is_not_an_empty_report() {
        let out: ModelOutput<CitationReport> = parse_model_json("{}");
        assert_eq!(out, ModelOutput::Untyped(serde_json::json!({})));
    }

    #[test]
    fn strip_leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fence("  {\"a\": 1}\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n[1, 2]\n```"), "[1, 2]");
    }
}
