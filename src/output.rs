//! Artifact types produced by the analysis tasks.
//!
//! Each task gets its own record type so the shape of what lands on disk is
//! checked at compile time. Field names follow the JSON keys the prompts ask
//! the model for, which is why a few of them are renamed.

use serde::{Deserialize, Deserializer, Serialize};

/// A model answer that was asked to be JSON.
///
/// Serialised untagged: a parsed value is written as the value itself, valid
/// JSON of another shape as that JSON, and an unparsed answer as a JSON string
/// holding the raw text. Reading an artifact back tries the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelOutput<T> {
    Parsed(T),
    /// Not JSON at all.
    Unparsed(String),
    /// Valid JSON that does not match `T` (wrong keys, wrong types).
    Untyped(serde_json::Value),
}

impl<T> ModelOutput<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ModelOutput::Parsed(_))
    }

    pub fn parsed(&self) -> Option<&T> {
        match self {
            ModelOutput::Parsed(v) => Some(v),
            ModelOutput::Unparsed(_) | ModelOutput::Untyped(_) => None,
        }
    }
}

// ── Superiority classification ───────────────────────────────────────────

/// Whether a page claims the paper's method beats GPT-4o.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperiorityVerdict {
    /// `None` when the page does not mention the baseline at all.
    #[serde(default)]
    pub is_superior_to_gpt_4o: Option<bool>,
    #[serde(default)]
    pub reason: String,
}

/// One classified page, as returned to the caller.
///
/// The artifact on disk is the raw model text; `verdict` is a parsed view of
/// that same text.
#[derive(Debug, Clone, Serialize)]
pub struct PageVerdict {
    pub pdf: String,
    pub page_index: usize,
    pub verdict: ModelOutput<SuperiorityVerdict>,
}

// ── References & citations ───────────────────────────────────────────────

/// Both keys are required: an answer missing either one is kept as
/// [`ModelOutput::Untyped`] rather than read as an empty report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationReport {
    #[serde(rename = "References")]
    pub references: Vec<Reference>,
    #[serde(rename = "Citations")]
    pub citations: Vec<Citation>,
}

/// An entry of the paper's reference list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(deserialize_with = "string_or_number")]
    pub index: String,
    pub title: String,
}

/// A place in the text that cites one or more references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(rename = "ref", deserialize_with = "strings_or_numbers")]
    pub refs: Vec<String>,
    pub content: String,
}

/// Citation extraction result for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCitations {
    pub pdf: String,
    pub page_index: usize,
    pub result: ModelOutput<CitationReport>,
}

/// Citation extraction result for one URL, as collected into `results.json`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DocumentCitations {
    PerPage(Vec<PageCitations>),
    SingleShot(ModelOutput<CitationReport>),
}

// ── Summaries ────────────────────────────────────────────────────────────

/// What happened to one document in the summarisation task.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    /// The per-document artifact already existed and skipping was enabled.
    Skipped,
    /// Freshly summarised; one entry per page, in page order.
    Summarised(Vec<String>),
}

// ── Token accounting ─────────────────────────────────────────────────────

/// Character and token counts for one page of extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTokenRecord {
    pub pdf: String,
    pub page: usize,
    pub text: String,
    pub length: usize,
    pub non_empty_chars: usize,
    #[serde(rename = "o200k_base(gpt-4o)")]
    pub o200k_base: usize,
    #[serde(rename = "cl100k_base(gpt-4,gpt-3.5)")]
    pub cl100k_base: usize,
}

/// [`PageTokenRecord`] without the text, for `detail.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageTokenRow {
    pub pdf: String,
    pub page: usize,
    pub length: usize,
    pub non_empty_chars: usize,
    #[serde(rename = "o200k_base(gpt-4o)")]
    pub o200k_base: usize,
    #[serde(rename = "cl100k_base(gpt-4,gpt-3.5)")]
    pub cl100k_base: usize,
}

impl From<&PageTokenRecord> for PageTokenRow {
    fn from(r: &PageTokenRecord) -> Self {
        Self {
            pdf: r.pdf.clone(),
            page: r.page,
            length: r.length,
            non_empty_chars: r.non_empty_chars,
            o200k_base: r.o200k_base,
            cl100k_base: r.cl100k_base,
        }
    }
}

/// One row of `grouped.csv`: a document, or the `TOTAL` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRow {
    pub pdf: String,
    pub page_count: usize,
    #[serde(rename = "length(sum)")]
    pub length_sum: u64,
    #[serde(rename = "length(mean)")]
    pub length_mean: f64,
    #[serde(rename = "non_empty_chars(sum)")]
    pub non_empty_chars_sum: u64,
    #[serde(rename = "non_empty_chars(mean)")]
    pub non_empty_chars_mean: f64,
    #[serde(rename = "o200k_base(gpt-4o)(sum)")]
    pub o200k_base_sum: u64,
    #[serde(rename = "o200k_base(gpt-4o)(mean)")]
    pub o200k_base_mean: f64,
    #[serde(rename = "cl100k_base(gpt-4,gpt-3.5)(sum)")]
    pub cl100k_base_sum: u64,
    #[serde(rename = "cl100k_base(gpt-4,gpt-3.5)(mean)")]
    pub cl100k_base_mean: f64,
}

/// Everything the token-accounting task computed.
#[derive(Debug, Clone)]
pub struct TokenReport {
    pub details: Vec<PageTokenRecord>,
    pub grouped: Vec<GroupedRow>,
}

// ── Lenient scalars ──────────────────────────────────────────────────────

// Models write `"index": 12` about as often as `"index": "12"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl From<Scalar> for String {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Text(t) => t,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Scalar::deserialize(d).map(String::from)
}

fn strings_or_numbers<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Vec::<Scalar>::deserialize(d).map(|v| v.into_iter().map(String::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_report_accepts_numeric_indices() {
        let raw = r#"{
            "References": [{"index": 3, "title": "Attention Is All You Need"}],
            "Citations": [{"ref": [3, "4"], "content": "as shown by [3, 4]"}]
        }"#;
        let report: CitationReport = serde_json::from_str(raw).unwrap();
        assert_eq!(report.references[0].index, "3");
        assert_eq!(report.citations[0].refs, vec!["3", "4"]);
    }

    #[test]
    fn citation_report_serialises_with_prompt_keys() {
        let report = CitationReport {
            references: vec![Reference {
                index: "1".into(),
                title: "BERT".into(),
            }],
            citations: vec![Citation {
                refs: vec!["1".into()],
                content: "following [1]".into(),
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["References"][0]["title"], "BERT");
        assert_eq!(json["Citations"][0]["ref"][0], "1");
    }

    #[test]
    fn unparsed_output_serialises_as_string() {
        let out: ModelOutput<CitationReport> = ModelOutput::Unparsed("not json".into());
        assert_eq!(serde_json::to_string(&out).unwrap(), "\"not json\"");
    }

    #[test]
    fn model_output_reads_back_every_form() {
        let parsed: ModelOutput<CitationReport> =
            serde_json::from_str(r#"{"References": [], "Citations": []}"#).unwrap();
        assert!(parsed.is_parsed());

        let unparsed: ModelOutput<CitationReport> =
            serde_json::from_str("\"the model rambled\"").unwrap();
        assert_eq!(unparsed, ModelOutput::Unparsed("the model rambled".into()));

        let untyped: ModelOutput<CitationReport> =
            serde_json::from_str(r#"{"references": []}"#).unwrap();
        assert_eq!(untyped, ModelOutput::Untyped(serde_json::json!({"references": []})));
    }

    #[test]
    fn citation_report_requires_both_keys() {
        assert!(serde_json::from_str::<CitationReport>("{}").is_err());
        assert!(serde_json::from_str::<CitationReport>(r#"{"References": []}"#).is_err());
    }

    #[test]
    fn verdict_null_means_not_mentioned() {
        let v: SuperiorityVerdict =
            serde_json::from_str(r#"{"is_superior_to_gpt_4o": null, "reason": "no GPT-4o"}"#)
                .unwrap();
        assert_eq!(v.is_superior_to_gpt_4o, None);
    }

    #[test]
    fn token_row_drops_text() {
        let rec = PageTokenRecord {
            pdf: "a.pdf".into(),
            page: 1,
            text: "hello".into(),
            length: 5,
            non_empty_chars: 5,
            o200k_base: 1,
            cl100k_base: 1,
        };
        let row = PageTokenRow::from(&rec);
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("text").is_none());
        assert_eq!(json["o200k_base(gpt-4o)"], 1);
    }
}
