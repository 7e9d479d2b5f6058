//! Superiority classification: does a page claim to beat GPT-4o?
//!
//! One JSON-mode call per page. The model's answer is written to
//! `<pdf>_<page>.json` exactly as received; the parsed verdict is only
//! returned to the caller.

use super::{pdf_file_name, VisionTasks};
use crate::error::PaperScanError;
use crate::output::{ModelOutput, PageVerdict, SuperiorityVerdict};
use crate::pipeline::encode::encode_page;
use crate::pipeline::llm::VisionRequest;
use crate::pipeline::parse::parse_model_json;
use crate::prompts::SUPERIORITY_PROMPT;
use tracing::info;

/// Classify every page of every URL, in order.
pub async fn run(tasks: &VisionTasks, urls: &[String]) -> Result<Vec<PageVerdict>, PaperScanError> {
    let mut verdicts = Vec::new();
    for url in urls {
        info!("Processing {}", url);
        verdicts.extend(run_url(tasks, url).await?);
    }
    Ok(verdicts)
}

/// Classify the pages of one document.
///
/// Pages whose artifact already exists are skipped when the store has
/// skipping enabled; they are absent from the returned list.
pub async fn run_url(tasks: &VisionTasks, url: &str) -> Result<Vec<PageVerdict>, PaperScanError> {
    let (pdf_path, pages) = tasks.fetch_and_render(url).await?;
    let pdf = pdf_file_name(&pdf_path);
    let total = pages.len();
    tasks.document_started(url, total);

    let mut verdicts = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let output_path = tasks.store.page_path(&pdf, page_num);
        if tasks.store.should_skip(&output_path) {
            info!("Skipping {}", output_path.display());
            tasks.skipped(Some(page_num), &output_path);
            continue;
        }

        let request =
            VisionRequest::new(SUPERIORITY_PROMPT, vec![encode_page(page, page_num)?]).json_object();
        let raw = tasks.client.complete(&request).await?;
        tasks.store.write_text(&output_path, &raw)?;

        let verdict: ModelOutput<SuperiorityVerdict> = parse_model_json(&raw);
        if let Some(v) = verdict.parsed() {
            info!(
                "{} page {}: superior={:?}",
                pdf, page_num, v.is_superior_to_gpt_4o
            );
        }
        verdicts.push(PageVerdict {
            pdf: pdf.clone(),
            page_index: page_num,
            verdict,
        });
        tasks.page_completed(page_num, total);
    }

    tasks.document_completed(url);
    Ok(verdicts)
}
