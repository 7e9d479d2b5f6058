//! Page summarisation: one free-text summary per page, one file per document.
//!
//! Resumption is per document. If `<pdf>.json` exists and skipping is on,
//! the document is not downloaded, rendered or sent anywhere.

use super::{pdf_file_name, VisionTasks};
use crate::error::PaperScanError;
use crate::output::SummaryOutcome;
use crate::pipeline::encode::encode_page;
use crate::pipeline::llm::VisionRequest;
use crate::prompts::SUMMARY_PROMPT;
use tracing::info;

/// Summarise every URL, in order.
pub async fn run(
    tasks: &VisionTasks,
    urls: &[String],
) -> Result<Vec<SummaryOutcome>, PaperScanError> {
    let mut outcomes = Vec::with_capacity(urls.len());
    for url in urls {
        info!("Processing {}", url);
        outcomes.push(run_url(tasks, url).await?);
    }
    Ok(outcomes)
}

pub async fn run_url(tasks: &VisionTasks, url: &str) -> Result<SummaryOutcome, PaperScanError> {
    let pdf = pdf_file_name(&tasks.cache.resolve_path(url));
    let output_path = tasks.store.document_path(&pdf);
    if tasks.store.should_skip(&output_path) {
        info!("Already processed {}", url);
        tasks.skipped(None, &output_path);
        return Ok(SummaryOutcome::Skipped);
    }

    let (_pdf_path, pages) = tasks.fetch_and_render(url).await?;
    let total = pages.len();
    tasks.document_started(url, total);

    let mut summaries = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let request = VisionRequest::new(SUMMARY_PROMPT, vec![encode_page(page, page_num)?]);
        summaries.push(tasks.client.complete(&request).await?);
        tasks.page_completed(page_num, total);
    }

    tasks.store.write_json_pretty(&output_path, &summaries)?;
    tasks.document_completed(url);
    Ok(SummaryOutcome::Summarised(summaries))
}
