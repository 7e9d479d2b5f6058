//! Reference and citation extraction.
//!
//! Two modes:
//!
//! * [`CitationMode::PerPage`]: one JSON-mode call per page, each answer
//!   written to `<pdf>_<page>.json` and collected for `results.json`.
//! * [`CitationMode::SingleShot`]: every page image of a document in one
//!   call, so the model can match in-text markers against the reference
//!   section itself. No per-page files, so nothing to skip.
//!
//! In both modes an answer that is not valid JSON is kept as text rather
//! than failing the run.

use super::{pdf_file_name, VisionTasks};
use crate::error::PaperScanError;
use crate::output::{CitationReport, DocumentCitations, ModelOutput, PageCitations};
use crate::pipeline::encode::{encode_page, encode_pages};
use crate::pipeline::llm::VisionRequest;
use crate::pipeline::parse::parse_model_json;
use crate::prompts::CITATION_PROMPT;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CitationMode {
    #[default]
    PerPage,
    SingleShot,
}

/// Extract citations for every URL, then write `results.json` once.
pub async fn run(
    tasks: &VisionTasks,
    urls: &[String],
    mode: CitationMode,
) -> Result<Vec<DocumentCitations>, PaperScanError> {
    let mut results = Vec::with_capacity(urls.len());
    for url in urls {
        info!("Processing {}", url);
        let result = match mode {
            CitationMode::PerPage => DocumentCitations::PerPage(run_url(tasks, url).await?),
            CitationMode::SingleShot => {
                DocumentCitations::SingleShot(run_url_single_shot(tasks, url).await?)
            }
        };
        results.push(result);
    }
    info!("done");

    tasks
        .store
        .write_json(&tasks.store.results_path(), &results)?;
    Ok(results)
}

/// Per-page extraction for one document.
///
/// Pages skipped because their artifact exists are read back from disk so
/// the combined results stay complete across resumed runs.
pub async fn run_url(tasks: &VisionTasks, url: &str) -> Result<Vec<PageCitations>, PaperScanError> {
    let (pdf_path, pages) = tasks.fetch_and_render(url).await?;
    let pdf = pdf_file_name(&pdf_path);
    let total = pages.len();
    tasks.document_started(url, total);

    let mut results = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let output_path = tasks.store.page_path(&pdf, page_num);

        if tasks.store.should_skip(&output_path) {
            info!("Skipping {}", output_path.display());
            tasks.skipped(Some(page_num), &output_path);
            match tasks.store.read_existing::<ModelOutput<CitationReport>>(&output_path) {
                Ok(result) => results.push(PageCitations {
                    pdf: pdf.clone(),
                    page_index: page_num,
                    result,
                }),
                Err(e) => warn!("Leaving page {} out of results: {}", page_num, e),
            }
            continue;
        }

        let request =
            VisionRequest::new(CITATION_PROMPT, vec![encode_page(page, page_num)?]).json_object();
        let raw = tasks.client.complete(&request).await?;
        let result: ModelOutput<CitationReport> = parse_model_json(&raw);

        tasks.store.write_json(&output_path, &result)?;
        results.push(PageCitations {
            pdf: pdf.clone(),
            page_index: page_num,
            result,
        });
        tasks.page_completed(page_num, total);
    }

    tasks.document_completed(url);
    Ok(results)
}

/// Whole-document extraction: exactly one model call, all pages in order.
pub async fn run_url_single_shot(
    tasks: &VisionTasks,
    url: &str,
) -> Result<ModelOutput<CitationReport>, PaperScanError> {
    let (_pdf_path, pages) = tasks.fetch_and_render(url).await?;
    let total = pages.len();
    tasks.document_started(url, total);

    let request = VisionRequest::new(CITATION_PROMPT, encode_pages(&pages)?).json_object();
    let raw = tasks.client.complete(&request).await?;
    let result = parse_model_json(&raw);

    tasks.page_completed(total, total);
    tasks.document_completed(url);
    Ok(result)
}
