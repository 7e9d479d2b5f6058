//! The four analysis tasks.
//!
//! | Task | Unit of work | Artifact |
//! |------|--------------|----------|
//! | [`outperform`] | page | `<pdf>_<page>.json`, raw model JSON |
//! | [`citations`]  | page or whole document | `<pdf>_<page>.json` + `results.json` |
//! | [`summarize`]  | document | `<pdf>.json`, array of page summaries |
//! | [`tokens`]     | page text | `detail.jsonl`, `detail.csv`, `grouped.csv` |
//!
//! The three vision tasks share [`VisionTasks`], which owns the injected
//! collaborators. Everything runs sequentially: URLs in the order given,
//! pages in page order.

pub mod citations;
pub mod outperform;
pub mod summarize;
pub mod tokens;

use crate::config::RunConfig;
use crate::error::PaperScanError;
use crate::pipeline::fetch::FetchCache;
use crate::pipeline::llm::{LlmVisionClient, VisionClient};
use crate::pipeline::render::{PageRenderer, PdfiumEngine};
use crate::pipeline::store::ResultStore;
use crate::progress::ProgressCallback;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Collaborators shared by the vision tasks.
pub struct VisionTasks {
    pub(crate) cache: FetchCache,
    pub(crate) store: ResultStore,
    pub(crate) renderer: Arc<dyn PageRenderer>,
    pub(crate) client: Arc<dyn VisionClient>,
    pub(crate) progress: Option<ProgressCallback>,
}

impl VisionTasks {
    /// Wire the tasks with explicit renderer and client.
    pub fn new(
        config: &RunConfig,
        renderer: Arc<dyn PageRenderer>,
        client: Arc<dyn VisionClient>,
    ) -> Result<Self, PaperScanError> {
        Ok(Self {
            cache: FetchCache::new(&config.cache_dir, config.download_timeout_secs)?,
            store: ResultStore::new(&config.output_dir, config.skip_existing),
            renderer,
            client,
            progress: config.progress_callback.clone(),
        })
    }

    /// Production wiring: pdfium for rendering, `edgequake-llm` for the model.
    pub fn from_config(config: &RunConfig) -> Result<Self, PaperScanError> {
        let renderer = Arc::new(PdfiumEngine::new(
            config.max_rendered_pixels,
            config.pdfium_library.clone(),
        ));
        let client = Arc::new(LlmVisionClient::from_config(config)?);
        Self::new(config, renderer, client)
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Make sure the PDF is cached and rasterise every page.
    pub(crate) async fn fetch_and_render(
        &self,
        url: &str,
    ) -> Result<(PathBuf, Vec<DynamicImage>), PaperScanError> {
        let pdf_path = self.cache.fetch(url).await?;
        let pages = self.renderer.render_pages(&pdf_path).await?;
        Ok((pdf_path, pages))
    }

    pub(crate) fn document_started(&self, url: &str, total_pages: usize) {
        if let Some(ref cb) = self.progress {
            cb.on_document_start(url, total_pages);
        }
    }

    pub(crate) fn skipped(&self, page_num: Option<usize>, artifact: &Path) {
        if let Some(ref cb) = self.progress {
            cb.on_skipped(page_num, artifact);
        }
    }

    pub(crate) fn page_completed(&self, page_num: usize, total_pages: usize) {
        if let Some(ref cb) = self.progress {
            cb.on_page_complete(page_num, total_pages);
        }
    }

    pub(crate) fn document_completed(&self, url: &str) {
        if let Some(ref cb) = self.progress {
            cb.on_document_complete(url);
        }
    }
}

/// File name of a cached PDF, used as the stem of its artifacts.
pub(crate) fn pdf_file_name(pdf_path: &Path) -> String {
    pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string())
}
