//! PDF engine: rasterise pages and extract their text via pdfium.
//!
//! The tasks only see the [`PageRenderer`] and [`TextExtractor`] traits;
//! [`PdfiumEngine`] is the production implementation of both. Tests swap in
//! fakes that return canned images or strings.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and not
//! async-aware. Each call binds pdfium, opens the document and walks its
//! pages on a blocking-pool thread, then hands the results back.

use crate::error::PaperScanError;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Turns a cached PDF into one image per page, in page order.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render_pages(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, PaperScanError>;
}

/// Turns a cached PDF into one string of plain text per page, in page order.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<String>, PaperScanError>;
}

/// pdfium-backed [`PageRenderer`] and [`TextExtractor`].
#[derive(Debug, Clone)]
pub struct PdfiumEngine {
    max_rendered_pixels: u32,
    library_path: Option<PathBuf>,
}

impl PdfiumEngine {
    /// `max_rendered_pixels` caps the longest edge of every rendered page.
    /// `library_path` selects a specific libpdfium; `None` binds the system one.
    pub fn new(max_rendered_pixels: u32, library_path: Option<PathBuf>) -> Self {
        Self {
            max_rendered_pixels,
            library_path,
        }
    }
}

#[async_trait]
impl PageRenderer for PdfiumEngine {
    async fn render_pages(&self, pdf_path: &Path) -> Result<Vec<DynamicImage>, PaperScanError> {
        let path = pdf_path.to_path_buf();
        let library = self.library_path.clone();
        let max_pixels = self.max_rendered_pixels;

        tokio::task::spawn_blocking(move || {
            render_pages_blocking(&path, library.as_deref(), max_pixels)
        })
        .await
        .map_err(|e| PaperScanError::Internal(format!("Render task panicked: {}", e)))?
    }
}

#[async_trait]
impl TextExtractor for PdfiumEngine {
    async fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<String>, PaperScanError> {
        let path = pdf_path.to_path_buf();
        let library = self.library_path.clone();

        tokio::task::spawn_blocking(move || extract_pages_blocking(&path, library.as_deref()))
            .await
            .map_err(|e| PaperScanError::Internal(format!("Text task panicked: {}", e)))?
    }
}

fn bind(library_path: Option<&Path>) -> Result<Pdfium, PaperScanError> {
    let bindings = match library_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| PaperScanError::PdfiumBindingFailed(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

fn open<'a>(pdfium: &'a Pdfium, pdf_path: &Path) -> Result<PdfDocument<'a>, PaperScanError> {
    pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| PaperScanError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })
}

fn render_pages_blocking(
    pdf_path: &Path,
    library_path: Option<&Path>,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, PaperScanError> {
    let pdfium = bind(library_path)?;
    let document = open(&pdfium, pdf_path)?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut images = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            PaperScanError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        images.push(image);
    }

    Ok(images)
}

fn extract_pages_blocking(
    pdf_path: &Path,
    library_path: Option<&Path>,
) -> Result<Vec<String>, PaperScanError> {
    let pdfium = bind(library_path)?;
    let document = open(&pdfium, pdf_path)?;

    let mut texts = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| PaperScanError::TextExtractionFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?
            .all();
        debug!("Extracted page {} → {} chars", idx + 1, text.chars().count());
        texts.push(text);
    }

    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_keeps_settings() {
        let engine = PdfiumEngine::new(1600, Some(PathBuf::from("/opt/pdfium/libpdfium.so")));
        assert_eq!(engine.max_rendered_pixels, 1600);
        assert_eq!(
            engine.library_path.as_deref(),
            Some(Path::new("/opt/pdfium/libpdfium.so"))
        );
    }

    #[tokio::test]
    async fn missing_library_is_a_binding_error() {
        let engine = PdfiumEngine::new(800, Some(PathBuf::from("/definitely/not/libpdfium.so")));
        let err = engine
            .render_pages(Path::new("/definitely/not/paper.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaperScanError::PdfiumBindingFailed(_)), "got: {err}");
    }
}
