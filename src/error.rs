//! Error types for the edgequake-paperscan library.
//!
//! Failures come in two flavours:
//!
//! * [`PaperScanError`] is **fatal**. The task cannot continue (download
//!   refused, PDF unreadable, provider not configured, disk full). Returned
//!   as `Err(PaperScanError)` from every task entry point and aborts the run.
//!
//! * A model answer that is not the JSON we asked for is **not** an error.
//!   It is captured as [`crate::output::ModelOutput::Unparsed`] (not JSON)
//!   or [`crate::output::ModelOutput::Untyped`] (JSON of another shape) and
//!   persisted as-is, so one odd page never costs the rest of the batch.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-paperscan library.
#[derive(Debug, Error)]
pub enum PaperScanError {
    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The server answered, but not with a success status.
    #[error("Failed to fetch '{url}': HTTP {status}")]
    FetchFailed {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The request never produced a usable response (DNS, TLS, timeout, body read).
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nDelete the cached copy to force a fresh download.")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// pdfium could not extract the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium system-wide, or point PDFIUM_LIB_PATH (--pdfium-lib)\n\
at an existing copy. Pre-built libraries are available from\n\
https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API call failed. Calls are not retried.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// A page image could not be encoded for the request body.
    #[error("Image encoding failed for page {page}: {detail}")]
    ImageEncodingFailed { page: usize, detail: String },

    // ── Token counting ────────────────────────────────────────────────────
    /// A BPE table could not be loaded.
    #[error("Tokenizer '{encoding}' is unavailable: {detail}")]
    TokenizerUnavailable { encoding: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact (or a cached PDF).
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read back an existing artifact.
    #[error("Failed to read '{path}': {source}")]
    OutputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialising an artifact failed.
    #[error("Failed to serialise '{path}': {detail}")]
    SerialiseFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaperScanError {
    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputWriteFailed {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failed_display_carries_status() {
        let e = PaperScanError::FetchFailed {
            url: "https://example.com/paper.pdf".into(),
            status: reqwest::StatusCode::NOT_FOUND,
        };
        let msg = e.to_string();
        assert!(msg.contains("404"), "got: {msg}");
        assert!(msg.contains("paper.pdf"), "got: {msg}");
    }

    #[test]
    fn write_failed_keeps_source() {
        use std::error::Error as _;
        let e = PaperScanError::write_failed(
            "/tmp/out.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(e.to_string().contains("/tmp/out.json"));
        assert!(e.source().is_some());
    }

    #[test]
    fn tokenizer_display() {
        let e = PaperScanError::TokenizerUnavailable {
            encoding: "o200k_base".into(),
            detail: "missing table".into(),
        };
        assert!(e.to_string().contains("o200k_base"));
    }
}
