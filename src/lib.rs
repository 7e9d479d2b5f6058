//! # edgequake-paperscan
//!
//! Ask Vision Language Models questions about academic papers, page by page.
//!
//! Each page of a PDF is rasterised and shown to a VLM, which reads figures,
//! tables and reference markers as a human would. Four tasks are built on
//! the same pipeline:
//!
//! | Task | Question |
//! |------|----------|
//! | [`tasks::outperform`] | Does this page claim the method beats GPT-4o? |
//! | [`tasks::citations`]  | Which references exist, and where are they cited? |
//! | [`tasks::summarize`]  | What does this page say? |
//! | [`tasks::tokens`]     | How many characters and tokens is the text layer? (no VLM) |
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch   download once into the cache dir (`_cache/<name>.pdf`)
//!  ├─ 2. Render  rasterise pages via pdfium (spawn_blocking)
//!  ├─ 3. Skip    honour existing artifacts when asked to
//!  ├─ 4. VLM     one call per page (or per document in single-shot mode)
//!  ├─ 5. Parse   JSON → typed record, or keep the raw text
//!  └─ 6. Store   one artifact per page / document, plus aggregates
//! ```
//!
//! Everything runs sequentially: URLs in order, pages in order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_paperscan::{tasks, RunConfig, VisionTasks};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = RunConfig::builder()
//!         .output_dir("out/gpt4o")
//!         .skip_existing(true)
//!         .build()?;
//!     let vision = VisionTasks::from_config(&config)?;
//!     let urls = vec!["https://arxiv.org/pdf/2406.12345".to_string()];
//!     for page in tasks::outperform::run(&vision, &urls).await? {
//!         println!("{} p{}: {:?}", page.pdf, page.page_index, page.verdict);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `paperscan` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod tasks;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RunConfig, RunConfigBuilder};
pub use error::PaperScanError;
pub use output::{
    Citation, CitationReport, DocumentCitations, GroupedRow, ModelOutput, PageCitations,
    PageTokenRecord, PageVerdict, Reference, SummaryOutcome, SuperiorityVerdict, TokenReport,
};
pub use pipeline::fetch::{resolve_path, FetchCache, FetchOutcome};
pub use pipeline::llm::{LlmVisionClient, VisionClient, VisionRequest};
pub use pipeline::render::{PageRenderer, PdfiumEngine, TextExtractor};
pub use pipeline::store::{should_skip, ResultStore};
pub use pipeline::tokenize::{TiktokenCounter, TokenCounter, TokenEncoding};
pub use progress::{NoopProgressCallback, ProgressCallback, TaskProgressCallback};
pub use tasks::citations::CitationMode;
pub use tasks::tokens::TokenTasks;
pub use tasks::VisionTasks;
