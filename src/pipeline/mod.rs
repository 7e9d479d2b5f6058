//! Pipeline stages shared by the analysis tasks.
//!
//! Each submodule implements one step; the tasks in [`crate::tasks`]
//! compose them.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ render ──▶ encode ──▶ llm ──▶ parse ──▶ store
//! (cache)   (pdfium)   (base64)   (VLM)   (JSON)    (artifacts)
//!    └────▶ render::TextExtractor ──▶ tokenize ──────▶ (csv / jsonl)
//! ```
//!
//! 1. [`fetch`]   : URL → cached PDF path, downloading at most once
//! 2. [`render`]  : rasterise pages or extract their text; pdfium runs in
//!    `spawn_blocking`
//! 3. [`encode`]  : PNG-encode and base64-wrap each page image
//! 4. [`llm`]     : one vision call per request; the only stage talking to
//!    the model
//! 5. [`parse`]   : JSON answer → typed value, or the raw text
//! 6. [`store`]   : artifact paths, skip-on-exists, writes
//! 7. [`tokenize`]: token counts under the two OpenAI encodings

pub mod encode;
pub mod fetch;
pub mod llm;
pub mod parse;
pub mod render;
pub mod store;
pub mod tokenize;
