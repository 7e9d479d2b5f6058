//! Token and character accounting, for estimating what the vision tasks
//! would cost on the text layer alone.
//!
//! No rendering and no model calls: each page's text is extracted and
//! counted. Three files are written, each replaced on every run:
//!
//! * `detail.jsonl`: one [`PageTokenRecord`] per line, all documents
//! * `detail.csv`  : the same records without the text
//! * `grouped.csv` : per-document `page_count` / sums / means, then `TOTAL`

use super::pdf_file_name;
use crate::config::RunConfig;
use crate::error::PaperScanError;
use crate::output::{GroupedRow, PageTokenRecord, PageTokenRow, TokenReport};
use crate::pipeline::fetch::{write_atomically, FetchCache};
use crate::pipeline::render::{PdfiumEngine, TextExtractor};
use crate::pipeline::tokenize::{non_empty_chars, TiktokenCounter, TokenCounter, TokenEncoding};
use crate::progress::ProgressCallback;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the synthetic row aggregating every document.
pub const TOTAL_ROW: &str = "TOTAL";

/// Collaborators for the token-accounting task.
pub struct TokenTasks {
    cache: FetchCache,
    extractor: Arc<dyn TextExtractor>,
    counter: Arc<dyn TokenCounter>,
    output_dir: PathBuf,
    progress: Option<ProgressCallback>,
}

impl TokenTasks {
    pub fn new(
        config: &RunConfig,
        extractor: Arc<dyn TextExtractor>,
        counter: Arc<dyn TokenCounter>,
    ) -> Result<Self, PaperScanError> {
        Ok(Self {
            cache: FetchCache::new(&config.cache_dir, config.download_timeout_secs)?,
            extractor,
            counter,
            output_dir: config.output_dir.clone(),
            progress: config.progress_callback.clone(),
        })
    }

    /// Production wiring: pdfium text extraction and tiktoken counting.
    pub fn from_config(config: &RunConfig) -> Result<Self, PaperScanError> {
        let extractor = Arc::new(PdfiumEngine::new(
            config.max_rendered_pixels,
            config.pdfium_library.clone(),
        ));
        Self::new(config, extractor, Arc::new(TiktokenCounter::new()?))
    }

    /// Count every page of every URL and write the three artifacts.
    pub async fn run(&self, urls: &[String]) -> Result<TokenReport, PaperScanError> {
        let mut details = Vec::new();
        for url in urls {
            info!("Processing {}", url);
            details.extend(self.count_url(url).await?);
        }

        let grouped = group_by_document(&details);
        self.write_artifacts(&details, &grouped)?;
        Ok(TokenReport { details, grouped })
    }

    /// Per-page records for one URL.
    pub async fn count_url(&self, url: &str) -> Result<Vec<PageTokenRecord>, PaperScanError> {
        let pdf_path = self.cache.fetch(url).await?;
        let pdf = pdf_file_name(&pdf_path);
        let texts = self.extractor.extract_pages(&pdf_path).await?;
        let total = texts.len();
        if let Some(ref cb) = self.progress {
            cb.on_document_start(url, total);
        }

        let records: Vec<PageTokenRecord> = texts
            .into_iter()
            .enumerate()
            .map(|(idx, text)| {
                let record = page_record(self.counter.as_ref(), &pdf, idx + 1, text);
                if let Some(ref cb) = self.progress {
                    cb.on_page_complete(idx + 1, total);
                }
                record
            })
            .collect();

        if let Some(ref cb) = self.progress {
            cb.on_document_complete(url);
        }
        Ok(records)
    }

    fn write_artifacts(
        &self,
        details: &[PageTokenRecord],
        grouped: &[GroupedRow],
    ) -> Result<(), PaperScanError> {
        let jsonl_path = self.output_dir.join("detail.jsonl");
        let mut jsonl = String::new();
        for record in details {
            let line =
                serde_json::to_string(record).map_err(|e| PaperScanError::SerialiseFailed {
                    path: jsonl_path.clone(),
                    detail: e.to_string(),
                })?;
            jsonl.push_str(&line);
            jsonl.push('\n');
        }
        write_atomically(&jsonl_path, jsonl.as_bytes())?;
        info!("Saved to {}", jsonl_path.display());

        let detail_path = self.output_dir.join("detail.csv");
        let rows: Vec<PageTokenRow> = details.iter().map(PageTokenRow::from).collect();
        write_csv(&detail_path, &rows)?;
        info!("Saved to {}", detail_path.display());

        let grouped_path = self.output_dir.join("grouped.csv");
        write_csv(&grouped_path, grouped)?;
        info!("Saved to {}", grouped_path.display());
        Ok(())
    }
}

/// Build the record for one page.
pub fn page_record(
    counter: &dyn TokenCounter,
    pdf: &str,
    page: usize,
    text: String,
) -> PageTokenRecord {
    let record = PageTokenRecord {
        pdf: pdf.to_string(),
        page,
        length: text.chars().count(),
        non_empty_chars: non_empty_chars(&text),
        o200k_base: counter.count(TokenEncoding::O200kBase, &text),
        cl100k_base: counter.count(TokenEncoding::Cl100kBase, &text),
        text,
    };
    debug!(
        "{} page {}: {} chars, {} / {} tokens",
        pdf, page, record.length, record.o200k_base, record.cl100k_base
    );
    record
}

#[derive(Debug, Default)]
struct Totals {
    pages: usize,
    max_page: usize,
    length: u64,
    non_empty_chars: u64,
    o200k_base: u64,
    cl100k_base: u64,
}

impl Totals {
    fn add(&mut self, r: &PageTokenRecord) {
        self.pages += 1;
        self.max_page = self.max_page.max(r.page);
        self.length += r.length as u64;
        self.non_empty_chars += r.non_empty_chars as u64;
        self.o200k_base += r.o200k_base as u64;
        self.cl100k_base += r.cl100k_base as u64;
    }

    fn mean(&self, sum: u64) -> f64 {
        if self.pages == 0 {
            0.0
        } else {
            sum as f64 / self.pages as f64
        }
    }

    fn into_row(self, pdf: String, page_count: usize) -> GroupedRow {
        GroupedRow {
            pdf,
            page_count,
            length_sum: self.length,
            length_mean: self.mean(self.length),
            non_empty_chars_sum: self.non_empty_chars,
            non_empty_chars_mean: self.mean(self.non_empty_chars),
            o200k_base_sum: self.o200k_base,
            o200k_base_mean: self.mean(self.o200k_base),
            cl100k_base_sum: self.cl100k_base,
            cl100k_base_mean: self.mean(self.cl100k_base),
        }
    }
}

/// Group page records by document, in first-seen order, then append the
/// `TOTAL` row computed over every page.
///
/// A document's `page_count` is its highest page index; the `TOTAL` row's is
/// the number of pages across all documents.
pub fn group_by_document(records: &[PageTokenRecord]) -> Vec<GroupedRow> {
    let mut groups: Vec<(String, Totals)> = Vec::new();
    let mut total = Totals::default();

    for record in records {
        total.add(record);
        match groups.iter_mut().find(|(pdf, _)| *pdf == record.pdf) {
            Some((_, totals)) => totals.add(record),
            None => {
                let mut totals = Totals::default();
                totals.add(record);
                groups.push((record.pdf.clone(), totals));
            }
        }
    }

    let mut rows: Vec<GroupedRow> = groups
        .into_iter()
        .map(|(pdf, totals)| {
            let page_count = totals.max_page;
            totals.into_row(pdf, page_count)
        })
        .collect();
    let page_count = total.pages;
    rows.push(total.into_row(TOTAL_ROW.to_string(), page_count));
    rows
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), PaperScanError> {
    let serialise_failed = |detail: String| PaperScanError::SerialiseFailed {
        path: path.to_path_buf(),
        detail,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| serialise_failed(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| serialise_failed(e.to_string()))?;
    write_atomically(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pdf: &str, page: usize, length: usize) -> PageTokenRecord {
        PageTokenRecord {
            pdf: pdf.to_string(),
            page,
            text: "x".repeat(length),
            length,
            non_empty_chars: length,
            o200k_base: length / 2,
            cl100k_base: length / 2,
        }
    }

    #[test]
    fn groups_documents_and_appends_total() {
        let rows = group_by_document(&[record("A", 1, 10), record("A", 2, 20), record("B", 1, 30)]);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].pdf, "A");
        assert_eq!(rows[0].page_count, 2);
        assert_eq!(rows[0].length_sum, 30);
        assert_eq!(rows[0].length_mean, 15.0);

        assert_eq!(rows[1].pdf, "B");
        assert_eq!(rows[1].page_count, 1);
        assert_eq!(rows[1].length_sum, 30);
        assert_eq!(rows[1].length_mean, 30.0);

        assert_eq!(rows[2].pdf, TOTAL_ROW);
        assert_eq!(rows[2].page_count, 3);
        assert_eq!(rows[2].length_sum, 60);
        assert_eq!(rows[2].length_mean, 20.0);
        assert_eq!(rows[2].o200k_base_sum, 5 + 10 + 15);
    }

    #[test]
    fn page_count_is_max_index_not_row_count() {
        // Only pages 1 and 3 present: page_count reports 3.
        let rows = group_by_document(&[record("A", 1, 4), record("A", 3, 8)]);
        assert_eq!(rows[0].page_count, 3);
        assert_eq!(rows[0].length_mean, 6.0);
        assert_eq!(rows[1].page_count, 2);
    }

    #[test]
    fn empty_input_yields_zero_total() {
        let rows = group_by_document(&[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pdf, TOTAL_ROW);
        assert_eq!(rows[0].page_count, 0);
        assert_eq!(rows[0].length_mean, 0.0);
    }

    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, encoding: TokenEncoding, text: &str) -> usize {
            let words = text.split_whitespace().count();
            match encoding {
                TokenEncoding::O200kBase => words,
                TokenEncoding::Cl100kBase => words * 2,
            }
        }
    }

    #[test]
    fn page_record_counts_chars_and_tokens() {
        let r = page_record(&WordCounter, "p.pdf", 2, "héllo wörld\n".to_string());
        assert_eq!(r.length, 12);
        assert_eq!(r.non_empty_chars, 10);
        assert_eq!(r.o200k_base, 2);
        assert_eq!(r.cl100k_base, 4);
        assert_eq!(r.page, 2);
    }

    #[test]
    fn csv_headers_use_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grouped.csv");
        write_csv(&path, &group_by_document(&[record("A", 1, 10)])).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("pdf,page_count,length(sum),length(mean)"), "got: {header}");
        assert!(header.contains("\"cl100k_base(gpt-4,gpt-3.5)(sum)\""), "got: {header}");
    }
}
