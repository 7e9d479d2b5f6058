//! Page-result store: where artifacts go and whether to regenerate them.
//!
//! Resumability is file existence and nothing else. Writes go through a
//! temp file in the target directory followed by a rename, so an interrupted
//! run leaves either the previous file or no file, never a truncated one.

use crate::error::PaperScanError;
use crate::pipeline::fetch::write_atomically;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// `true` only when skipping is enabled and `output_path` already exists.
pub fn should_skip(output_path: &Path, skip_enabled: bool) -> bool {
    skip_enabled && output_path.exists()
}

/// Output directory plus the skip policy that applies to it.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
    skip_existing: bool,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>, skip_existing: bool) -> Self {
        Self {
            root: root.into(),
            skip_existing,
        }
    }

    /// `<root>/<pdf_name>_<page>.json`, `page` being 1-based.
    pub fn page_path(&self, pdf_name: &str, page: usize) -> PathBuf {
        self.root.join(format!("{pdf_name}_{page}.json"))
    }

    /// `<root>/<pdf_name>.json`
    pub fn document_path(&self, pdf_name: &str) -> PathBuf {
        self.root.join(format!("{pdf_name}.json"))
    }

    /// `<root>/results.json`
    pub fn results_path(&self) -> PathBuf {
        self.root.join("results.json")
    }

    pub fn should_skip(&self, output_path: &Path) -> bool {
        should_skip(output_path, self.skip_existing)
    }

    /// Replace `path` with `text`, creating directories as needed.
    pub fn write_text(&self, path: &Path, text: &str) -> Result<(), PaperScanError> {
        write_atomically(path, text.as_bytes())?;
        info!("Saved to {}", path.display());
        Ok(())
    }

    /// Replace `path` with compact JSON.
    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), PaperScanError> {
        let json = serde_json::to_string(value).map_err(|e| PaperScanError::SerialiseFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        self.write_text(path, &json)
    }

    /// Replace `path` with two-space indented JSON.
    pub fn write_json_pretty<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), PaperScanError> {
        let json =
            serde_json::to_string_pretty(value).map_err(|e| PaperScanError::SerialiseFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        self.write_text(path, &json)
    }

    /// Read an artifact written by an earlier run.
    pub fn read_existing<T: DeserializeOwned>(&self, path: &Path) -> Result<T, PaperScanError> {
        let text = std::fs::read_to_string(path).map_err(|e| PaperScanError::OutputReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| PaperScanError::OutputReadFailed {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_requires_flag_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("a.pdf_1.json");
        std::fs::write(&existing, "{}").unwrap();
        let missing = dir.path().join("a.pdf_2.json");

        assert!(should_skip(&existing, true));
        assert!(!should_skip(&existing, false));
        assert!(!should_skip(&missing, true));
        assert!(!should_skip(&missing, false));
    }

    #[test]
    fn artifact_names() {
        let store = ResultStore::new("out", false);
        assert_eq!(store.page_path("paper.pdf", 3), Path::new("out/paper.pdf_3.json"));
        assert_eq!(store.document_path("paper.pdf"), Path::new("out/paper.pdf.json"));
        assert_eq!(store.results_path(), Path::new("out/results.json"));
    }

    #[test]
    fn write_overwrites_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("nested/out"), true);
        let path = store.page_path("p.pdf", 1);

        store.write_text(&path, "first").unwrap();
        store.write_text(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(store.should_skip(&path));
    }

    #[test]
    fn pretty_json_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), false);
        let path = store.document_path("p.pdf");
        store
            .write_json_pretty(&path, &vec!["page one", "page two"])
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"page one\""), "got: {text}");
        let back: Vec<String> = store.read_existing(&path).unwrap();
        assert_eq!(back, vec!["page one", "page two"]);
    }

    #[test]
    fn read_existing_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), true);
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ truncated").unwrap();
        let err = store.read_existing::<serde_json::Value>(&path).unwrap_err();
        assert!(matches!(err, PaperScanError::OutputReadFailed { .. }));
    }
}
