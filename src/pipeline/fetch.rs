//! Fetch cache: map a PDF URL to a stable local path and download it once.
//!
//! The cache is keyed purely by the URL's last path segment. Presence of the
//! file is the only freshness check: no ETag, no size, no checksum. Deleting
//! the file is the way to force a re-download.

use crate::error::PaperScanError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Derive the cache path for `url` under `cache_root`.
///
/// Pure: the same inputs always give the same path. The file name is the
/// last non-empty path segment of the URL, with `.pdf` appended unless it
/// already has exactly that extension.
///
/// ```rust
/// use edgequake_paperscan::pipeline::fetch::resolve_path;
/// use std::path::Path;
///
/// let p = resolve_path("https://arxiv.org/pdf/1706.03762", Path::new("_cache"));
/// assert_eq!(p, Path::new("_cache/1706.03762.pdf"));
/// ```
pub fn resolve_path(url: &str, cache_root: &Path) -> PathBuf {
    with_pdf_suffix(cache_root.join(url_basename(url)))
}

fn url_basename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(segments) = parsed.path_segments() {
            if let Some(last) = segments.filter(|s| !s.is_empty()).next_back() {
                return last.to_string();
            }
        }
        if let Some(host) = parsed.host_str() {
            return host.to_string();
        }
    }
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .to_string()
}

fn with_pdf_suffix(path: PathBuf) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "pdf") {
        return path;
    }
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".pdf");
    path.with_file_name(name)
}

/// What [`FetchCache::ensure_present`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The file was already on disk; no network call was made.
    Cached,
    /// The file was downloaded and written.
    Downloaded { bytes: usize },
}

/// Download-or-reuse cache for source PDFs.
///
/// Not safe to share between concurrent callers targeting the same path;
/// the tasks in this crate never do.
#[derive(Debug, Clone)]
pub struct FetchCache {
    root: PathBuf,
    http: reqwest::Client,
}

impl FetchCache {
    /// Build a cache rooted at `root` whose downloads time out after `timeout_secs`.
    pub fn new(root: impl Into<PathBuf>, timeout_secs: u64) -> Result<Self, PaperScanError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PaperScanError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            root: root.into(),
            http,
        })
    }

    /// Cache path for `url`. See [`resolve_path`].
    pub fn resolve_path(&self, url: &str) -> PathBuf {
        resolve_path(url, &self.root)
    }

    /// Resolve the cache path for `url` and make sure the PDF is there.
    pub async fn fetch(&self, url: &str) -> Result<PathBuf, PaperScanError> {
        let path = self.resolve_path(url);
        self.ensure_present(url, &path).await?;
        Ok(path)
    }

    /// Download `url` to `path` unless `path` already exists.
    ///
    /// An existing file is trusted as-is. A non-success HTTP status is
    /// returned as [`PaperScanError::FetchFailed`] and nothing is written.
    pub async fn ensure_present(
        &self,
        url: &str,
        path: &Path,
    ) -> Result<FetchOutcome, PaperScanError> {
        if path.exists() {
            info!("Already downloaded {} to {}", url, path.display());
            return Ok(FetchOutcome::Cached);
        }

        info!("Downloading {} to {}", url, path.display());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PaperScanError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaperScanError::FetchFailed {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PaperScanError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !bytes.starts_with(b"%PDF") {
            warn!(
                "{} does not start with %PDF; caching it anyway ({} bytes)",
                url,
                bytes.len()
            );
        }

        write_atomically(path, &bytes)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        info!("Downloaded {} to {}", url, path.display());

        Ok(FetchOutcome::Downloaded { bytes: bytes.len() })
    }
}

/// Create parent directories, write to a sibling temp file, then rename.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), PaperScanError> {
    use std::io::Write;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| PaperScanError::write_failed(path, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| PaperScanError::write_failed(path, e))?;
    tmp.write_all(contents)
        .map_err(|e| PaperScanError::write_failed(path, e))?;
    tmp.persist(path)
        .map_err(|e| PaperScanError::write_failed(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_suffix_is_not_duplicated() {
        let root = Path::new("_cache");
        assert_eq!(
            resolve_path("https://x/y/paper.pdf", root),
            root.join("paper.pdf")
        );
        assert_eq!(resolve_path("https://x/y/paper", root), root.join("paper.pdf"));
    }

    #[test]
    fn resolve_path_is_deterministic() {
        let root = Path::new("/tmp/cache");
        let url = "https://arxiv.org/pdf/2405.12345v2";
        assert_eq!(resolve_path(url, root), resolve_path(url, root));
        assert_eq!(resolve_path(url, root), root.join("2405.12345v2.pdf"));
    }

    #[test]
    fn dotted_basename_gets_suffix() {
        // arXiv ids look like extensions; only a literal `.pdf` counts.
        let p = resolve_path("https://arxiv.org/pdf/1706.03762", Path::new("c"));
        assert_eq!(p, Path::new("c/1706.03762.pdf"));
    }

    #[test]
    fn query_and_trailing_slash_are_ignored() {
        let root = Path::new("c");
        assert_eq!(
            resolve_path("https://example.org/files/report.pdf?download=1", root),
            root.join("report.pdf")
        );
        assert_eq!(
            resolve_path("https://example.org/files/report/", root),
            root.join("report.pdf")
        );
    }

    #[test]
    fn unparseable_url_uses_last_segment() {
        assert_eq!(
            resolve_path("papers/local-copy", Path::new("c")),
            Path::new("c/local-copy.pdf")
        );
    }

    #[test]
    fn uppercase_extension_is_not_pdf() {
        assert_eq!(
            resolve_path("https://x/PAPER.PDF", Path::new("c")),
            Path::new("c/PAPER.PDF.pdf")
        );
    }

    #[test]
    fn write_atomically_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/c.pdf");
        write_atomically(&target, b"%PDF-1.7").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"%PDF-1.7");
    }
}
