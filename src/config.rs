//! Configuration shared by the analysis tasks.
//!
//! Everything a run needs to know lives in [`RunConfig`], built via its
//! [`RunConfigBuilder`]. The same config drives every task; the token task
//! simply ignores the model-related fields.

use crate::error::PaperScanError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when none is configured. Prompts name GPT-4o as the baseline,
/// and the original experiments ran against it.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Directory for downloaded PDFs when none is configured.
pub const DEFAULT_CACHE_DIR: &str = "_cache";

/// Configuration for one task run.
///
/// # Example
/// ```rust
/// use edgequake_paperscan::RunConfig;
///
/// let config = RunConfig::builder()
///     .output_dir("out/citations")
///     .skip_existing(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gpt-4o");
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Where artifacts are written. Required.
    pub output_dir: PathBuf,

    /// Where downloaded PDFs are cached. Default: `_cache`.
    pub cache_dir: PathBuf,

    /// Honour existing artifacts instead of regenerating them. Default: false.
    ///
    /// Existence is the only completion marker: a present file is trusted
    /// whatever its contents.
    pub skip_existing: bool,

    /// LLM model identifier. Default: `gpt-4o`.
    pub model: String,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. `None` leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate per call. Default: 4096.
    pub max_tokens: usize,

    /// Longest edge of a rendered page in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Explicit pdfium shared library. `None` binds the system library.
    pub pdfium_library: Option<PathBuf>,

    /// HTTP timeout for PDF downloads, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            skip_existing: false,
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            provider: None,
            temperature: None,
            max_tokens: 4096,
            max_rendered_pixels: 2000,
            pdfium_library: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("output_dir", &self.output_dir)
            .field("cache_dir", &self.cache_dir)
            .field("skip_existing", &self.skip_existing)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("pdfium_library", &self.pdfium_library)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    pub fn skip_existing(mut self, v: bool) -> Self {
        self.config.skip_existing = v;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, PaperScanError> {
        let c = &self.config;
        if c.output_dir.as_os_str().is_empty() {
            return Err(PaperScanError::InvalidConfig(
                "output directory is required".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(PaperScanError::InvalidConfig("model must not be empty".into()));
        }
        if c.download_timeout_secs == 0 {
            return Err(PaperScanError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
