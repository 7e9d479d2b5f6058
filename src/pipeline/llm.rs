//! Vision-model client: one request in, one text answer out.
//!
//! The tasks talk to the model through the [`VisionClient`] trait and build
//! plain [`VisionRequest`] values, so tests can record exactly what would
//! have been sent. [`LlmVisionClient`] is the production implementation on
//! top of an `edgequake-llm` provider.
//!
//! Calls are made once. A provider error is fatal for the run; there is no
//! retry or backoff.

use crate::config::RunConfig;
use crate::error::PaperScanError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Response format value that asks the provider for a strict JSON object.
pub const JSON_OBJECT_FORMAT: &str = "json_object";

/// A single vision call: a system instruction followed by one user turn
/// carrying zero or more page images.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub system_prompt: String,
    pub images: Vec<ImageData>,
    /// Constrain the answer to a JSON object.
    pub json_object: bool,
}

impl VisionRequest {
    pub fn new(system_prompt: impl Into<String>, images: Vec<ImageData>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            images,
            json_object: false,
        }
    }

    pub fn json_object(mut self) -> Self {
        self.json_object = true;
        self
    }

    /// Role-tagged messages in the order the API receives them.
    ///
    /// The user turn has empty text: the images carry all the content.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user_with_images("", self.images.clone()),
        ]
    }
}

/// Stateless request/response wrapper around a multimodal chat model.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn complete(&self, request: &VisionRequest) -> Result<String, PaperScanError>;
}

/// [`VisionClient`] backed by an `edgequake-llm` provider.
pub struct LlmVisionClient {
    provider: Arc<dyn LLMProvider>,
    temperature: Option<f32>,
    max_tokens: usize,
}

impl LlmVisionClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &RunConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Resolve the provider from `config` and wrap it.
    pub fn from_config(config: &RunConfig) -> Result<Self, PaperScanError> {
        Ok(Self::new(resolve_provider(config)?, config))
    }
}

#[async_trait]
impl VisionClient for LlmVisionClient {
    async fn complete(&self, request: &VisionRequest) -> Result<String, PaperScanError> {
        let start = Instant::now();
        let messages = request.to_messages();
        let options = build_options(self.temperature, self.max_tokens, request.json_object);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| PaperScanError::LlmApiError {
                message: e.to_string(),
            })?;

        debug!(
            "{} image(s): {} input tokens, {} output tokens, {:?}",
            request.images.len(),
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(response.content)
    }
}

fn build_options(temperature: Option<f32>, max_tokens: usize, json_object: bool) -> CompletionOptions {
    CompletionOptions {
        temperature,
        max_tokens: Some(max_tokens),
        response_format: json_object.then(|| JSON_OBJECT_FORMAT.to_string()),
        ..Default::default()
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, PaperScanError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PaperScanError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model`.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set, with `config.model`.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &RunConfig) -> Result<Arc<dyn LLMProvider>, PaperScanError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, &config.model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", &config.model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PaperScanError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_mode_sets_response_format() {
        let opts = build_options(None, 4096, true);
        assert_eq!(opts.response_format.as_deref(), Some(JSON_OBJECT_FORMAT));
        assert_eq!(opts.max_tokens, Some(4096));
        assert_eq!(opts.temperature, None);
    }

    #[test]
    fn free_text_has_no_response_format() {
        let opts = build_options(Some(0.2), 512, false);
        assert!(opts.response_format.is_none());
        assert_eq!(opts.temperature, Some(0.2));
    }

    #[test]
    fn request_builds_system_then_user() {
        let req = VisionRequest::new("Summarize and explain this page.", vec![]).json_object();
        assert!(req.json_object);
        assert_eq!(req.to_messages().len(), 2);
    }
}
