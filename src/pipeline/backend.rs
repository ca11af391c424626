//! Translation backends: the one place that talks to a remote model.
//!
//! [`TranslationBackend`] is the seam between the retry logic in
//! [`crate::pipeline::llm`] and the network. Two implementations ship:
//!
//! * [`GeminiBackend`]: the Google Generative Language REST API, called
//!   directly with `reqwest` and keyed by the per-call [`Credentials`].
//! * [`ProviderBackend`]: any `edgequake_llm` provider (OpenAI, Anthropic,
//!   Ollama, …). These read their keys from the environment, so the
//!   credentials argument is ignored.
//!
//! Tests substitute their own implementation through
//! [`crate::config::TranslationConfigBuilder::backend_override`].
//!
//! Every backend failure is reported as [`FragmentError::Transient`]; the
//! client decides whether to retry.

use crate::config::{BackendKind, Credentials, TranslationConfig};
use crate::error::{FragmentError, TranslateError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Public endpoint of the Generative Language API.
pub const GEMINI_DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// One call to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Instruction prompt with the fragment appended.
    pub prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: usize,
}

impl GenerationRequest {
    pub fn new(prompt: String, config: &TranslationConfig) -> Self {
        Self {
            prompt,
            temperature: config.temperature,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Sends a single prompt to a model and returns its raw text.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Short name for logs, e.g. `"gemini/gemini-2.0-flash"`.
    fn name(&self) -> &str;

    /// Whether the per-call [`Credentials`] are used. Backends that read
    /// their keys from the environment return `false`, which lifts the
    /// blank-credentials check.
    fn requires_credentials(&self) -> bool {
        true
    }

    /// Generate a completion for `request`.
    async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &Credentials,
    ) -> Result<String, FragmentError>;
}

// ── Gemini REST ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<PartOut<'a>>,
}

#[derive(Debug, Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Debug, Deserialize)]
struct PartIn {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Direct client for `models/{model}:generateContent`.
pub struct GeminiBackend {
    client: Client,
    endpoint: String,
    model: String,
    label: String,
}

impl GeminiBackend {
    pub fn new(
        model: impl Into<String>,
        endpoint: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, TranslateError> {
        let model = model.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TranslateError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint
                .unwrap_or(GEMINI_DEFAULT_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            label: format!("gemini/{model}"),
            model,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

#[async_trait]
impl TranslationBackend for GeminiBackend {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &Credentials,
    ) -> Result<String, FragmentError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![PartOut {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
                max_output_tokens: request.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", credentials.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FragmentError::transient("request timed out")
                } else {
                    FragmentError::transient(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FragmentError::transient(format!(
                "HTTP {}: {}",
                status.as_u16(),
                api_error_message(&text)
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| FragmentError::transient(format!("malformed response: {e}")))?;
        extract_text(parsed)
    }
}

/// Pull `error.message` out of a Google error body, or fall back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(300).collect())
}

fn extract_text(response: GenerateContentResponse) -> Result<String, FragmentError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(FragmentError::transient(format!("prompt blocked: {reason}")));
    }
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| FragmentError::transient("response has no candidates"))?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
        return Err(FragmentError::transient(format!(
            "empty candidate (finish reason: {reason})"
        )));
    }
    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason != "STOP" {
            debug!("Gemini finished with reason {reason}");
        }
    }
    Ok(text)
}

// ── edgequake-llm providers ──────────────────────────────────────────────

/// Adapter from an `edgequake_llm` provider to [`TranslationBackend`].
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }
}

#[async_trait]
impl TranslationBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.label
    }

    fn requires_credentials(&self) -> bool {
        false
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        _credentials: &Credentials,
    ) -> Result<String, FragmentError> {
        let messages = vec![ChatMessage::user(request.prompt.as_str())];
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_output_tokens),
            ..Default::default()
        };
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| FragmentError::transient(e.to_string()))?;
        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

// ── Resolution ───────────────────────────────────────────────────────────

/// Pick the backend for a run.
///
/// Resolution order:
/// 1. `backend_override` (tests, custom middleware)
/// 2. [`BackendKind::Gemini`] → [`GeminiBackend`]
/// 3. [`BackendKind::Provider`] named `"auto"` → `ProviderFactory::from_env`
/// 4. any other provider name → `ProviderFactory::create_llm_provider`
pub fn resolve_backend(
    config: &TranslationConfig,
) -> Result<Arc<dyn TranslationBackend>, TranslateError> {
    if let Some(ref backend) = config.backend_override {
        return Ok(Arc::clone(backend));
    }

    match &config.backend {
        BackendKind::Gemini => {
            let backend = GeminiBackend::new(
                config.model.clone(),
                config.endpoint.as_deref(),
                config.api_timeout_secs,
            )?;
            info!("Using backend {}", backend.name());
            Ok(Arc::new(backend))
        }
        BackendKind::Provider { name } if name == "auto" => {
            let (llm, _) =
                ProviderFactory::from_env().map_err(|e| TranslateError::ProviderNotConfigured {
                    backend: "auto".to_string(),
                    hint: format!("No LLM provider auto-detected: {e}"),
                })?;
            info!("Using auto-detected provider");
            Ok(Arc::new(ProviderBackend::new(llm, "auto")))
        }
        BackendKind::Provider { name } => {
            let llm = ProviderFactory::create_llm_provider(name, &config.model).map_err(|e| {
                TranslateError::ProviderNotConfigured {
                    backend: name.clone(),
                    hint: e.to_string(),
                }
            })?;
            let label = format!("{name}/{}", config.model);
            info!("Using backend {label}");
            Ok(Arc::new(ProviderBackend::new(llm, label)))
        }
    }
}
