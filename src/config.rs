//! Configuration types for PDF translation and rendering.
//!
//! Translation behaviour is controlled through [`TranslationConfig`], built via
//! its [`TranslationConfigBuilder`]. Output layout is controlled through
//! [`RenderConfig`]. The two are separate because the renderer is usable on its
//! own (render-only mode) and never needs a model or credentials.
//!
//! Credentials are deliberately *not* part of either config: they are passed
//! per call as [`Credentials`] so a config can be logged, cloned and shared
//! without carrying a secret around.

use crate::error::TranslateError;
use crate::pipeline::backend::TranslationBackend;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for one translation run.
///
/// Built via [`TranslationConfig::builder()`] or using
/// [`TranslationConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_translate::TranslationConfig;
///
/// let config = TranslationConfig::builder()
///     .max_chunk_size(20_000)
///     .target_language("French")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_retries, 2);
/// ```
#[derive(Clone)]
pub struct TranslationConfig {
    /// Maximum fragment size in bytes. Default: 30 000.
    ///
    /// Roughly 2 000 characters per page × 15 pages. Large enough that most
    /// papers go out in one or two requests, small enough that the translated
    /// output of one fragment fits comfortably in the model's output budget.
    pub max_chunk_size: usize,

    /// Retries after the first failed attempt. Default: 2 (three attempts total).
    pub max_retries: u32,

    /// Backoff base in milliseconds. Default: 1 500.
    ///
    /// The wait before retry `n` (1-based) is `retry_backoff_ms × 2ⁿ`:
    /// 3 s before the first retry, 6 s before the second.
    pub retry_backoff_ms: u64,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Translation wants fidelity, not creativity; values near zero keep the
    /// model from paraphrasing.
    pub temperature: f32,

    /// Nucleus sampling cutoff. Default: 0.8.
    pub top_p: f32,

    /// Upper bound on generated tokens per fragment. Default: 8 192.
    pub max_output_tokens: usize,

    /// Model identifier. Default: `gemini-2.0-flash`.
    pub model: String,

    /// Which backend to reach the model through. Default: [`BackendKind::Gemini`].
    pub backend: BackendKind,

    /// Pre-constructed backend. Takes precedence over `backend`.
    pub backend_override: Option<Arc<dyn TranslationBackend>>,

    /// Language of the source document. Default: "English".
    pub source_language: String,

    /// Language to translate into. Default: "Spanish".
    pub target_language: String,

    /// Custom instruction prompt. If None, uses [`crate::prompts::translation_prompt`].
    pub system_prompt: Option<String>,

    /// Per-request timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Base URL for the Gemini REST API. If None, uses the public endpoint.
    pub endpoint: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 30_000,
            max_retries: 2,
            retry_backoff_ms: 1_500,
            temperature: 0.2,
            top_p: 0.8,
            max_output_tokens: 8_192,
            model: "gemini-2.0-flash".to_string(),
            backend: BackendKind::default(),
            backend_override: None,
            source_language: "English".to_string(),
            target_language: "Spanish".to_string(),
            system_prompt: None,
            api_timeout_secs: 120,
            endpoint: None,
            download_timeout_secs: 120,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("max_chunk_size", &self.max_chunk_size)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("model", &self.model)
            .field("backend", &self.backend)
            .field(
                "backend_override",
                &self.backend_override.as_ref().map(|b| b.name().to_string()),
            )
            .field("source_language", &self.source_language)
            .field("target_language", &self.target_language)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("endpoint", &self.endpoint)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl TranslationConfig {
    /// Create a new builder for `TranslationConfig`.
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Wait before retry `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> std::time::Duration {
        let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
        std::time::Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

/// Builder for [`TranslationConfig`].
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl fmt::Debug for TranslationConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl TranslationConfigBuilder {
    pub fn max_chunk_size(mut self, n: usize) -> Self {
        self.config.max_chunk_size = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.min(10);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.config.backend = kind;
        self
    }

    pub fn backend_override(mut self, backend: Arc<dyn TranslationBackend>) -> Self {
        self.config.backend_override = Some(backend);
        self
    }

    pub fn source_language(mut self, lang: impl Into<String>) -> Self {
        self.config.source_language = lang.into();
        self
    }

    pub fn target_language(mut self, lang: impl Into<String>) -> Self {
        self.config.target_language = lang.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = Some(url.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslationConfig, TranslateError> {
        let c = &self.config;
        if c.max_chunk_size == 0 {
            return Err(TranslateError::InvalidConfig(
                "max_chunk_size must be ≥ 1".into(),
            ));
        }
        if c.max_output_tokens == 0 {
            return Err(TranslateError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if c.source_language.trim().is_empty() || c.target_language.trim().is_empty() {
            return Err(TranslateError::InvalidConfig(
                "source and target language must not be blank".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(TranslateError::InvalidConfig("model must not be blank".into()));
        }
        Ok(self.config)
    }
}

// ── Backend selection ────────────────────────────────────────────────────

/// How the translation model is reached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// Google Generative Language REST API, keyed by [`Credentials`]. (default)
    #[default]
    Gemini,
    /// Any provider known to `edgequake_llm::ProviderFactory`
    /// (`"openai"`, `"anthropic"`, `"ollama"`, …), or `"auto"` to pick the
    /// first provider whose API key is present in the environment.
    Provider { name: String },
}

impl BackendKind {
    /// Parse a CLI-style backend name. `"gemini"` selects the REST backend;
    /// anything else is handed to the provider factory.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "gemini" => BackendKind::Gemini,
            other => BackendKind::Provider {
                name: other.to_string(),
            },
        }
    }
}

// ── Credentials ──────────────────────────────────────────────────────────

/// Opaque API key for the translation backend.
///
/// Supplied per call, never stored in a config, never logged.
#[derive(Clone, Default)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blank() {
            f.write_str("Credentials(<blank>)")
        } else {
            f.write_str("Credentials(<redacted>)")
        }
    }
}

impl From<&str> for Credentials {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Credentials {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Fixed page dimensions for one output document, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    /// US Letter with 50 pt margins.
    pub const LETTER: PageGeometry = PageGeometry {
        width: 612.0,
        height: 792.0,
        margin: 50.0,
    };

    /// Validate that the margins leave a positive content area.
    pub fn new(width: f32, height: f32, margin: f32) -> Result<Self, TranslateError> {
        let g = PageGeometry {
            width,
            height,
            margin,
        };
        g.validate()?;
        Ok(g)
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Top of the writable area.
    pub fn top(&self) -> f32 {
        self.height - self.margin
    }

    pub(crate) fn validate(&self) -> Result<(), TranslateError> {
        let finite = self.width.is_finite() && self.height.is_finite() && self.margin.is_finite();
        if !finite || self.margin < 0.0 || self.content_width() <= 0.0 || self.top() <= self.margin {
            return Err(TranslateError::RenderFatal {
                detail: format!(
                    "page {}×{} with margin {} leaves no content area",
                    self.width, self.height, self.margin
                ),
            });
        }
        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::LETTER
    }
}

/// Layout settings for the Markdown → PDF renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub geometry: PageGeometry,
    /// Body text size in points. Default: 11.
    pub font_size: f32,
    /// Line height as a multiple of `font_size`. Default: 1.5.
    pub line_height_factor: f32,
    /// Heading sizes for h1, h2, h3; h4 and deeper use the last entry. Default: 24 / 16 / 14 / 12.
    pub heading_sizes: [f32; 4],
    /// Document title written to the PDF info dictionary.
    pub title: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::LETTER,
            font_size: 11.0,
            line_height_factor: 1.5,
            heading_sizes: [24.0, 16.0, 14.0, 12.0],
            title: None,
        }
    }
}

impl RenderConfig {
    /// Vertical advance of one body line.
    pub fn line_height(&self) -> f32 {
        self.font_size * self.line_height_factor
    }

    /// Font size for a heading level; levels beyond the table use the smallest.
    pub fn heading_size(&self, level: u8) -> f32 {
        let idx = (level.max(1) as usize - 1).min(self.heading_sizes.len() - 1);
        self.heading_sizes[idx]
    }

    pub(crate) fn validate(&self) -> Result<(), TranslateError> {
        self.geometry.validate()?;
        if !(self.font_size > 0.0 && self.line_height_factor > 0.0) {
            return Err(TranslateError::RenderFatal {
                detail: format!(
                    "font size {} / line height {} must be positive",
                    self.font_size, self.line_height_factor
                ),
            });
        }
        if self.line_height() >= self.geometry.top() - self.geometry.margin {
            return Err(TranslateError::RenderFatal {
                detail: "a single line does not fit on the page".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = TranslationConfig::default();
        assert_eq!(c.max_chunk_size, 30_000);
        assert_eq!(c.max_retries, 2);
        assert_eq!(c.max_output_tokens, 8_192);
        assert_eq!(c.backend, BackendKind::Gemini);
    }

    #[test]
    fn backoff_doubles_from_three_seconds() {
        let c = TranslationConfig::default();
        assert_eq!(c.backoff_for(1).as_millis(), 3_000);
        assert_eq!(c.backoff_for(2).as_millis(), 6_000);
    }

    #[test]
    fn build_rejects_zero_chunk_size() {
        let err = TranslationConfig::builder().max_chunk_size(0).build();
        assert!(matches!(err, Err(TranslateError::InvalidConfig(_))));
    }

    #[test]
    fn build_rejects_blank_language() {
        let err = TranslationConfig::builder().target_language("  ").build();
        assert!(matches!(err, Err(TranslateError::InvalidConfig(_))));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = TranslationConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn backend_kind_from_name() {
        assert_eq!(BackendKind::from_name("Gemini"), BackendKind::Gemini);
        assert_eq!(
            BackendKind::from_name("openai"),
            BackendKind::Provider {
                name: "openai".into()
            }
        );
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let c = Credentials::new("AIzaSecret");
        assert_eq!(format!("{c:?}"), "Credentials(<redacted>)");
        assert!(Credentials::new("   ").is_blank());
    }

    #[test]
    fn letter_content_width() {
        assert_eq!(PageGeometry::LETTER.content_width(), 512.0);
        assert_eq!(PageGeometry::LETTER.top(), 742.0);
    }

    #[test]
    fn geometry_without_content_area_is_fatal() {
        let err = PageGeometry::new(100.0, 100.0, 60.0);
        assert!(matches!(err, Err(TranslateError::RenderFatal { .. })));
    }

    #[test]
    fn heading_sizes_clamp_deep_levels() {
        let r = RenderConfig::default();
        assert_eq!(r.heading_size(1), 24.0);
        assert_eq!(r.heading_size(3), 14.0);
        assert_eq!(r.heading_size(6), 12.0);
    }
}
