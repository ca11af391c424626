//! Translation client: one fragment in, cleaned Markdown out.
//!
//! [`translate_fragment`] makes a single attempt: build the prompt, call the
//! backend, validate, clean. [`translate_fragment_with_retry`] wraps it in an
//! explicit state machine:
//!
//! ```text
//!            ┌──────────────── wait elapsed ────────────────┐
//!            ▼                                              │
//!      Attempting ──ok──▶ Success                           │
//!            │                                              │
//!            └─err─▶ (retries left?) ──yes──▶ Backoff ──────┘
//!                           │
//!                           no
//!                           ▼
//!                       Exhausted
//! ```
//!
//! The wait before retry `n` (1-based) is `retry_backoff_ms × 2ⁿ`, so the
//! defaults give 3 s then 6 s. Validation rejections are retried exactly like
//! transport errors: a truncated answer is as useless as no answer.

use crate::config::{Credentials, TranslationConfig};
use crate::error::{FragmentError, TranslateError};
use crate::output::Fragment;
use crate::pipeline::backend::{GenerationRequest, TranslationBackend};
use crate::pipeline::postprocess::clean_translation;
use crate::prompts::translation_prompt;
use std::time::Duration;
use tracing::{debug, error, warn};

/// A response shorter than this fraction of the source is rejected.
pub const MIN_RESPONSE_RATIO: f64 = 0.1;

/// Successful result of [`translate_fragment_with_retry`].
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentTranslation {
    pub text: String,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Retry loop state. `Success` and `Exhausted` are terminal.
#[derive(Debug)]
enum RetryState {
    Attempting { attempt: u32 },
    Backoff { retry: u32, wait: Duration, error: FragmentError },
    Success { text: String, attempts: u32 },
    Exhausted { attempts: u32, error: FragmentError },
}

/// Reject empty responses and responses implausibly short for the input.
///
/// Lengths are compared in characters so a translation into a script with
/// wider UTF-8 encoding is not penalised.
pub fn validate_response(source: &str, response: &str) -> Result<(), FragmentError> {
    let received = response.trim().chars().count();
    let source_len = source.chars().count();
    let expected_min = (source_len as f64 * MIN_RESPONSE_RATIO).ceil() as usize;
    if received == 0 || received < expected_min {
        return Err(FragmentError::ValidationRejected {
            received,
            expected_min: expected_min.max(1),
        });
    }
    Ok(())
}

/// One attempt at translating `source`.
pub async fn translate_fragment(
    backend: &dyn TranslationBackend,
    source: &str,
    credentials: &Credentials,
    config: &TranslationConfig,
) -> Result<String, FragmentError> {
    let prompt = translation_prompt(
        config.system_prompt.as_deref(),
        &config.source_language,
        &config.target_language,
        source,
    );
    let request = GenerationRequest::new(prompt, config);
    let raw = backend.generate(&request, credentials).await?;
    validate_response(source, &raw)?;
    Ok(clean_translation(&raw))
}

/// Translate one fragment, retrying failed attempts with exponential backoff.
///
/// Makes at most `config.max_retries + 1` attempts. Exhaustion is returned
/// as [`TranslateError::FragmentExhausted`] carrying the fragment's 1-based
/// position and the last attempt's error.
pub async fn translate_fragment_with_retry(
    backend: &dyn TranslationBackend,
    fragment: &Fragment,
    total: usize,
    credentials: &Credentials,
    config: &TranslationConfig,
) -> Result<FragmentTranslation, TranslateError> {
    let position = fragment.position();
    let mut state = RetryState::Attempting { attempt: 1 };

    loop {
        state = match state {
            RetryState::Attempting { attempt } => {
                debug!(
                    "Fragment {}/{}: attempt {} ({} bytes) via {}",
                    position,
                    total,
                    attempt,
                    fragment.len(),
                    backend.name()
                );
                match translate_fragment(backend, &fragment.text, credentials, config).await {
                    Ok(text) => RetryState::Success {
                        text,
                        attempts: attempt,
                    },
                    Err(error) if attempt <= config.max_retries && error.is_retryable() => {
                        let wait = config.backoff_for(attempt);
                        warn!(
                            "Fragment {}/{}: attempt {} failed: {}; retrying in {}ms",
                            position,
                            total,
                            attempt,
                            error,
                            wait.as_millis()
                        );
                        RetryState::Backoff {
                            retry: attempt,
                            wait,
                            error,
                        }
                    }
                    Err(error) => RetryState::Exhausted {
                        attempts: attempt,
                        error,
                    },
                }
            }
            RetryState::Backoff { retry, wait, error } => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_fragment_retry(
                        position,
                        total,
                        retry,
                        wait.as_millis() as u64,
                        &error.to_string(),
                    );
                }
                tokio::time::sleep(wait).await;
                RetryState::Attempting { attempt: retry + 1 }
            }
            RetryState::Success { text, attempts } => {
                return Ok(FragmentTranslation { text, attempts });
            }
            RetryState::Exhausted { attempts, error } => {
                error!(
                    "Fragment {}/{}: giving up after {} attempts: {}",
                    position, total, attempts, error
                );
                return Err(TranslateError::FragmentExhausted {
                    position,
                    total,
                    attempts,
                    last_error: error,
                });
            }
        };
    }
}
