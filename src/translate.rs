//! Pipeline orchestrator: text in, one translated Markdown document out.
//!
//! Sequence: validate input → resolve backend → segment → translate each
//! fragment in order → join with a blank line. The first fragment that
//! exhausts its retries aborts the run; no partial document is returned.

use crate::config::{Credentials, TranslationConfig};
use crate::error::TranslateError;
use crate::output::{TranslationOutcome, TranslationOutput, TranslationStats};
use crate::pipeline::backend::resolve_backend;
use crate::pipeline::segment::segment;
use crate::stream::translate_stream;
use futures::StreamExt;
use std::time::Instant;
use tracing::info;

/// Separator placed between translated fragments.
pub const FRAGMENT_JOINER: &str = "\n\n";

/// Translate `text` into the configured target language.
///
/// # Errors
/// * [`TranslateError::EmptyInput`]: blank text, or blank credentials for a
///   backend that uses them. Raised before any network call.
/// * [`TranslateError::ProviderNotConfigured`]: the backend could not be built.
/// * [`TranslateError::FragmentExhausted`]: a fragment failed every attempt.
/// * [`TranslateError::EmptyTranslation`]: the joined output is blank.
pub async fn translate_document(
    text: &str,
    credentials: &Credentials,
    config: &TranslationConfig,
) -> Result<TranslationOutput, TranslateError> {
    let started = Instant::now();

    if text.trim().is_empty() {
        return Err(TranslateError::EmptyInput { what: "source text" });
    }
    let backend = resolve_backend(config)?;
    if backend.requires_credentials() && credentials.is_blank() {
        return Err(TranslateError::EmptyInput {
            what: "credentials",
        });
    }

    let fragments = segment(text, config.max_chunk_size);
    let total = fragments.len();
    let source_chars = text.chars().count();
    info!(
        "Translating {} chars in {} fragments ({} → {})",
        source_chars, total, config.source_language, config.target_language
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_translation_start(total);
    }

    let mut outcomes = translate_stream(fragments, backend, credentials.clone(), config.clone());
    let mut results = Vec::with_capacity(total);
    while let Some(outcome) = outcomes.next().await {
        match outcome {
            TranslationOutcome::Translated(r) => results.push(r),
            TranslationOutcome::Failed {
                fragment_index,
                attempts,
                error,
            } => {
                return Err(TranslateError::FragmentExhausted {
                    position: fragment_index + 1,
                    total,
                    attempts,
                    last_error: error,
                });
            }
        }
    }

    let markdown = results
        .iter()
        .map(|r| r.translated_text.as_str())
        .collect::<Vec<_>>()
        .join(FRAGMENT_JOINER);
    if markdown.trim().is_empty() {
        return Err(TranslateError::EmptyTranslation);
    }

    let stats = TranslationStats {
        total_fragments: total,
        source_chars,
        translated_chars: markdown.chars().count(),
        total_attempts: results.iter().map(|r| r.attempts).sum(),
        total_duration_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        "Translation complete: {} fragments, {} attempts, {}ms",
        total, stats.total_attempts, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_translation_complete(total, markdown.len());
    }

    Ok(TranslationOutput {
        markdown,
        fragments: results,
        stats,
    })
}
