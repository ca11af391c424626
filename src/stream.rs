//! Streaming translation API: yield fragment outcomes as they complete.
//!
//! Fragments are translated strictly one after another, so the stream yields
//! outcomes in fragment order. The stream is lazy: nothing is sent until it
//! is polled, and dropping it abandons the remaining fragments. After the
//! first [`TranslationOutcome::Failed`] the stream ends; later fragments are
//! never attempted.
//!
//! [`crate::translate::translate_document`] is built on top of this and is
//! the simpler API when only the joined document matters.

use crate::config::{Credentials, TranslationConfig};
use crate::error::{FragmentError, TranslateError};
use crate::output::{Fragment, FragmentResult, TranslationOutcome};
use crate::pipeline::backend::TranslationBackend;
use crate::pipeline::llm::translate_fragment_with_retry;
use crate::progress::percent_complete;
use futures::stream;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of fragment outcomes, in fragment order.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = TranslationOutcome> + Send>>;

struct StreamState {
    fragments: std::vec::IntoIter<Fragment>,
    total: usize,
    backend: Arc<dyn TranslationBackend>,
    credentials: Credentials,
    config: TranslationConfig,
    aborted: bool,
}

/// Translate `fragments` sequentially, yielding one outcome per fragment.
///
/// Progress events (`on_fragment_start`, `on_fragment_retry`, `on_progress`,
/// `on_fragment_error`) are emitted as the stream is polled.
pub fn translate_stream(
    fragments: Vec<Fragment>,
    backend: Arc<dyn TranslationBackend>,
    credentials: Credentials,
    config: TranslationConfig,
) -> OutcomeStream {
    let state = StreamState {
        total: fragments.len(),
        fragments: fragments.into_iter(),
        backend,
        credentials,
        config,
        aborted: false,
    };

    let s = stream::unfold(state, |mut state| async move {
        if state.aborted {
            return None;
        }
        let fragment = state.fragments.next()?;
        let outcome = translate_one(&state, &fragment).await;
        if outcome.is_failed() {
            state.aborted = true;
        }
        Some((outcome, state))
    });

    Box::pin(s)
}

async fn translate_one(state: &StreamState, fragment: &Fragment) -> TranslationOutcome {
    let total = state.total;
    let position = fragment.position();
    let cb = state.config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_fragment_start(position, total);
    }
    info!(
        "Translating fragment {}/{} ({} bytes)",
        position,
        total,
        fragment.len()
    );

    let start = Instant::now();
    let result = translate_fragment_with_retry(
        state.backend.as_ref(),
        fragment,
        total,
        &state.credentials,
        &state.config,
    )
    .await;

    match result {
        Ok(done) => {
            if let Some(cb) = cb {
                cb.on_progress(percent_complete(position, total));
            }
            TranslationOutcome::Translated(FragmentResult {
                fragment_index: fragment.index,
                source_len: fragment.len(),
                translated_text: done.text,
                attempts: done.attempts,
                duration_ms: start.elapsed().as_millis() as u64,
            })
        }
        Err(err) => {
            if let Some(cb) = cb {
                cb.on_fragment_error(position, total, &err.to_string());
            }
            let (attempts, error) = match err {
                TranslateError::FragmentExhausted {
                    attempts,
                    last_error,
                    ..
                } => (attempts, last_error),
                other => (1, FragmentError::transient(other.to_string())),
            };
            TranslationOutcome::Failed {
                fragment_index: fragment.index,
                attempts,
                error,
            }
        }
    }
}
