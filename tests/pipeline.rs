//! Translation pipeline tests against a scripted backend.
//!
//! No network: every test swaps the model for [`Scripted`] through
//! `TranslationConfigBuilder::backend_override`. Time is paused where the
//! retry loop sleeps, so backoff costs nothing.

use async_trait::async_trait;
use futures::StreamExt;
use pdf_translate::error::FragmentError;
use pdf_translate::{
    segment, translate_document, translate_stream, Credentials, GenerationRequest,
    TranslateError, TranslationBackend, TranslationConfig, TranslationOutcome,
    TranslationProgressCallback,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

// ── Scripted backend ─────────────────────────────────────────────────────────

const PROMPT_TAIL: &str = "TEXT TO TRANSLATE:\n";

/// What the backend does with a fragment.
#[derive(Clone)]
enum Script {
    /// Return the fragment unchanged.
    Echo,
    /// Return the fragment inside a ```markdown fence.
    Fenced,
    /// Always fail with a transient error.
    Fail,
    /// Return a fixed response.
    Reply(String),
    /// Fail the first `n` calls, then echo.
    FlakyThenEcho(u32),
    /// Fail every fragment containing the marker, echo the rest.
    FailOn(&'static str),
}

struct Scripted {
    script: Script,
    calls: AtomicU32,
    needs_key: bool,
    seen: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicU32::new(0),
            needs_key: true,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn keyless(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicU32::new(0),
            needs_key: false,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

fn fragment_of(prompt: &str) -> &str {
    prompt.rsplit(PROMPT_TAIL).next().unwrap_or_default()
}

#[async_trait]
impl TranslationBackend for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn requires_credentials(&self) -> bool {
        self.needs_key
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        _credentials: &Credentials,
    ) -> Result<String, FragmentError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let body = fragment_of(&request.prompt).to_string();
        self.seen.lock().unwrap().push(body.clone());
        match &self.script {
            Script::Echo => Ok(body),
            Script::Fenced => Ok(format!("```markdown\n{body}\n```")),
            Script::Fail => Err(FragmentError::transient("HTTP 503")),
            Script::Reply(r) => Ok(r.clone()),
            Script::FlakyThenEcho(k) if n <= *k => Err(FragmentError::transient("timeout")),
            Script::FlakyThenEcho(_) => Ok(body),
            Script::FailOn(marker) if body.contains(marker) => {
                Err(FragmentError::transient("HTTP 500"))
            }
            Script::FailOn(_) => Ok(body),
        }
    }
}

// ── Progress recorder ────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    percents: Mutex<Vec<u8>>,
}

impl TranslationProgressCallback for Recorder {
    fn on_translation_start(&self, total_fragments: usize) {
        self.events.lock().unwrap().push(format!("start {total_fragments}"));
    }
    fn on_fragment_start(&self, position: usize, total: usize) {
        self.events.lock().unwrap().push(format!("fragment {position}/{total}"));
    }
    fn on_fragment_retry(&self, position: usize, _total: usize, retry: u32, _wait_ms: u64, _error: &str) {
        self.events.lock().unwrap().push(format!("retry {position} #{retry}"));
    }
    fn on_progress(&self, percent: u8) {
        self.percents.lock().unwrap().push(percent);
    }
    fn on_fragment_error(&self, position: usize, _total: usize, _error: &str) {
        self.events.lock().unwrap().push(format!("error {position}"));
    }
    fn on_translation_complete(&self, total_fragments: usize, _output_len: usize) {
        self.events.lock().unwrap().push(format!("complete {total_fragments}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn key() -> Credentials {
    Credentials::new("test-key")
}

fn config_with(backend: Arc<Scripted>) -> TranslationConfig {
    TranslationConfig::builder()
        .backend_override(backend)
        .retry_backoff_ms(10)
        .build()
        .unwrap()
}

/// Three tagged paragraphs that segment into three fragments at 1000 bytes.
fn three_paragraphs() -> String {
    (1..=3)
        .map(|i| format!("[[F{i}]] {}", "x".repeat(790)))
        .collect::<Vec<_>>()
        .join("\n\n\n")
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_fragment_is_translated_and_cleaned() {
    let backend = Scripted::new(Script::Fenced);
    let out = translate_document("The results are shown below.", &key(), &config_with(backend.clone()))
        .await
        .unwrap();
    assert_eq!(out.markdown, "The results are shown below.");
    assert_eq!(out.stats.total_fragments, 1);
    assert_eq!(out.stats.total_attempts, 1);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn fragments_are_joined_in_order() {
    let backend = Scripted::new(Script::Echo);
    let config = TranslationConfig::builder()
        .backend_override(backend.clone())
        .max_chunk_size(1000)
        .build()
        .unwrap();
    let out = translate_document(&three_paragraphs(), &key(), &config).await.unwrap();

    assert_eq!(out.fragments.len(), 3);
    let p1 = out.markdown.find("[[F1]]").unwrap();
    let p2 = out.markdown.find("[[F2]]").unwrap();
    let p3 = out.markdown.find("[[F3]]").unwrap();
    assert!(p1 < p2 && p2 < p3);
    assert_eq!(out.markdown.matches("\n\n").count(), 2);

    // The backend saw them in the same order.
    let seen = backend.seen();
    for (i, body) in seen.iter().enumerate() {
        assert!(body.starts_with(&format!("[[F{}]]", i + 1)), "call {i}: {body}");
    }
}

#[tokio::test]
async fn fifty_thousand_chars_make_two_fragments() {
    // 50 paragraphs of 1000 bytes, each ending in a paragraph gap.
    let para = format!("{}\n\n\n", "a".repeat(997));
    let text = para.repeat(50);
    assert_eq!(text.len(), 50_000);
    assert_eq!(segment(&text, 30_000).len(), 2);

    let backend = Scripted::new(Script::Echo);
    let out = translate_document(&text, &key(), &config_with(backend.clone()))
        .await
        .unwrap();
    assert_eq!(out.stats.total_fragments, 2);
    assert_eq!(backend.calls(), 2);
}

// ── Fail fast ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn blank_text_fails_before_any_call() {
    let backend = Scripted::new(Script::Echo);
    let err = translate_document("  \n\t ", &key(), &config_with(backend.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, TranslateError::EmptyInput { what: "source text" }));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn blank_credentials_fail_before_any_call() {
    let backend = Scripted::new(Script::Echo);
    let err = translate_document("Hello.", &Credentials::new("  "), &config_with(backend.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, TranslateError::EmptyInput { what: "credentials" }));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn keyless_backend_ignores_blank_credentials() {
    let backend = Scripted::keyless(Script::Echo);
    let out = translate_document("Hello.", &Credentials::new(""), &config_with(backend.clone()))
        .await
        .unwrap();
    assert_eq!(out.markdown, "Hello.");
}

// ── Retries ──────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn persistent_failure_makes_exactly_three_attempts() {
    let backend = Scripted::new(Script::Fail);
    let err = translate_document("Hello world.", &key(), &config_with(backend.clone()))
        .await
        .unwrap_err();
    match err {
        TranslateError::FragmentExhausted {
            position,
            total,
            attempts,
            last_error,
        } => {
            assert_eq!((position, total, attempts), (1, 1, 3));
            assert_eq!(last_error, FragmentError::transient("HTTP 503"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backend.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn zero_retries_means_one_attempt() {
    let backend = Scripted::new(Script::Fail);
    let config = TranslationConfig::builder()
        .backend_override(backend.clone())
        .max_retries(0)
        .build()
        .unwrap();
    let err = translate_document("Hello world.", &key(), &config).await.unwrap_err();
    assert!(matches!(err, TranslateError::FragmentExhausted { attempts: 1, .. }));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_recover_within_budget() {
    let backend = Scripted::new(Script::FlakyThenEcho(2));
    let recorder = Arc::new(Recorder::default());
    let config = TranslationConfig::builder()
        .backend_override(backend.clone())
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let out = translate_document("Hello world.", &key(), &config).await.unwrap();
    assert_eq!(out.fragments[0].attempts, 3);
    assert_eq!(out.stats.total_attempts, 3);

    let events = recorder.events.lock().unwrap().clone();
    assert!(events.contains(&"retry 1 #1".to_string()));
    assert!(events.contains(&"retry 1 #2".to_string()));
}

#[tokio::test(start_paused = true)]
async fn short_response_is_rejected() {
    let source = "a".repeat(1000);
    let backend = Scripted::new(Script::Reply("b".repeat(50)));
    let err = translate_document(&source, &key(), &config_with(backend.clone()))
        .await
        .unwrap_err();
    match err {
        TranslateError::FragmentExhausted { last_error, .. } => {
            assert_eq!(
                last_error,
                FragmentError::ValidationRejected {
                    received: 50,
                    expected_min: 100
                }
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn response_at_ten_percent_is_accepted() {
    let source = "a".repeat(1000);
    let backend = Scripted::new(Script::Reply("b".repeat(100)));
    let out = translate_document(&source, &key(), &config_with(backend))
        .await
        .unwrap();
    assert_eq!(out.markdown.len(), 100);
}

#[tokio::test(start_paused = true)]
async fn failing_fragment_aborts_the_run() {
    let backend = Scripted::new(Script::FailOn("[[F2]]"));
    let recorder = Arc::new(Recorder::default());
    let config = TranslationConfig::builder()
        .backend_override(backend.clone())
        .max_chunk_size(1000)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let err = translate_document(&three_paragraphs(), &key(), &config)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TranslateError::FragmentExhausted {
            position: 2,
            total: 3,
            attempts: 3,
            ..
        }
    ));
    // One call for F1, three for F2, none for F3.
    assert_eq!(backend.calls(), 4);
    assert!(backend.seen().iter().all(|b| !b.contains("[[F3]]")));

    let events = recorder.events.lock().unwrap().clone();
    assert!(events.contains(&"error 2".to_string()));
    assert!(!events.iter().any(|e| e.starts_with("complete")));
    assert_eq!(*recorder.percents.lock().unwrap(), vec![33]);
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn progress_is_monotonic_and_reaches_100() {
    let backend = Scripted::new(Script::Echo);
    let recorder = Arc::new(Recorder::default());
    let config = TranslationConfig::builder()
        .backend_override(backend)
        .max_chunk_size(1000)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    translate_document(&three_paragraphs(), &key(), &config).await.unwrap();

    let percents = recorder.percents.lock().unwrap().clone();
    assert_eq!(percents, vec![33, 67, 100]);
    assert!(percents.windows(2).all(|w| w[0] < w[1]));

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 3",
            "fragment 1/3",
            "fragment 2/3",
            "fragment 3/3",
            "complete 3"
        ]
    );
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stream_yields_outcomes_in_order() {
    let backend = Scripted::new(Script::Echo);
    let config = TranslationConfig::builder().max_chunk_size(1000).build().unwrap();
    let fragments = segment(&three_paragraphs(), 1000);
    let outcomes: Vec<_> = translate_stream(fragments, backend, key(), config).collect().await;

    let indices: Vec<_> = outcomes.iter().map(|o| o.fragment_index()).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(outcomes.iter().all(|o| !o.is_failed()));
}

#[tokio::test(start_paused = true)]
async fn stream_ends_after_first_failure() {
    let backend = Scripted::new(Script::FailOn("[[F1]]"));
    let config = TranslationConfig::builder()
        .max_chunk_size(1000)
        .retry_backoff_ms(10)
        .build()
        .unwrap();
    let fragments = segment(&three_paragraphs(), 1000);
    let outcomes: Vec<_> = translate_stream(fragments, backend.clone(), key(), config)
        .collect()
        .await;

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes[0],
        TranslationOutcome::Failed {
            fragment_index: 0,
            attempts: 3,
            ..
        }
    ));
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn stream_is_lazy() {
    let backend = Scripted::new(Script::Echo);
    let fragments = segment(&three_paragraphs(), 1000);
    let stream = translate_stream(fragments, backend.clone(), key(), TranslationConfig::default());
    drop(stream);
    assert_eq!(backend.calls(), 0);
}
