//! End-to-end conversion: source PDF → text → translation → PDF.
//!
//! [`convert`] drives the whole chain and writes the result to disk.
//! [`convert_text`] starts from text that was already extracted, and
//! [`render_markdown_file`] only typesets an existing Markdown file.
//!
//! Progress reported through [`TranslationProgressCallback::on_progress`] is
//! banded: translation owns 10–90, and 100 is sent once the PDF is written.
//! Extraction reports separately through `on_extraction_progress`.

use crate::config::{Credentials, RenderConfig, TranslationConfig};
use crate::error::TranslateError;
use crate::output::{ConversionReport, TranslationOutput};
use crate::pipeline::{extract, input};
use crate::progress::{ProgressCallback, RemappedProgress, TranslationProgressCallback};
use crate::render::{render_markdown, RenderedDocument};
use crate::translate::translate_document;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Band of the overall progress scale owned by translation.
const TRANSLATION_BAND: (u8, u8) = (10, 90);

/// Where a conversion writes its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub pdf: PathBuf,
    /// Optional copy of the translated Markdown.
    pub markdown: Option<PathBuf>,
}

impl OutputTarget {
    pub fn pdf(path: impl Into<PathBuf>) -> Self {
        Self {
            pdf: path.into(),
            markdown: None,
        }
    }

    pub fn with_markdown(mut self, path: impl Into<PathBuf>) -> Self {
        self.markdown = Some(path.into());
        self
    }
}

/// Translate the PDF at `input` (file path or HTTP/HTTPS URL) and write the
/// typeset translation to `target`.
///
/// # Errors
/// Any input, extraction or translation error is fatal and nothing is
/// written. Blocks the renderer cannot draw are skipped and counted in
/// [`ConversionReport::skipped_blocks`].
pub async fn convert(
    input: impl AsRef<str>,
    target: &OutputTarget,
    credentials: &Credentials,
    config: &TranslationConfig,
    render: &RenderConfig,
) -> Result<ConversionReport, TranslateError> {
    let started = Instant::now();
    let input = input.as_ref();
    info!("Starting translation: {}", input);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input, config.download_timeout_secs).await?;

    // ── Step 2: Extract text ─────────────────────────────────────────────
    let extract_start = Instant::now();
    let extracted = extract::extract_text(
        resolved.path(),
        config.password.as_deref(),
        config.progress_callback.clone(),
    )
    .await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!(
        "Extracted {} chars from {} pages in {}ms",
        extracted.text.chars().count(),
        extracted.num_pages,
        extract_duration_ms
    );

    let mut report = translate_and_render(&extracted.text, target, credentials, config, render).await?;
    report.source_pages = extracted.num_pages;
    report.extract_duration_ms = extract_duration_ms;
    report.total_duration_ms = started.elapsed().as_millis() as u64;
    Ok(report)
}

/// Like [`convert`], for text that has already been extracted.
pub async fn convert_text(
    text: &str,
    target: &OutputTarget,
    credentials: &Credentials,
    config: &TranslationConfig,
    render: &RenderConfig,
) -> Result<ConversionReport, TranslateError> {
    let started = Instant::now();
    let mut report = translate_and_render(text, target, credentials, config, render).await?;
    report.total_duration_ms = started.elapsed().as_millis() as u64;
    Ok(report)
}

/// Convert PDF bytes held in memory.
///
/// The bytes are spooled to a [`tempfile`] that is removed on return.
pub async fn convert_from_bytes(
    bytes: &[u8],
    target: &OutputTarget,
    credentials: &Credentials,
    config: &TranslationConfig,
    render: &RenderConfig,
) -> Result<ConversionReport, TranslateError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| TranslateError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| TranslateError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    convert(&path, target, credentials, config, render).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<str>,
    target: &OutputTarget,
    credentials: &Credentials,
    config: &TranslationConfig,
    render: &RenderConfig,
) -> Result<ConversionReport, TranslateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TranslateError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, target, credentials, config, render))
}

/// Typeset an existing Markdown file into a PDF; no translation involved.
pub async fn render_markdown_file(
    markdown_path: impl AsRef<Path>,
    output_pdf: impl AsRef<Path>,
    render: &RenderConfig,
) -> Result<RenderedDocument, TranslateError> {
    let markdown_path = markdown_path.as_ref();
    let markdown = tokio::fs::read_to_string(markdown_path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TranslateError::FileNotFound {
                path: markdown_path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => TranslateError::PermissionDenied {
                path: markdown_path.to_path_buf(),
            },
            _ => TranslateError::InvalidInput {
                input: format!("{}: {e}", markdown_path.display()),
            },
        })?;

    let rendered = render_blocking(markdown, render.clone()).await?;
    write_atomic(output_pdf.as_ref(), &rendered.bytes).await?;
    Ok(rendered)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn translate_and_render(
    text: &str,
    target: &OutputTarget,
    credentials: &Credentials,
    config: &TranslationConfig,
    render: &RenderConfig,
) -> Result<ConversionReport, TranslateError> {
    let outer = config.progress_callback.clone();

    // ── Translate ────────────────────────────────────────────────────────
    let banded = banded_config(config, outer.as_ref());
    let TranslationOutput {
        markdown,
        stats: translation,
        ..
    } = translate_document(text, credentials, &banded).await?;

    if let Some(md_path) = &target.markdown {
        write_atomic(md_path, markdown.as_bytes()).await?;
        info!("Markdown written to {}", md_path.display());
    }

    // ── Render ───────────────────────────────────────────────────────────
    let render_start = Instant::now();
    let rendered = render_blocking(markdown, render.clone()).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    write_atomic(&target.pdf, &rendered.bytes).await?;
    info!(
        "PDF written to {} ({} pages, {}ms)",
        target.pdf.display(),
        rendered.page_count,
        render_duration_ms
    );
    if let Some(cb) = &outer {
        cb.on_progress(100);
    }

    Ok(ConversionReport {
        output_path: target.pdf.clone(),
        markdown_path: target.markdown.clone(),
        source_pages: 0,
        output_pages: rendered.page_count,
        skipped_blocks: rendered.skipped_blocks.len(),
        replaced_chars: rendered.replaced_chars.len(),
        translation,
        extract_duration_ms: 0,
        render_duration_ms,
        total_duration_ms: 0,
    })
}

/// Copy of `config` whose progress callback reports in the translation band.
fn banded_config(config: &TranslationConfig, outer: Option<&ProgressCallback>) -> TranslationConfig {
    let mut banded = config.clone();
    banded.progress_callback = outer.map(|cb| {
        let (lo, hi) = TRANSLATION_BAND;
        Arc::new(RemappedProgress::new(Arc::clone(cb), lo, hi)) as Arc<dyn TranslationProgressCallback>
    });
    banded
}

/// Layout is CPU-bound; keep it off the async workers.
async fn render_blocking(markdown: String, render: RenderConfig) -> Result<RenderedDocument, TranslateError> {
    tokio::task::spawn_blocking(move || render_markdown(&markdown, &render))
        .await
        .map_err(|e| TranslateError::Internal(format!("Render task panicked: {e}")))?
}

/// Write via a sibling temp file and rename, so a crash never leaves a
/// truncated output behind.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TranslateError> {
    let write_err = |e: std::io::Error| TranslateError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_err)?;
    Ok(())
}
