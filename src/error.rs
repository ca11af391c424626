//! Error types for the pdf-translate library.
//!
//! Three error types reflect three failure scopes:
//!
//! * [`TranslateError`]: **Fatal**: the run cannot produce a document
//!   (blank input, missing credentials, a fragment that failed every retry,
//!   an output document that could not be created). Returned as
//!   `Err(TranslateError)` from every public entry point.
//!
//! * [`FragmentError`]: **Per attempt**: one call to the translation backend
//!   failed or returned an unusable response. Always retryable; only the
//!   exhaustion of all retries becomes a [`TranslateError::FragmentExhausted`].
//!
//! * [`RenderBlockError`]: **Per block**: one Markdown block could not be laid
//!   out. The renderer logs it and skips the block; the rest of the document
//!   is still produced.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-translate library.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Blank source text or blank credentials. Nothing was sent to the backend.
    #[error("segmentation: {what} is empty; nothing to translate")]
    EmptyInput { what: &'static str },

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The file exceeds the accepted upload size.
    #[error("PDF '{path}' is {size} bytes; the limit is {limit} bytes")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// PDF structure is corrupt and cannot be parsed.
    #[error("extraction: PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none (or a wrong one) was provided.
    #[error("extraction: PDF '{path}' is encrypted.\nProvide the password with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// The PDF opened fine but contains no text layer (scanned or image-only).
    #[error("extraction: no text could be extracted from '{path}'; the document may be scanned or image-only")]
    NoExtractableText { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Translation errors ────────────────────────────────────────────────
    /// The configured backend could not be created (unknown provider, missing key).
    #[error("translation: backend '{backend}' is not configured.\n{hint}")]
    ProviderNotConfigured { backend: String, hint: String },

    /// One fragment failed every attempt; the whole run is aborted.
    #[error(
        "translation: fragment {position}/{total} failed after {attempts} attempts: {last_error}\n\
The model may be struggling with this section. Please run the translation again."
    )]
    FragmentExhausted {
        position: usize,
        total: usize,
        attempts: u32,
        last_error: FragmentError,
    },

    /// Every fragment translated but the joined result is blank.
    #[error("translation: the backend returned an empty document")]
    EmptyTranslation,

    // ── Rendering errors ──────────────────────────────────────────────────
    /// The output document could not be created at all.
    #[error("rendering: could not create the output document: {detail}")]
    RenderFatal { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed attempt to translate one fragment.
///
/// Both variants are retried with backoff; see
/// [`crate::pipeline::llm::translate_fragment_with_retry`].
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum FragmentError {
    /// Network failure, timeout, or an error reported by the remote model.
    #[error("backend call failed: {detail}")]
    Transient { detail: String },

    /// The response was empty or implausibly short for the input.
    #[error("response rejected: {received} chars returned, at least {expected_min} expected")]
    ValidationRejected { received: usize, expected_min: usize },
}

impl FragmentError {
    /// Convenience constructor for transport and remote errors.
    pub fn transient(detail: impl Into<String>) -> Self {
        FragmentError::Transient {
            detail: detail.into(),
        }
    }

    /// Whether another attempt may succeed. Every attempt-level failure is
    /// retryable; only exhausting the retry budget is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FragmentError::Transient { .. } | FragmentError::ValidationRejected { .. }
        )
    }
}

/// A single Markdown block that could not be laid out.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("rendering: {kind} block skipped: {detail}")]
pub struct RenderBlockError {
    /// Block kind, e.g. `"paragraph"` or `"table"`.
    pub kind: &'static str,
    pub detail: String,
}

impl RenderBlockError {
    pub fn new(kind: &'static str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}
