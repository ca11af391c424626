//! # pdf-translate
//!
//! Translate PDF documents with a large language model and typeset the
//! translation back into a PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Extract    page text via pdfium, tagged "[Page N]"
//!  ├─ 3. Segment    split at section / paragraph / sentence boundaries
//!  ├─ 4. Translate  one fragment at a time, validate, clean, retry with backoff
//!  ├─ 5. Join       fragments in order, separated by a blank line
//!  └─ 6. Render     Markdown → paginated PDF (standard Times fonts)
//! ```
//!
//! Fragments are translated strictly in order and one at a time. A fragment
//! that fails every retry aborts the run: a translation with a hole in it is
//! never returned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_translate::{convert, Credentials, OutputTarget, RenderConfig, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new(std::env::var("GEMINI_API_KEY")?);
//!     let config = TranslationConfig::builder()
//!         .source_language("English")
//!         .target_language("Spanish")
//!         .build()?;
//!     let report = convert(
//!         "paper.pdf",
//!         &OutputTarget::pdf("paper.es.pdf").with_markdown("paper.es.md"),
//!         &credentials,
//!         &config,
//!         &RenderConfig::default(),
//!     )
//!     .await?;
//!     eprintln!("{} fragments, {} pages", report.translation.total_fragments, report.output_pages);
//!     Ok(())
//! }
//! ```
//!
//! Text that is already extracted goes through [`translate_document`]; a
//! Markdown document goes straight to [`render_markdown_to_pdf`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdftranslate` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-translate = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod stream;
pub mod translate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    BackendKind, Credentials, PageGeometry, RenderConfig, TranslationConfig,
    TranslationConfigBuilder,
};
pub use convert::{
    convert, convert_from_bytes, convert_sync, convert_text, render_markdown_file, OutputTarget,
};
pub use error::{FragmentError, RenderBlockError, TranslateError};
pub use output::{
    ConversionReport, Fragment, FragmentResult, TranslationOutcome, TranslationOutput,
    TranslationStats,
};
pub use pipeline::backend::{GenerationRequest, TranslationBackend};
pub use pipeline::segment::segment;
pub use progress::{NoopProgressCallback, ProgressCallback, TranslationProgressCallback};
pub use render::{render_markdown, render_markdown_to_pdf, RenderedDocument};
pub use stream::translate_stream;
pub use translate::translate_document;
