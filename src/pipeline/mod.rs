//! Pipeline stages for PDF translation.
//!
//! Each submodule implements one transformation step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ segment ──▶ llm ──▶ postprocess
//! (URL/path) (pdfium)   (fragments) (backend) (cleanup)
//! ```
//!
//! 1. [`input`]: canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]: page text via pdfium; runs in `spawn_blocking`
//! 3. [`segment`]: split text into fragments below the size limit
//! 4. [`llm`]: one fragment per call with validation and retry/backoff;
//!    talks to the model through a [`backend::TranslationBackend`]
//! 5. [`postprocess`]: deterministic cleanup of model output (fences,
//!    line endings, tables, invisible characters)

pub mod backend;
pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod segment;
