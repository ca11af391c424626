//! Markdown → PDF typesetting.
//!
//! ```text
//! markdown ──▶ metadata ──▶ blocks ──▶ layout ──▶ pdf
//!             (front matter) (lexer)   (pages)   (pdf-writer)
//! ```
//!
//! 1. [`metadata`]: lift title, authors and affiliations off the top
//! 2. [`blocks`]: split the body into [`blocks::DocumentBlock`]s
//! 3. [`layout`]: place blocks on fixed pages; skip blocks that fail
//! 4. [`pdf`]: serialise the pages with the standard Times fonts
//!
//! Rendering is synchronous and CPU-bound; async callers should run it in
//! `spawn_blocking`.

pub mod blocks;
pub mod fonts;
pub mod layout;
pub mod metadata;
pub mod pdf;

use crate::config::RenderConfig;
use crate::error::{RenderBlockError, TranslateError};
use tracing::info;

pub use layout::{layout_markdown, DrawOp, LayoutReport, RenderCursor};

/// A rendered document plus what was left out of it.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub skipped_blocks: Vec<RenderBlockError>,
    /// Characters drawn as `?` because the standard fonts cannot show them.
    pub replaced_chars: Vec<char>,
}

/// Typeset `markdown` into PDF bytes.
///
/// Blocks that cannot be drawn are logged and skipped; characters the
/// standard fonts lack are drawn as `?`.
///
/// # Errors
/// [`TranslateError::RenderFatal`] when `config` leaves no drawable area.
pub fn render_markdown_to_pdf(markdown: &str, config: &RenderConfig) -> Result<Vec<u8>, TranslateError> {
    Ok(render_markdown(markdown, config)?.bytes)
}

/// Like [`render_markdown_to_pdf`], also reporting page count and skipped blocks.
pub fn render_markdown(markdown: &str, config: &RenderConfig) -> Result<RenderedDocument, TranslateError> {
    let report = layout_markdown(markdown, config)?;
    let title = config
        .title
        .as_deref()
        .or(report.front_matter.title.as_deref());
    let bytes = pdf::write_pdf(&report, title);
    info!(
        "Rendered {} pages ({} bytes, {} blocks skipped)",
        report.page_count(),
        bytes.len(),
        report.skipped_blocks.len()
    );
    Ok(RenderedDocument {
        bytes,
        page_count: report.page_count(),
        skipped_blocks: report.skipped_blocks,
        replaced_chars: report.replaced_chars,
    })
}
