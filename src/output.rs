//! Output types produced by the translation pipeline.
//!
//! Everything here is plain data: serialisable so the CLI can emit a JSON
//! report, cloneable so a caller can keep results after the run finishes.

use crate::error::FragmentError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A bounded-size slice of source text submitted as one translation unit.
///
/// `index` is 0-based and dense; fragments are translated and rejoined in
/// ascending `index` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub index: usize,
    pub text: String,
}

impl Fragment {
    /// 1-based position, as shown in progress and error messages.
    pub fn position(&self) -> usize {
        self.index + 1
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One successfully translated fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentResult {
    pub fragment_index: usize,
    /// Cleaned Markdown returned by the backend.
    pub translated_text: String,
    /// Byte length of the source fragment.
    pub source_len: usize,
    /// Attempts used, including the successful one (1 = first try).
    pub attempts: u32,
    /// Wall-clock time spent on this fragment, backoff included.
    pub duration_ms: u64,
}

/// The result of translating one fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TranslationOutcome {
    Translated(FragmentResult),
    Failed {
        fragment_index: usize,
        /// Attempts made before giving up.
        attempts: u32,
        error: FragmentError,
    },
}

impl TranslationOutcome {
    pub fn fragment_index(&self) -> usize {
        match self {
            TranslationOutcome::Translated(r) => r.fragment_index,
            TranslationOutcome::Failed { fragment_index, .. } => *fragment_index,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TranslationOutcome::Failed { .. })
    }
}

/// Aggregate numbers for one translation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationStats {
    pub total_fragments: usize,
    pub source_chars: usize,
    pub translated_chars: usize,
    /// Attempts across all fragments; equals `total_fragments` when nothing was retried.
    pub total_attempts: u32,
    pub total_duration_ms: u64,
}

/// Complete result of [`crate::translate::translate_document`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOutput {
    /// All fragments joined in order with a blank line between them.
    pub markdown: String,
    pub fragments: Vec<FragmentResult>,
    pub stats: TranslationStats,
}

/// Summary of an end-to-end [`crate::convert::convert`] run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    /// Set when a Markdown side-output was requested.
    pub markdown_path: Option<PathBuf>,
    pub source_pages: usize,
    pub output_pages: usize,
    /// Blocks the renderer could not lay out and skipped.
    pub skipped_blocks: usize,
    /// Characters the standard fonts lack, drawn as `?`.
    #[serde(default)]
    pub replaced_chars: usize,
    pub translation: TranslationStats,
    pub extract_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}
