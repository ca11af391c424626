//! Segmenter: split extracted text into bounded, structure-aware fragments.
//!
//! A remote model has a finite output budget per request, so long documents
//! are sent in pieces. Cutting at arbitrary offsets would split sentences and
//! tables in half; instead we look for *breakpoints* (chapter and section
//! markers, Markdown headings, separator lines, paragraph gaps) and cut at
//! the furthest one that still fits.
//!
//! Sizes are measured in UTF-8 bytes, and every cut lands on a `char`
//! boundary. For the Latin-script documents this pipeline targets, bytes and
//! characters differ by a few percent at most.
//!
//! Segmentation is a pure function of `(text, max_chunk_size)`.

use crate::output::Fragment;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// Breakpoint patterns, highest priority first. Every match start is a
/// candidate cut; priority only documents intent since all candidates are
/// merged and sorted before the walk.
static BREAKPOINT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Numbered chapters, English or Spanish.
        r"(?i)\n\s*?(?:CAPITULO|CAPÍTULO|CHAPTER)\s+\d+",
        // Numbered sections.
        r"(?i)\n\s*?(?:SECTION|SECCIÓN)\s+\d+",
        // "1. Title"
        r"\n\s*?\d+\.\s+[A-Z]",
        // "IV. Title"
        r"\n\s*?[IVX]+\.\s+[A-Z]",
        // Markdown headings.
        r"\n\s*?#{1,3}\s+",
        // Separator lines.
        r"\n\s*?\*\*\*+\s*?\n",
        r"\n\s*?---+\s*?\n",
        // Paragraph gaps of two or more blank lines.
        r"\n\s*?\n\s*?\n",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid breakpoint regex"))
    .collect()
});

/// Sentence or paragraph endings used when no breakpoint fits the window.
const FALLBACK_ENDINGS: [&str; 3] = [". ", ".\n", "\n\n"];

/// Split `text` into fragments of at most `max_chunk_size` bytes.
///
/// * Text that already fits is returned as one trimmed fragment.
/// * Otherwise the furthest breakpoint within `max_chunk_size` of the current
///   position is chosen; failing that, the last sentence ending or paragraph
///   gap inside the window; failing that, a hard cut at the window edge.
/// * Fragments are trimmed; fragments that trim to nothing are dropped, and
///   indices stay dense.
///
/// A fragment may exceed `max_chunk_size` only by the trailing bytes of one
/// multi-byte character when `max_chunk_size` is smaller than that character.
pub fn segment(text: &str, max_chunk_size: usize) -> Vec<Fragment> {
    let max = max_chunk_size.max(1);
    if text.trim().is_empty() {
        return Vec::new();
    }

    if text.len() <= max {
        debug!("Text fits in one fragment ({} bytes)", text.len());
        return vec![Fragment {
            index: 0,
            text: text.trim().to_string(),
        }];
    }

    let breakpoints = collect_breakpoints(text);
    debug!("Found {} candidate breakpoints", breakpoints.len());

    let mut fragments = Vec::new();
    let mut pos = 0usize;

    while pos < text.len() {
        let end = next_cut(text, pos, max, &breakpoints);
        let piece = text[pos..end].trim();
        if !piece.is_empty() {
            fragments.push(Fragment {
                index: fragments.len(),
                text: piece.to_string(),
            });
        }
        pos = end;
    }

    info!(
        "Segmented {} bytes into {} fragments (max {})",
        text.len(),
        fragments.len(),
        max
    );
    for f in &fragments {
        debug!("Fragment {}: {} bytes", f.position(), f.len());
    }
    fragments
}

/// All breakpoint offsets in ascending order, deduplicated.
fn collect_breakpoints(text: &str) -> Vec<usize> {
    let mut points: Vec<usize> = BREAKPOINT_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.start()))
        .collect();
    points.sort_unstable();
    points.dedup();
    points
}

/// End offset (exclusive) of the fragment starting at `pos`.
fn next_cut(text: &str, pos: usize, max: usize, breakpoints: &[usize]) -> usize {
    let remaining = text.len() - pos;
    if remaining <= max {
        return text.len();
    }

    // Furthest breakpoint strictly after `pos` and within the window.
    let limit = pos + max;
    let upper = breakpoints.partition_point(|&bp| bp <= limit);
    if let Some(&bp) = breakpoints[..upper].last() {
        if bp > pos {
            return bp;
        }
    }

    let window_end = floor_char_boundary(text, limit);
    let window = &text[pos..window_end];
    let last_ending = FALLBACK_ENDINGS
        .iter()
        .filter_map(|pat| window.rfind(pat))
        .max();
    if let Some(off) = last_ending {
        if off > 0 {
            // Keep the '.' (or first '\n') with the current fragment.
            return pos + off + 1;
        }
    }

    if window_end > pos {
        window_end
    } else {
        ceil_char_boundary(text, pos + 1)
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
