//! Post-processing: deterministic cleanup of model-generated Markdown.
//!
//! The prompt asks for bare Markdown, but models still wrap answers in
//! ` ```markdown ` fences, emit `\r\n`, or produce tables the renderer's
//! lexer cannot recognise. Each rule here is a small pure `&str → String`
//! function with its own test, so a new quirk means one new rule.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so fence detection sees `\n` only.
//! Fences are stripped before the table rules so a fenced table is seen
//! as a table. Trimming runs last because the orchestrator joins fragments
//! with its own blank line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to one raw backend response.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip a wrapping code fence (` ``` `, ` ```markdown `, ` ```md `)
/// 3. Trim trailing whitespace per line
/// 4. Collapse runs of 3+ blank lines down to 2
/// 5. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 6. Insert a missing separator row after a table header
/// 7. Remove spurious separator rows inside a table body
/// 8. Trim the whole result
pub fn clean_translation(raw: &str) -> String {
    let s = normalise_line_endings(raw);
    let s = strip_code_wrapper(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    let s = insert_missing_table_separator(&s);
    let s = remove_mid_table_separators(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip wrapping code fence ────────────────────────────────────────

static RE_OPENING_WRAPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^```[ \t]*(?:markdown|md)?[ \t]*$").unwrap());

fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Removes a fence the model wrapped around its whole answer.
///
/// The opening line is dropped when it is a bare or `markdown`-tagged fence.
/// The closing ```` ``` ```` is dropped only when it pairs with a dropped
/// opener, or when it is left unpaired; a genuine code block at the end of
/// the answer keeps its closing fence.
fn strip_code_wrapper(input: &str) -> String {
    let trimmed = input.trim();
    let mut lines: Vec<&str> = trimmed.lines().collect();

    let opened = lines
        .first()
        .is_some_and(|l| RE_OPENING_WRAPPER.is_match(l.trim()));
    if opened {
        lines.remove(0);
    }

    let closes = lines.last().is_some_and(|l| l.trim() == "```");
    if closes {
        let fence_count = lines.iter().filter(|l| is_fence_line(l)).count();
        if opened || fence_count % 2 == 1 {
            lines.pop();
        }
    }

    lines.join("\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 5: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 6: Insert missing table separator ──────────────────────────────────

pub(crate) fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.len() > 2 && t.starts_with('|') && t.ends_with('|')
}

pub(crate) fn is_separator_row(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('|')
        && t.contains('-')
        && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn column_count(row: &str) -> usize {
    row.trim().matches('|').count().saturating_sub(1).max(1)
}

/// A run of pipe rows whose second line is not a separator gets one,
/// sized to the header's column count.
fn insert_missing_table_separator(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 4);

    for (i, line) in lines.iter().enumerate() {
        out.push((*line).to_string());

        let starts_table = is_table_row(line)
            && !is_separator_row(line)
            && !i.checked_sub(1).is_some_and(|p| is_table_row(lines[p]));
        if !starts_table {
            continue;
        }
        let next = lines.get(i + 1).copied().unwrap_or("");
        if is_table_row(next) && !is_separator_row(next) {
            let sep: String = std::iter::once("|")
                .chain(std::iter::repeat_n(" --- |", column_count(line)))
                .collect();
            out.push(sep);
        }
    }

    out.join("\n")
}

// ── Rule 7: Remove spurious mid-table separator rows ────────────────────────

/// Only the separator directly under the header survives.
fn remove_mid_table_separators(input: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut row_in_table = 0usize;

    for line in input.lines() {
        if is_table_row(line) {
            row_in_table += 1;
            if is_separator_row(line) && row_in_table != 2 {
                continue;
            }
        } else {
            row_in_table = 0;
        }
        out.push(line);
    }

    out.join("\n")
}

// ── Tests ────────────────────────────────────────────────────────────────────
