//! Text extraction: pull the text layer out of every page via pdfium.
//!
//! Extraction sits at the collaborator boundary: the rest of the pipeline
//! only sees one concatenated string. Each page is tagged `[Page N]` so the
//! model (and a reader of the Markdown side-output) can tell where source
//! pages began. A page whose text cannot be read is tagged
//! `[Page N - Text extraction failed]` and extraction carries on.
//!
//! pdfium is a blocking C library, so the work runs in `spawn_blocking`.

use crate::error::TranslateError;
use crate::progress::{percent_complete, ProgressCallback};
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

/// Upstream extraction result consumed by the translator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub num_pages: usize,
}

/// Extract tagged page text from the PDF at `path`.
pub async fn extract_text(
    path: &Path,
    password: Option<&str>,
    progress: Option<ProgressCallback>,
) -> Result<ExtractedDocument, TranslateError> {
    let path = path.to_path_buf();
    let password = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        extract_text_blocking(&path, password.as_deref(), progress.as_ref())
    })
    .await
    .map_err(|e| TranslateError::Internal(format!("Extraction task panicked: {e}")))?
}

fn extract_text_blocking(
    path: &Path,
    password: Option<&str>,
    progress: Option<&ProgressCallback>,
) -> Result<ExtractedDocument, TranslateError> {
    let pdfium = pdfium_auto::bind_pdfium_silent()
        .map_err(|e| TranslateError::PdfiumBindingFailed(e.to_string()))?;

    let document = pdfium
        .load_pdf_from_file(path, password)
        .map_err(|e| load_error(path, e))?;

    let pages = document.pages();
    let total = pages.len() as usize;
    info!("PDF loaded: {} pages", total);

    let mut page_texts: Vec<Option<String>> = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        let text = match page.text() {
            Ok(t) => Some(t.all()),
            Err(e) => {
                warn!("Page {}: text extraction failed: {:?}", idx + 1, e);
                None
            }
        };
        page_texts.push(text);
        if let Some(cb) = progress {
            cb.on_extraction_progress(percent_complete(idx + 1, total), idx + 1, total);
        }
    }

    let text = normalise_extracted(&assemble_pages(&page_texts));
    if text.is_empty() || is_only_page_tags(&text) {
        return Err(TranslateError::NoExtractableText {
            path: path.to_path_buf(),
        });
    }
    debug!("Extracted {} bytes of text", text.len());

    Ok(ExtractedDocument {
        text,
        num_pages: total,
    })
}

fn load_error(path: &Path, e: PdfiumError) -> TranslateError {
    let detail = format!("{e:?}");
    if detail.to_ascii_lowercase().contains("password") {
        TranslateError::PasswordRequired {
            path: path.to_path_buf(),
        }
    } else {
        TranslateError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

/// Concatenate page texts with `[Page N]` tags; `None` marks a failed page.
pub fn assemble_pages(pages: &[Option<String>]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        match page {
            Some(text) => {
                out.push_str(&format!("[Page {}]\n{}\n\n", i + 1, text));
            }
            None => {
                out.push_str(&format!("[Page {} - Text extraction failed]\n\n", i + 1));
            }
        }
    }
    out
}

static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static RE_PAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[Page \d+(?: - Text extraction failed)?\]$").unwrap());

/// Collapse horizontal whitespace to one space and blank-line runs to one
/// blank line, then trim. Line breaks inside a paragraph are kept so the
/// segmenter can still see headings and section markers.
pub fn normalise_extracted(text: &str) -> String {
    let s = text.replace("\r\n", "\n").replace('\r', "\n");
    let s = RE_HSPACE.replace_all(&s, " ");
    let s = s.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    let s = RE_BLANK_RUN.replace_all(&s, "\n\n");
    s.trim().to_string()
}

fn is_only_page_tags(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .all(|l| RE_PAGE_TAG.is_match(l))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_tagged_in_order() {
        let text = assemble_pages(&[Some("Alpha".into()), None, Some("Gamma".into())]);
        assert_eq!(
            text,
            "[Page 1]\nAlpha\n\n[Page 2 - Text extraction failed]\n\n[Page 3]\nGamma\n\n"
        );
    }

    #[test]
    fn normalise_collapses_spaces_and_blank_runs() {
        let raw = "[Page 1]\nTitle   with\t\tgaps \n\n \n\nBody\r\n";
        assert_eq!(normalise_extracted(raw), "[Page 1]\nTitle with gaps\n\nBody");
    }

    #[test]
    fn tag_only_text_counts_as_empty() {
        let text = normalise_extracted(&assemble_pages(&[Some("   ".into()), None]));
        assert!(is_only_page_tags(&text));
        let text = normalise_extracted(&assemble_pages(&[Some("Words".into())]));
        assert!(!is_only_page_tags(&text));
    }
}
