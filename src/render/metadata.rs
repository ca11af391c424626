//! Front-matter detection: title, authors and affiliations at the top of a paper.
//!
//! Best effort. Only the first [`SCAN_LINES`] lines are inspected; the first
//! heading is the title, the first name-like line after it starts the author
//! section, and italic, e-mail or institution lines after that are
//! affiliations. Lines taken into the front matter are removed from the body
//! so they are not printed twice.

use once_cell::sync::Lazy;
use regex::Regex;

/// Number of leading lines searched for front matter.
pub const SCAN_LINES: usize = 20;

/// Lines longer than this are body text, never an author or affiliation.
const MAX_META_LINE: usize = 160;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub affiliations: Vec<String>,
    /// An affiliation line carrying an e-mail address.
    pub contact: Option<String>,
}

impl FrontMatter {
    /// Whether there is anything to draw as a header.
    pub fn has_header(&self) -> bool {
        self.title.is_some() || !self.authors.is_empty()
    }
}

static RE_BOLD_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*.*\*\*").unwrap());
static RE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Lu}\p{Ll}+\s+\p{Lu}\p{Ll}+").unwrap());
static RE_ITALIC_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*.+\*").unwrap());
static RE_HEADING_MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s*").unwrap());

const INSTITUTION_WORDS: [&str; 5] = [
    "University",
    "Universidad",
    "Université",
    "Universität",
    "Institute",
];

/// Split `markdown` into its front matter and the remaining body.
pub fn extract_front_matter(markdown: &str) -> (FrontMatter, String) {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut fm = FrontMatter::default();
    let mut consumed = vec![false; lines.len()];
    let mut in_authors = false;
    let mut in_fence = false;

    for (i, raw) in lines.iter().enumerate().take(SCAN_LINES) {
        let line = raw.trim();
        if line.starts_with("```") || line.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if in_authors && !fm.affiliations.is_empty() && line.is_empty() {
            break;
        }
        if line.is_empty() || line.len() > MAX_META_LINE {
            continue;
        }

        if fm.title.is_none() {
            if line.starts_with('#') {
                let title = RE_HEADING_MARK.replace(line, "").trim().to_string();
                if !title.is_empty() {
                    fm.title = Some(title);
                    consumed[i] = true;
                }
            }
        } else if !in_authors {
            if RE_BOLD_LINE.is_match(line) || is_name_line(line) {
                fm.authors.push(line.replace("**", "").trim().to_string());
                in_authors = true;
                consumed[i] = true;
            }
        } else if is_affiliation_line(line) {
            let cleaned = line.replace('*', "").trim().to_string();
            if line.contains('@') {
                fm.contact = Some(cleaned);
            } else {
                fm.affiliations.push(cleaned);
            }
            consumed[i] = true;
        }
    }

    // A title alone is only a heading; leave it in the body.
    if fm.authors.is_empty() {
        return (FrontMatter::default(), markdown.to_string());
    }

    let body = lines
        .iter()
        .zip(consumed)
        .filter(|(_, taken)| !taken)
        .map(|(l, _)| *l)
        .collect::<Vec<_>>()
        .join("\n");
    (fm, body)
}

fn is_name_line(line: &str) -> bool {
    RE_NAME.is_match(line) && !line.ends_with('.') && !line.starts_with('#')
}

fn is_affiliation_line(line: &str) -> bool {
    RE_ITALIC_LINE.is_match(line)
        || line.contains('@')
        || INSTITUTION_WORDS.iter().any(|w| line.contains(w))
}
