//! Markdown → block list.
//!
//! Block structure comes from `pulldown-cmark` (CommonMark plus GFM pipe
//! tables): ATX and setext headings, paragraphs, nested bullet and numbered
//! lists, tables, blockquotes, fenced and indented code, rules and runs of
//! blank lines. Inline markup is not laid out span by span; each text block
//! keeps its emphasis markers and [`detect_emphasis`] later picks one font for
//! a whole line and strips them.

use super::fonts::FontVariant;
use once_cell::sync::Lazy;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use regex::Regex;
use std::ops::Range;

/// One renderable unit of a Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBlock {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    ListItem {
        ordered: bool,
        /// Item number for ordered items, counted from the list's first
        /// number; unused for bullets.
        number: usize,
        /// Nesting depth, 0 for top-level items.
        indent: usize,
        text: String,
    },
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Quote lines joined with `\n`; an empty line separates paragraphs.
    Blockquote {
        text: String,
    },
    CodeBlock {
        lines: Vec<String>,
    },
    Rule,
    /// Extra vertical space from two or more consecutive blank lines.
    Blank,
}

impl DocumentBlock {
    /// Short kind name used in skip diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentBlock::Heading { .. } => "heading",
            DocumentBlock::Paragraph { .. } => "paragraph",
            DocumentBlock::ListItem { .. } => "list item",
            DocumentBlock::Table { .. } => "table",
            DocumentBlock::Blockquote { .. } => "blockquote",
            DocumentBlock::CodeBlock { .. } => "code",
            DocumentBlock::Rule => "rule",
            DocumentBlock::Blank => "space",
        }
    }
}

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Split a Markdown document into blocks.
pub fn parse_markdown(markdown: &str) -> Vec<DocumentBlock> {
    let source = close_tables(&markdown.replace("\r\n", "\n"));
    let mut builder = BlockBuilder::default();
    for (event, range) in Parser::new_ext(&source, Options::ENABLE_TABLES).into_offset_iter() {
        builder.event(event, range, &source);
    }
    builder.blocks
}

/// End every pipe table at its first line that is not a row.
///
/// GFM lets a table absorb any following non-blank line as a row. Here a
/// table framed with a leading `|` ends at the first line that does not start
/// with one, and a bare table at the first line without a pipe.
fn close_tables(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut fence: Option<String> = None;
    let mut framed: Option<bool> = None;
    let mut prev = "";

    for line in text.lines() {
        if let Some(open) = &fence {
            if is_closing_fence(line, open) {
                fence = None;
            }
        } else if let Some(caps) = RE_FENCE.captures(line) {
            fence = Some(caps[1].to_string());
            framed = None;
        } else if let Some(leading_pipe) = framed {
            let t = line.trim();
            let is_row = if leading_pipe {
                t.starts_with('|')
            } else {
                t.contains('|')
            };
            if t.is_empty() {
                framed = None;
            } else if !is_row {
                out.push('\n');
                framed = None;
            }
        } else if is_delimiter_row(line) && prev.contains('|') {
            framed = Some(prev.trim_start().starts_with('|'));
        }
        out.push_str(line);
        out.push('\n');
        prev = line;
    }
    out
}

fn is_closing_fence(line: &str, fence: &str) -> bool {
    let t = line.trim();
    t.starts_with(fence) && t.chars().all(|c| c == fence.as_bytes()[0] as char)
}

fn is_delimiter_row(line: &str) -> bool {
    let t = line.trim();
    t.contains('|')
        && t.contains('-')
        && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

/// Blank lines between byte offset `end` (end of one block) and `start`.
fn blank_lines_between(source: &str, end: usize, start: usize) -> usize {
    let newlines = source.get(end..start).map_or(0, |gap| gap.matches('\n').count());
    if source[..end].ends_with('\n') {
        newlines
    } else {
        newlines.saturating_sub(1)
    }
}

/// Append `text`, escaping the characters inline markup reads as markers.
fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '_' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn take_trimmed(buf: &mut String) -> String {
    let text = buf.trim().to_string();
    buf.clear();
    text
}

/// Open element on the parser's tag stack.
#[derive(Debug)]
enum Frame {
    Paragraph,
    Heading(u8),
    Quote,
    List {
        ordered: bool,
        next: usize,
    },
    Item {
        ordered: bool,
        number: usize,
        depth: usize,
        /// Whether the item's own line was already pushed, ahead of a
        /// nested block.
        emitted: bool,
    },
    Code,
    Html,
    Table,
    Row {
        head: bool,
    },
    Cell,
    /// Emphasis marker re-emitted when the span closes.
    Marker(&'static str),
    Inline,
}

/// Folds the pulldown-cmark event stream into [`DocumentBlock`]s.
#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<DocumentBlock>,
    stack: Vec<Frame>,
    /// Inline Markdown of the paragraph, heading, item or cell being read.
    inline: String,
    code: String,
    /// Lines of the outermost open blockquote.
    quote: Vec<String>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    /// End offset of the last top-level block.
    last_end: Option<usize>,
}

impl BlockBuilder {
    fn event(&mut self, event: Event<'_>, range: Range<usize>, source: &str) {
        match event {
            Event::Start(tag) => {
                if self.stack.is_empty() {
                    self.separate(range.start, source);
                }
                self.start(tag);
            }
            Event::End(_) => {
                self.end();
                if self.stack.is_empty() {
                    self.last_end = Some(range.end);
                }
            }
            Event::Text(text) => match self.stack.last() {
                Some(Frame::Code) => self.code.push_str(&text),
                _ => push_escaped(&mut self.inline, &text),
            },
            Event::Code(code) => {
                self.inline.push('`');
                push_escaped(&mut self.inline, &code);
                self.inline.push('`');
            }
            Event::SoftBreak | Event::HardBreak => self.line_break(),
            Event::InlineHtml(html) => {
                if RE_BR.is_match(&html) {
                    self.line_break();
                }
            }
            Event::Html(html) => {
                let text = RE_TAG.replace_all(&html, " ");
                push_escaped(&mut self.inline, &text);
            }
            Event::Rule => {
                if self.stack.is_empty() {
                    self.separate(range.start, source);
                    self.last_end = Some(range.end);
                }
                self.emit(DocumentBlock::Rule);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph,
            Tag::Heading { level, .. } => {
                self.flush_item();
                Frame::Heading(heading_level(level))
            }
            Tag::BlockQuote(_) => {
                self.flush_item();
                Frame::Quote
            }
            Tag::CodeBlock(_) => {
                self.flush_item();
                self.code.clear();
                Frame::Code
            }
            Tag::HtmlBlock => {
                self.flush_item();
                Frame::Html
            }
            Tag::List(first) => {
                self.flush_item();
                Frame::List {
                    ordered: first.is_some(),
                    next: first.map_or(1, |n| n as usize),
                }
            }
            Tag::Item => {
                self.inline.clear();
                let depth = self
                    .stack
                    .iter()
                    .filter(|f| matches!(f, Frame::List { .. }))
                    .count()
                    .saturating_sub(1);
                let (ordered, number) = match self.stack.last_mut() {
                    Some(Frame::List {
                        ordered: true,
                        next,
                    }) => {
                        *next += 1;
                        (true, *next - 1)
                    }
                    _ => (false, 0),
                };
                Frame::Item {
                    ordered,
                    number,
                    depth,
                    emitted: false,
                }
            }
            Tag::Table(_) => {
                self.flush_item();
                self.header.clear();
                self.rows.clear();
                Frame::Table
            }
            Tag::TableHead => {
                self.row.clear();
                Frame::Row { head: true }
            }
            Tag::TableRow => {
                self.row.clear();
                Frame::Row { head: false }
            }
            Tag::TableCell => {
                self.inline.clear();
                Frame::Cell
            }
            Tag::Strong => {
                self.inline.push_str("**");
                Frame::Marker("**")
            }
            Tag::Emphasis => {
                self.inline.push('*');
                Frame::Marker("*")
            }
            _ => Frame::Inline,
        };
        self.stack.push(frame);
    }

    fn end(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Paragraph => {
                if matches!(self.stack.last(), Some(Frame::Item { .. })) {
                    // Loose item: its paragraphs run together.
                    self.inline.push(' ');
                } else {
                    self.emit_paragraph();
                }
            }
            Frame::Heading(level) => {
                let text = take_trimmed(&mut self.inline);
                self.emit(DocumentBlock::Heading { level, text });
            }
            Frame::Quote => {
                if !self.in_quote() {
                    let text = std::mem::take(&mut self.quote).join("\n").trim().to_string();
                    if !text.is_empty() {
                        self.emit(DocumentBlock::Blockquote { text });
                    }
                }
            }
            Frame::Code => {
                let code = std::mem::take(&mut self.code);
                let body = code.trim_end_matches('\n');
                let lines = if body.is_empty() {
                    Vec::new()
                } else {
                    body.split('\n').map(|l| l.replace('\t', "    ")).collect()
                };
                self.emit(DocumentBlock::CodeBlock { lines });
            }
            Frame::Html => self.emit_paragraph(),
            Frame::Item {
                ordered,
                number,
                depth,
                emitted,
            } => {
                if emitted {
                    // Text after a nested block.
                    self.emit_paragraph();
                } else {
                    let text = take_trimmed(&mut self.inline);
                    self.emit(DocumentBlock::ListItem {
                        ordered,
                        number,
                        indent: depth,
                        text,
                    });
                }
            }
            Frame::Cell => {
                let text = take_trimmed(&mut self.inline);
                self.row.push(text);
            }
            Frame::Row { head } => {
                let row = std::mem::take(&mut self.row);
                if head {
                    self.header = row;
                } else {
                    self.rows.push(row);
                }
            }
            Frame::Table => {
                let header = std::mem::take(&mut self.header);
                let rows = std::mem::take(&mut self.rows);
                self.emit(DocumentBlock::Table { header, rows });
            }
            Frame::Marker(marker) => self.inline.push_str(marker),
            Frame::List { .. } | Frame::Inline => {}
        }
    }

    fn in_quote(&self) -> bool {
        self.stack.iter().any(|f| matches!(f, Frame::Quote))
    }

    fn line_break(&mut self) {
        let sep = if self.in_quote() { '\n' } else { ' ' };
        self.inline.push(sep);
    }

    /// Push a [`DocumentBlock::Blank`] when two or more blank lines separate
    /// the previous top-level block from the one starting at `offset`.
    fn separate(&mut self, offset: usize, source: &str) {
        if let Some(end) = self.last_end {
            if !self.blocks.is_empty() && blank_lines_between(source, end, offset) >= 2 {
                self.blocks.push(DocumentBlock::Blank);
            }
        }
    }

    /// Push the open list item's own text before a nested block starts.
    fn flush_item(&mut self) {
        let block = match self.stack.last_mut() {
            Some(Frame::Item {
                ordered,
                number,
                depth,
                emitted,
            }) if !*emitted => {
                *emitted = true;
                DocumentBlock::ListItem {
                    ordered: *ordered,
                    number: *number,
                    indent: *depth,
                    text: take_trimmed(&mut self.inline),
                }
            }
            _ => return,
        };
        self.emit(block);
    }

    fn emit_paragraph(&mut self) {
        let text = take_trimmed(&mut self.inline);
        if !text.is_empty() {
            self.emit(DocumentBlock::Paragraph { text });
        }
    }

    /// Append a finished block, or flatten it into the open blockquote.
    fn emit(&mut self, block: DocumentBlock) {
        if !self.in_quote() {
            self.blocks.push(block);
            return;
        }
        let is_item = matches!(block, DocumentBlock::ListItem { .. });
        let lines = match block {
            DocumentBlock::Heading { text, .. }
            | DocumentBlock::Paragraph { text }
            | DocumentBlock::Blockquote { text } => vec![text],
            DocumentBlock::ListItem {
                ordered: true,
                number,
                text,
                ..
            } => vec![format!("{number}. {text}")],
            DocumentBlock::ListItem { text, .. } => vec![format!("• {text}")],
            DocumentBlock::CodeBlock { lines } => lines,
            DocumentBlock::Table { header, rows } => std::iter::once(header)
                .chain(rows)
                .map(|row| row.join(" | "))
                .collect(),
            DocumentBlock::Rule | DocumentBlock::Blank => Vec::new(),
        };
        if !self.quote.is_empty() && !is_item {
            self.quote.push(String::new());
        }
        self.quote.extend(lines);
    }
}

// ── Inline markup ────────────────────────────────────────────────────────

static RE_BOLD_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*\*(.+?)\*\*\*").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\s][^*]*?)\*").unwrap());
static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
static RE_CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static RE_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([\\{}\[\]()#+\-.!|>])").unwrap());

/// Pick one font for a line of inline Markdown and strip the emphasis markers.
///
/// The strongest emphasis present wins: `***x***` gives bold italic, then
/// `**x**` bold, then `*x*` italic. Links and images keep only their text,
/// code spans lose their backticks.
pub fn detect_emphasis(text: &str) -> (String, FontVariant) {
    let protected = protect_escapes(text);
    let variant = if RE_BOLD_ITALIC.is_match(&protected) {
        FontVariant::BoldItalic
    } else if RE_BOLD.is_match(&protected) {
        FontVariant::Bold
    } else if RE_ITALIC.is_match(&protected) {
        FontVariant::Italic
    } else {
        FontVariant::Regular
    };
    (strip_markup(&protected), variant)
}

/// Strip all inline markup, keeping the visible text.
pub fn plain_text(text: &str) -> String {
    strip_markup(&protect_escapes(text))
}

// Escaped markers become private-use placeholders until the markup is gone.
const ESCAPES: [(&str, char, char); 3] = [
    ("\\*", '\u{E000}', '*'),
    ("\\_", '\u{E001}', '_'),
    ("\\`", '\u{E002}', '`'),
];

fn protect_escapes(text: &str) -> String {
    ESCAPES
        .iter()
        .fold(text.to_string(), |s, (esc, ph, _)| s.replace(esc, &ph.to_string()))
}

fn strip_markup(protected: &str) -> String {
    let s = RE_IMAGE.replace_all(protected, "$1");
    let s = RE_LINK.replace_all(&s, "$1");
    let s = RE_CODE_SPAN.replace_all(&s, "$1");
    let s = RE_BR.replace_all(&s, " ");
    let s = RE_BOLD_ITALIC.replace_all(&s, "$1");
    let s = RE_BOLD.replace_all(&s, "$1$2");
    let s = RE_ITALIC.replace_all(&s, "$1");
    let s = RE_ESCAPE.replace_all(&s, "$1");
    ESCAPES
        .iter()
        .fold(s.into_owned(), |s, (_, ph, lit)| s.replace(*ph, &lit.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(t: &str) -> DocumentBlock {
        DocumentBlock::Paragraph { text: t.into() }
    }

    #[test]
    fn headings_and_paragraphs() {
        let blocks = parse_markdown("# Título\n\nPrimera línea\ncontinúa aquí.\n\n### Sección 2 ###");
        assert_eq!(
            blocks,
            vec![
                DocumentBlock::Heading {
                    level: 1,
                    text: "Título".into()
                },
                para("Primera línea continúa aquí."),
                DocumentBlock::Heading {
                    level: 3,
                    text: "Sección 2".into()
                },
            ]
        );
    }

    #[test]
    fn hash_without_space_is_paragraph() {
        assert_eq!(parse_markdown("#hashtag"), vec![para("#hashtag")]);
    }

    #[test]
    fn rule_is_not_a_list() {
        assert_eq!(
            parse_markdown("Texto\n\n---\n\n* * *"),
            vec![para("Texto"), DocumentBlock::Rule, DocumentBlock::Rule]
        );
    }

    fn item(ordered: bool, number: usize, indent: usize, text: &str) -> DocumentBlock {
        DocumentBlock::ListItem {
            ordered,
            number,
            indent,
            text: text.into(),
        }
    }

    #[test]
    fn lists_with_nesting_and_numbering() {
        let md = "1. uno\n2. dos\n   sigue\n   - anidado\n3. tres\n\n- a\n+ b";
        assert_eq!(
            parse_markdown(md),
            vec![
                item(true, 1, 0, "uno"),
                item(true, 2, 0, "dos sigue"),
                item(false, 0, 1, "anidado"),
                item(true, 3, 0, "tres"),
                item(false, 0, 0, "a"),
                item(false, 0, 0, "b"),
            ]
        );
    }

    #[test]
    fn loose_list_item_keeps_its_paragraphs_together() {
        let md = "- primero\n\n  con detalle\n\n- segundo";
        assert_eq!(
            parse_markdown(md),
            vec![item(false, 0, 0, "primero con detalle"), item(false, 0, 0, "segundo")]
        );
    }

    #[test]
    fn ordered_list_keeps_literal_start() {
        let blocks = parse_markdown("4. cuatro\n5. cinco");
        let numbers: Vec<_> = blocks
            .iter()
            .map(|b| match b {
                DocumentBlock::ListItem { number, .. } => *number,
                _ => 0,
            })
            .collect();
        assert_eq!(numbers, vec![4, 5]);
    }

    #[test]
    fn table_with_separator() {
        let md = "| A | B | C |\n|---|:--:|---|\n| 1 | 2 | 3 |\n| 4 | 5 | 6 |\nDespués";
        let blocks = parse_markdown(md);
        assert_eq!(
            blocks[0],
            DocumentBlock::Table {
                header: vec!["A".into(), "B".into(), "C".into()],
                rows: vec![
                    vec!["1".into(), "2".into(), "3".into()],
                    vec!["4".into(), "5".into(), "6".into()],
                ],
            }
        );
        assert_eq!(blocks[1], para("Después"));
    }

    #[test]
    fn table_ends_at_first_line_that_is_not_a_row() {
        let md = "| A | B |\n|---|---|\n| 1 | 2 |\na | b\n\nfin";
        assert_eq!(
            parse_markdown(md),
            vec![
                DocumentBlock::Table {
                    header: vec!["A".into(), "B".into()],
                    rows: vec![vec!["1".into(), "2".into()]],
                },
                para("a | b"),
                para("fin"),
            ]
        );
    }

    #[test]
    fn bare_table_without_outer_pipes() {
        let blocks = parse_markdown("A | B\n--- | ---\n1 | 2\n3 | 4");
        assert_eq!(
            blocks,
            vec![DocumentBlock::Table {
                header: vec!["A".into(), "B".into()],
                rows: vec![vec!["1".into(), "2".into()], vec!["3".into(), "4".into()]],
            }]
        );
    }

    #[test]
    fn table_cells_keep_emphasis_markers() {
        let blocks = parse_markdown("| Métrica | Valor |\n|---|---|\n| **F1** | `0.9` |");
        assert_eq!(
            blocks[0],
            DocumentBlock::Table {
                header: vec!["Métrica".into(), "Valor".into()],
                rows: vec![vec!["**F1**".into(), "`0.9`".into()]],
            }
        );
    }

    #[test]
    fn pipe_row_without_separator_is_paragraph() {
        let blocks = parse_markdown("| a | b |\n| c | d |");
        assert!(matches!(blocks[0], DocumentBlock::Paragraph { .. }));
    }

    #[test]
    fn escaped_pipe_stays_in_cell() {
        let blocks = parse_markdown("| a \\| b | c |\n|---|---|");
        assert_eq!(
            blocks,
            vec![DocumentBlock::Table {
                header: vec!["a | b".into(), "c".into()],
                rows: vec![],
            }]
        );
    }

    #[test]
    fn fenced_code_keeps_lines_verbatim() {
        let md = "```rust\nfn main() {\n\tlet x = 1;\n\n}\n```\nfin";
        let blocks = parse_markdown(md);
        assert_eq!(
            blocks[0],
            DocumentBlock::CodeBlock {
                lines: vec![
                    "fn main() {".into(),
                    "    let x = 1;".into(),
                    "".into(),
                    "}".into()
                ]
            }
        );
        assert_eq!(blocks[1], para("fin"));
    }

    #[test]
    fn indented_code_block() {
        let blocks = parse_markdown("Texto:\n\n    let x = 1;\n    let y = 2;\n\nfin");
        assert_eq!(
            blocks,
            vec![
                para("Texto:"),
                DocumentBlock::CodeBlock {
                    lines: vec!["let x = 1;".into(), "let y = 2;".into()]
                },
                para("fin"),
            ]
        );
    }

    #[test]
    fn pipe_lines_inside_fences_are_untouched() {
        let md = "```\n| A |\n|---|\n| 1 |\ntexto\n```";
        assert_eq!(
            parse_markdown(md),
            vec![DocumentBlock::CodeBlock {
                lines: vec!["| A |".into(), "|---|".into(), "| 1 |".into(), "texto".into()]
            }]
        );
    }

    #[test]
    fn setext_headings() {
        assert_eq!(
            parse_markdown("Resultados\n==========\n\nTexto."),
            vec![
                DocumentBlock::Heading {
                    level: 1,
                    text: "Resultados".into()
                },
                para("Texto."),
            ]
        );
        assert_eq!(
            parse_markdown("Texto\n---"),
            vec![DocumentBlock::Heading {
                level: 2,
                text: "Texto".into()
            }]
        );
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let blocks = parse_markdown("```\n# not a heading");
        assert_eq!(
            blocks,
            vec![DocumentBlock::CodeBlock {
                lines: vec!["# not a heading".into()]
            }]
        );
    }

    #[test]
    fn blockquote_lines_are_joined() {
        let blocks = parse_markdown("> primera\n> segunda\n\nfuera");
        assert_eq!(
            blocks[0],
            DocumentBlock::Blockquote {
                text: "primera\nsegunda".into()
            }
        );
    }

    #[test]
    fn blockquote_flattens_nested_blocks() {
        let blocks = parse_markdown("> ## Nota\n>\n> - uno\n> - dos");
        assert_eq!(
            blocks,
            vec![DocumentBlock::Blockquote {
                text: "Nota\n• uno\n• dos".into()
            }]
        );
    }

    #[test]
    fn inline_markup_survives_for_font_selection() {
        let blocks = parse_markdown("Un **resultado** clave, con \\*asteriscos\\* y _guiones_bajos.");
        let DocumentBlock::Paragraph { text } = &blocks[0] else {
            panic!("expected a paragraph, got {:?}", blocks[0]);
        };
        assert_eq!(
            detect_emphasis(text),
            (
                "Un resultado clave, con *asteriscos* y _guiones_bajos.".into(),
                FontVariant::Bold
            )
        );
    }

    #[test]
    fn blank_runs() {
        let blocks = parse_markdown("\n\nuno\n\ndos\n\n\n\ntres\n\n\n");
        assert_eq!(
            blocks,
            vec![para("uno"), para("dos"), DocumentBlock::Blank, para("tres")]
        );
    }

    #[test]
    fn empty_document_has_no_blocks() {
        assert!(parse_markdown("").is_empty());
        assert!(parse_markdown("\n \n\t\n").is_empty());
    }

    #[test]
    fn emphasis_detection() {
        assert_eq!(
            detect_emphasis("texto ***fuerte*** aquí"),
            ("texto fuerte aquí".into(), FontVariant::BoldItalic)
        );
        assert_eq!(
            detect_emphasis("**Nota:** importante"),
            ("Nota: importante".into(), FontVariant::Bold)
        );
        assert_eq!(
            detect_emphasis("un *énfasis* leve"),
            ("un énfasis leve".into(), FontVariant::Italic)
        );
        assert_eq!(
            detect_emphasis("2 * 3 = 6"),
            ("2 * 3 = 6".into(), FontVariant::Regular)
        );
    }

    #[test]
    fn links_images_and_code_spans_are_flattened() {
        assert_eq!(
            plain_text("Ver [la guía](https://x.y) y ![logo](a.png), usa `cargo`"),
            "Ver la guía y logo, usa cargo"
        );
        assert_eq!(plain_text(r"precio \*neto\*"), "precio *neto*");
    }
}
