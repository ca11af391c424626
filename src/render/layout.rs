//! Block layout: place every block on fixed-size pages.
//!
//! The layouter walks the block list once with a [`RenderCursor`]. Before a
//! block is drawn its height is measured; if it does not fit above the bottom
//! margin a new page is started. Only blocks taller than a whole page
//! (long paragraphs, tables, code, quotes) flow across page breaks; a table
//! row taller than a page is itself split line by line.
//!
//! Characters outside WinAnsi are drawn as `?` and reported with a warning
//! per block. A block that still cannot be laid out (a table with more
//! columns than the page can hold) is rolled back completely, logged and
//! skipped. Layout never fails for content reasons; only an unusable
//! [`RenderConfig`] is fatal.

use super::blocks::{detect_emphasis, parse_markdown, plain_text, DocumentBlock};
use super::fonts::{encode_winansi_lossy, encoded_width, FontVariant};
use super::metadata::{extract_front_matter, FrontMatter};
use crate::config::{PageGeometry, RenderConfig};
use crate::error::{RenderBlockError, TranslateError};
use tracing::{debug, warn};

const PARAGRAPH_SPACING: f32 = 10.0;
const HEADING_SPACE_BEFORE: f32 = 15.0;
const H1_SPACING_AFTER: f32 = 15.0;
const HEADING_SPACING_AFTER: f32 = 10.0;
const LIST_INDENT: f32 = 20.0;
const LIST_ITEM_SPACING: f32 = 5.0;
const QUOTE_INDENT: f32 = 15.0;
const QUOTE_BAR_OFFSET: f32 = 4.0;
const QUOTE_BAR_WIDTH: f32 = 3.0;
const CODE_INDENT: f32 = 10.0;
const CODE_PADDING: f32 = 5.0;
const CODE_SIZE_FACTOR: f32 = 0.9;
const TABLE_CELL_PADDING: f32 = 5.0;
const TABLE_ROW_FACTOR: f32 = 1.2;
const BLOCK_SPACING: f32 = 10.0;

const RULE_GRAY: f32 = 0.8;
const SEPARATOR_GRAY: f32 = 0.7;
const TABLE_HEADER_FILL: f32 = 0.9;
const TABLE_LINE_WIDTH: f32 = 0.5;
const CODE_FILL: f32 = 0.95;

/// One drawing primitive, in PDF user space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A single line of text; `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        font: FontVariant,
        size: f32,
        text: String,
        encoded: Vec<u8>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        gray: f32,
    },
    /// Filled rectangle; `(x, y)` is the lower-left corner.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill_gray: f32,
        stroke_gray: Option<f32>,
    },
}

/// Current page index and vertical position (top of the next line).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCursor {
    pub page: usize,
    pub y: f32,
}

/// Result of laying out a document: the draw list of every page.
#[derive(Debug, Clone)]
pub struct LayoutReport {
    pub geometry: PageGeometry,
    pub pages: Vec<Vec<DrawOp>>,
    pub front_matter: FrontMatter,
    pub skipped_blocks: Vec<RenderBlockError>,
    /// Characters drawn as `?` because WinAnsi has no code for them.
    pub replaced_chars: Vec<char>,
}

impl LayoutReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every draw operation with its page index.
    pub fn ops(&self) -> impl Iterator<Item = (usize, &DrawOp)> + '_ {
        self.pages
            .iter()
            .enumerate()
            .flat_map(|(p, ops)| ops.iter().map(move |op| (p, op)))
    }

    /// The text of every drawn line, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.ops().filter_map(|(_, op)| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Parse `markdown` and lay it out on pages described by `config`.
///
/// # Errors
/// [`TranslateError::RenderFatal`] when the configuration leaves no room to
/// draw. Per-block problems are reported in
/// [`LayoutReport::skipped_blocks`] instead.
pub fn layout_markdown(markdown: &str, config: &RenderConfig) -> Result<LayoutReport, TranslateError> {
    config.validate()?;

    let (front_matter, body) = extract_front_matter(markdown);
    let blocks = parse_markdown(&body);
    let mut layouter = Layouter::new(config);
    let mut skipped = Vec::new();

    if front_matter.has_header() {
        let before = layouter.replaced.len();
        layouter.front_matter(&front_matter);
        warn_replaced("front matter", &layouter.replaced[before..]);
    }

    for block in &blocks {
        let snap = layouter.snapshot();
        match layouter.block(block) {
            Ok(()) => warn_replaced(block.kind(), &layouter.replaced[snap.replaced..]),
            Err(e) => {
                layouter.rollback(snap);
                warn!("{}", e);
                skipped.push(e);
            }
        }
    }

    debug!(
        "Laid out {} blocks on {} pages ({} skipped)",
        blocks.len(),
        layouter.pages.len(),
        skipped.len()
    );

    Ok(LayoutReport {
        geometry: config.geometry,
        pages: layouter.pages,
        front_matter,
        skipped_blocks: skipped,
        replaced_chars: layouter.replaced,
    })
}

fn warn_replaced(kind: &str, chars: &[char]) {
    if chars.is_empty() {
        return;
    }
    let listed: String = chars
        .iter()
        .map(|c| format!("{c:?} (U+{:04X})", *c as u32))
        .collect::<Vec<_>>()
        .join(", ");
    warn!(
        "{kind}: {} character(s) without a WinAnsi code drawn as '?': {listed}",
        chars.len()
    );
}

// ── Text shaping ─────────────────────────────────────────────────────────

/// One line of text ready to draw.
#[derive(Debug, Clone, Default, PartialEq)]
struct ShapedLine {
    text: String,
    encoded: Vec<u8>,
    width: f32,
    /// Characters in `text` encoded as `?`.
    replaced: Vec<char>,
}

impl ShapedLine {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn append(&mut self, word: ShapedLine, space_width: f32) {
        if !self.is_empty() {
            self.text.push(' ');
            self.encoded.push(b' ');
            self.width += space_width;
        }
        self.text.push_str(&word.text);
        self.encoded.extend_from_slice(&word.encoded);
        self.width += word.width;
        self.replaced.extend(word.replaced);
    }
}

fn shape(text: &str, font: FontVariant, size: f32) -> ShapedLine {
    let (encoded, replaced) = encode_winansi_lossy(text);
    ShapedLine {
        text: text.to_string(),
        width: encoded_width(font, &encoded, size),
        encoded,
        replaced,
    }
}

/// Greedy word wrap. A word wider than `max_width` is split between characters.
fn wrap(text: &str, font: FontVariant, size: f32, max_width: f32) -> Vec<ShapedLine> {
    let space = encoded_width(font, b" ", size);
    let mut lines = Vec::new();
    let mut current = ShapedLine::default();

    for word in text.split_whitespace() {
        let shaped = shape(word, font, size);

        if shaped.width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut pieces = break_chars(word, font, size, max_width);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
            continue;
        }

        if !current.is_empty() && current.width + space + shaped.width > max_width {
            lines.push(std::mem::take(&mut current));
        }
        current.append(shaped, space);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split `text` into pieces no wider than `max_width`, keeping every
/// character including spaces. Each piece holds at least one character.
fn break_chars(text: &str, font: FontVariant, size: f32, max_width: f32) -> Vec<ShapedLine> {
    let mut pieces = Vec::new();
    let mut current = ShapedLine::default();
    let mut buf = [0u8; 4];

    for ch in text.chars() {
        let glyph = shape(ch.encode_utf8(&mut buf), font, size);
        if !current.is_empty() && current.width + glyph.width > max_width {
            pieces.push(std::mem::take(&mut current));
        }
        current.text.push(ch);
        current.encoded.extend_from_slice(&glyph.encoded);
        current.width += glyph.width;
        current.replaced.extend(glyph.replaced);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

// ── Layouter ─────────────────────────────────────────────────────────────

struct Snapshot {
    pages: usize,
    ops: usize,
    cursor: RenderCursor,
    replaced: usize,
}

struct Layouter<'a> {
    config: &'a RenderConfig,
    geom: PageGeometry,
    line_height: f32,
    pages: Vec<Vec<DrawOp>>,
    cursor: RenderCursor,
    replaced: Vec<char>,
}

impl<'a> Layouter<'a> {
    fn new(config: &'a RenderConfig) -> Self {
        let geom = config.geometry;
        Self {
            config,
            geom,
            line_height: config.line_height(),
            pages: vec![Vec::new()],
            cursor: RenderCursor {
                page: 0,
                y: geom.top(),
            },
            replaced: Vec::new(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pages: self.pages.len(),
            ops: self.pages.last().map_or(0, Vec::len),
            cursor: self.cursor,
            replaced: self.replaced.len(),
        }
    }

    fn rollback(&mut self, snap: Snapshot) {
        self.pages.truncate(snap.pages);
        if let Some(last) = self.pages.last_mut() {
            last.truncate(snap.ops);
        }
        self.cursor = snap.cursor;
        self.replaced.truncate(snap.replaced);
    }

    fn content_width(&self) -> f32 {
        self.geom.content_width()
    }

    fn capacity(&self) -> f32 {
        self.geom.top() - self.geom.margin
    }

    fn at_page_top(&self) -> bool {
        self.cursor.y >= self.geom.top()
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.cursor = RenderCursor {
            page: self.pages.len() - 1,
            y: self.geom.top(),
        };
    }

    /// Start a new page unless `height` still fits above the bottom margin.
    fn ensure_space(&mut self, height: f32) {
        if self.cursor.y - height < self.geom.margin && !self.at_page_top() {
            self.new_page();
        }
    }

    /// Like [`Self::ensure_space`], for blocks that fit on one page.
    fn keep_together(&mut self, height: f32) {
        if height <= self.capacity() {
            self.ensure_space(height);
        }
    }

    /// Vertical gap; never moves the cursor below the bottom margin.
    fn advance(&mut self, gap: f32) {
        self.cursor.y = (self.cursor.y - gap).max(self.geom.margin);
    }

    fn push(&mut self, op: DrawOp) {
        let page = self.cursor.page;
        self.pages[page].push(op);
    }

    fn push_text(&mut self, x: f32, baseline: f32, font: FontVariant, size: f32, line: ShapedLine) {
        self.replaced.extend(line.replaced);
        self.push(DrawOp::Text {
            x,
            y: baseline,
            font,
            size,
            text: line.text,
            encoded: line.encoded,
        });
    }

    fn push_hline(&mut self, x1: f32, x2: f32, y: f32, width: f32, gray: f32) {
        self.push(DrawOp::Line {
            x1,
            y1: y,
            x2,
            y2: y,
            width,
            gray,
        });
    }

    fn push_vline(&mut self, x: f32, top: f32, bottom: f32, width: f32, gray: f32) {
        self.push(DrawOp::Line {
            x1: x,
            y1: top,
            x2: x,
            y2: bottom,
            width,
            gray,
        });
    }

    /// Draw one shaped line at `x` and move down by `line_height`.
    fn draw_line(&mut self, line: ShapedLine, x: f32, font: FontVariant, size: f32, line_height: f32) {
        self.ensure_space(line_height);
        let baseline = self.cursor.y - size;
        self.push_text(x, baseline, font, size, line);
        self.cursor.y -= line_height;
    }

    fn draw_centered(&mut self, line: ShapedLine, font: FontVariant, size: f32, line_height: f32) {
        let x = self.geom.margin + ((self.content_width() - line.width) / 2.0).max(0.0);
        self.draw_line(line, x, font, size, line_height);
    }

    // ── Front matter ─────────────────────────────────────────────────────

    fn front_matter(&mut self, fm: &FrontMatter) {
        let cw = self.content_width();
        let body = self.config.font_size;
        self.cursor.y = self.geom.height - 2.0 * self.geom.margin;

        if let Some(title) = &fm.title {
            let size = self.config.heading_size(1);
            let lh = (size * 1.2).max(self.line_height);
            for line in wrap(&plain_text(title), FontVariant::Bold, size, cw) {
                self.draw_centered(line, FontVariant::Bold, size, lh);
            }
            self.advance(30.0);
        }

        if !fm.authors.is_empty() {
            let size = body * 1.2;
            let lh = (size * 1.2).max(self.line_height);
            for author in &fm.authors {
                for line in wrap(author, FontVariant::Bold, size, cw) {
                    self.draw_centered(line, FontVariant::Bold, size, lh);
                }
                self.advance(5.0);
            }
            self.advance(10.0);
        }

        if !fm.affiliations.is_empty() {
            for aff in &fm.affiliations {
                for line in wrap(aff, FontVariant::Italic, body, cw) {
                    self.draw_centered(line, FontVariant::Italic, body, self.line_height);
                }
                self.advance(3.0);
            }
            self.advance(10.0);
        }

        if let Some(contact) = &fm.contact {
            self.advance(10.0);
            for line in wrap(contact, FontVariant::Italic, body, cw) {
                self.draw_centered(line, FontVariant::Italic, body, self.line_height);
            }
            self.advance(20.0);
        }

        self.ensure_space(10.0);
        let y = self.cursor.y - 10.0;
        let m = self.geom.margin;
        self.push_hline(m, m + cw, y, 1.0, SEPARATOR_GRAY);
        self.advance(40.0);
    }

    // ── Blocks ───────────────────────────────────────────────────────────

    fn block(&mut self, block: &DocumentBlock) -> Result<(), RenderBlockError> {
        match block {
            DocumentBlock::Heading { level, text } => self.heading(*level, text),
            DocumentBlock::Paragraph { text } => self.paragraph(text),
            DocumentBlock::ListItem {
                ordered,
                number,
                indent,
                text,
            } => self.list_item(*ordered, *number, *indent, text),
            DocumentBlock::Table { header, rows } => return self.table(header, rows),
            DocumentBlock::Blockquote { text } => self.blockquote(text),
            DocumentBlock::CodeBlock { lines } => self.code(lines),
            DocumentBlock::Rule => self.rule(),
            DocumentBlock::Blank => self.advance(self.line_height),
        }
        Ok(())
    }

    fn heading(&mut self, level: u8, text: &str) {
        let size = self.config.heading_size(level);
        let lh = (size * 1.2).max(self.line_height);
        let lines = wrap(&plain_text(text), FontVariant::Bold, size, self.content_width());
        let spacing = if level == 1 {
            H1_SPACING_AFTER
        } else {
            HEADING_SPACING_AFTER
        };

        if !self.at_page_top() {
            self.advance(HEADING_SPACE_BEFORE);
        }
        // Keep the heading with at least one line of what follows.
        self.keep_together(lines.len() as f32 * lh + spacing + self.line_height);
        for line in lines {
            if level == 1 {
                self.draw_centered(line, FontVariant::Bold, size, lh);
            } else {
                self.draw_line(line, self.geom.margin, FontVariant::Bold, size, lh);
            }
        }
        self.advance(spacing);
    }

    fn paragraph(&mut self, text: &str) {
        let (text, font) = detect_emphasis(text);
        let size = self.config.font_size;
        let lh = self.line_height;
        for line in wrap(&text, font, size, self.content_width()) {
            self.draw_line(line, self.geom.margin, font, size, lh);
        }
        self.advance(PARAGRAPH_SPACING);
    }

    fn list_item(&mut self, ordered: bool, number: usize, depth: usize, text: &str) {
        let size = self.config.font_size;
        let lh = self.line_height;
        let cw = self.content_width();
        let depth_x = (depth as f32 * LIST_INDENT).min(cw / 2.0);
        let marker_x = self.geom.margin + depth_x;
        let text_x = marker_x + LIST_INDENT;

        let (text, font) = detect_emphasis(text);
        let lines = wrap(&text, font, size, cw - depth_x - LIST_INDENT);
        let marker = if ordered {
            format!("{number}.")
        } else {
            "•".to_string()
        };
        let marker_line = shape(&marker, FontVariant::Regular, size);

        self.keep_together(lines.len().max(1) as f32 * lh + LIST_ITEM_SPACING);
        self.ensure_space(lh);
        self.push_text(marker_x, self.cursor.y - size, FontVariant::Regular, size, marker_line);
        if lines.is_empty() {
            self.cursor.y -= lh;
        }
        for line in lines {
            self.draw_line(line, text_x, font, size, lh);
        }
        self.advance(LIST_ITEM_SPACING);
    }

    fn table(&mut self, header: &[String], rows: &[Vec<String>]) -> Result<(), RenderBlockError> {
        const KIND: &str = "table";
        let ncols = rows.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);
        if ncols == 0 {
            return Err(RenderBlockError::new(KIND, "table has no columns"));
        }
        let size = self.config.font_size;
        let lh = self.line_height;
        let cw = self.content_width();
        let col_w = cw / ncols as f32;
        let inner = col_w - 2.0 * TABLE_CELL_PADDING;
        if inner <= 0.0 {
            return Err(RenderBlockError::new(
                KIND,
                format!("{ncols} columns do not fit the page width"),
            ));
        }
        // Vertical padding around the text lines of a row.
        let pad = lh * TABLE_ROW_FACTOR - lh;

        let mut shaped: Vec<(bool, Vec<(FontVariant, Vec<ShapedLine>)>)> = Vec::new();
        for (r, row) in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)).enumerate() {
            let is_header = r == 0;
            let mut cells = Vec::with_capacity(ncols);
            for c in 0..ncols {
                let raw = row.get(c).map(String::as_str).unwrap_or("");
                let (text, font) = if is_header {
                    (plain_text(raw), FontVariant::Bold)
                } else {
                    detect_emphasis(raw)
                };
                cells.push((font, wrap(&text, font, size, inner)));
            }
            shaped.push((is_header, cells));
        }

        let line_count = |cells: &[(FontVariant, Vec<ShapedLine>)]| {
            cells.iter().map(|(_, l)| l.len()).max().unwrap_or(1).max(1)
        };
        let total: f32 = shaped
            .iter()
            .map(|(_, cells)| pad + line_count(cells.as_slice()) as f32 * lh)
            .sum();
        self.keep_together(total);

        let m = self.geom.margin;
        let mut first_on_page = true;
        for (is_header, cells) in shaped {
            let count = line_count(cells.as_slice());
            let page_before = self.cursor.page;
            self.keep_together(pad + count as f32 * lh);
            self.ensure_space(pad + lh);
            if self.cursor.page != page_before {
                first_on_page = true;
            }

            // A row taller than the space left is drawn in page-sized slices,
            // each one boxed on its own page.
            let mut start = 0;
            while start < count {
                let top = self.cursor.y;
                let avail = ((top - m - pad) / lh).floor().max(0.0) as usize;
                let fit = avail.clamp(1, count - start);
                let height = pad + fit as f32 * lh;
                let bottom = top - height;

                if is_header {
                    self.push(DrawOp::Rect {
                        x: m,
                        y: bottom,
                        width: cw,
                        height,
                        fill_gray: TABLE_HEADER_FILL,
                        stroke_gray: None,
                    });
                }
                if first_on_page {
                    self.push_hline(m, m + cw, top, TABLE_LINE_WIDTH, RULE_GRAY);
                }
                for (c, (font, lines)) in cells.iter().enumerate() {
                    let x = m + c as f32 * col_w + TABLE_CELL_PADDING;
                    for (k, line) in lines.iter().skip(start).take(fit).enumerate() {
                        let baseline = top - pad / 2.0 - k as f32 * lh - size;
                        self.push_text(x, baseline, *font, size, line.clone());
                    }
                }
                for c in 0..=ncols {
                    let x = m + c as f32 * col_w;
                    self.push_vline(x, top, bottom, TABLE_LINE_WIDTH, RULE_GRAY);
                }
                self.push_hline(m, m + cw, bottom, TABLE_LINE_WIDTH, RULE_GRAY);

                self.cursor.y = bottom;
                first_on_page = false;
                start += fit;
                if start < count {
                    self.new_page();
                    first_on_page = true;
                }
            }
        }
        self.advance(BLOCK_SPACING);
        Ok(())
    }

    fn blockquote(&mut self, text: &str) {
        let size = self.config.font_size;
        let lh = self.line_height;
        let width = self.content_width() - QUOTE_INDENT;

        let mut lines: Vec<Option<ShapedLine>> = Vec::new();
        for src in text.lines() {
            if src.trim().is_empty() {
                lines.push(None);
                continue;
            }
            let wrapped = wrap(&plain_text(src), FontVariant::Italic, size, width);
            lines.extend(wrapped.into_iter().map(Some));
        }
        if lines.is_empty() {
            return;
        }

        self.keep_together(lines.len() as f32 * lh);
        self.ensure_space(lh);
        let bar_x = self.geom.margin + QUOTE_BAR_OFFSET;
        let text_x = self.geom.margin + QUOTE_INDENT;
        let mut segment_top = self.cursor.y;

        for line in lines {
            if self.cursor.y - lh < self.geom.margin {
                self.quote_bar(bar_x, segment_top);
                self.new_page();
                segment_top = self.cursor.y;
            }
            if let Some(line) = line {
                self.push_text(text_x, self.cursor.y - size, FontVariant::Italic, size, line);
            }
            self.cursor.y -= lh;
        }
        self.quote_bar(bar_x, segment_top);
        self.advance(BLOCK_SPACING);
    }

    fn quote_bar(&mut self, x: f32, top: f32) {
        let bottom = self.cursor.y;
        if top - bottom > 0.5 {
            self.push_vline(x, top, bottom, QUOTE_BAR_WIDTH, RULE_GRAY);
        }
    }

    fn code(&mut self, source: &[String]) {
        let size = self.config.font_size * CODE_SIZE_FACTOR;
        let lh = self.line_height;
        let cw = self.content_width();
        let width = cw - 2.0 * CODE_INDENT;

        let mut lines: Vec<Option<ShapedLine>> = Vec::new();
        for src in source {
            if src.trim().is_empty() {
                lines.push(None);
                continue;
            }
            let pieces = break_chars(src.trim_end(), FontVariant::Regular, size, width);
            lines.extend(pieces.into_iter().map(Some));
        }
        if lines.is_empty() {
            lines.push(None);
        }

        let pad = CODE_PADDING;
        self.keep_together(lines.len() as f32 * lh + 2.0 * pad);
        let m = self.geom.margin;
        let mut remaining = lines.into_iter().peekable();

        while remaining.peek().is_some() {
            self.ensure_space(lh + 2.0 * pad);
            let avail = self.cursor.y - m - 2.0 * pad;
            let left = remaining.len();
            let fit = ((avail / lh).floor() as usize).clamp(1, left);
            let top = self.cursor.y;
            let height = fit as f32 * lh + 2.0 * pad;
            self.push(DrawOp::Rect {
                x: m,
                y: top - height,
                width: cw,
                height,
                fill_gray: CODE_FILL,
                stroke_gray: Some(RULE_GRAY),
            });

            self.cursor.y -= pad;
            for line in remaining.by_ref().take(fit) {
                if let Some(line) = line {
                    self.push_text(m + CODE_INDENT, self.cursor.y - size, FontVariant::Regular, size, line);
                }
                self.cursor.y -= lh;
            }
            self.cursor.y -= pad;

            if remaining.peek().is_some() {
                self.new_page();
            }
        }
        self.advance(BLOCK_SPACING);
    }

    fn rule(&mut self) {
        let lh = self.line_height;
        self.ensure_space(lh * 2.0);
        let y = self.cursor.y - lh;
        let m = self.geom.margin;
        let cw = self.content_width();
        self.push_hline(m, m + cw, y, 1.0, RULE_GRAY);
        self.advance(lh * 2.0);
    }
}
