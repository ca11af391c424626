//! Serialise a [`LayoutReport`] into PDF bytes with `pdf-writer`.

use super::fonts::FontVariant;
use super::layout::{DrawOp, LayoutReport};
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str, TextStr};

const PRODUCER: &str = concat!("pdf-translate ", env!("CARGO_PKG_VERSION"));

/// Write every page of `report` into a standalone PDF.
///
/// Fonts are the non-embedded standard Times family, so the file stays small
/// and every viewer can display it.
pub fn write_pdf(report: &LayoutReport, title: Option<&str>) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut next_id = 1;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();
    let font_refs: Vec<(FontVariant, Ref)> = FontVariant::ALL.iter().map(|&v| (v, alloc())).collect();
    let page_ids: Vec<Ref> = report.pages.iter().map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = report.pages.iter().map(|_| alloc()).collect();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    for (variant, id) in &font_refs {
        pdf.type1_font(*id)
            .base_font(Name(variant.base_font().as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    {
        let mut info = pdf.document_info(info_id);
        if let Some(title) = title {
            info.title(TextStr(title));
        }
        info.producer(TextStr(PRODUCER));
    }

    let g = report.geometry;
    for (i, ops) in report.pages.iter().enumerate() {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, g.width, g.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        {
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            for (variant, id) in &font_refs {
                fonts.pair(Name(variant.resource_name().as_bytes()), *id);
            }
        }
        drop(page);

        let content = page_content(ops);
        pdf.stream(content_ids[i], &content.finish());
    }

    pdf.finish()
}

fn page_content(ops: &[DrawOp]) -> Content {
    let mut content = Content::new();
    for op in ops {
        match op {
            DrawOp::Text {
                x,
                y,
                font,
                size,
                encoded,
                ..
            } => {
                content
                    .begin_text()
                    .set_font(Name(font.resource_name().as_bytes()), *size)
                    .next_line(*x, *y)
                    .show(Str(encoded))
                    .end_text();
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                gray,
            } => {
                content
                    .save_state()
                    .set_line_width(*width)
                    .set_stroke_gray(*gray)
                    .move_to(*x1, *y1)
                    .line_to(*x2, *y2)
                    .stroke()
                    .restore_state();
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill_gray,
                stroke_gray,
            } => {
                content.save_state().set_fill_gray(*fill_gray);
                match stroke_gray {
                    Some(stroke) => {
                        content
                            .set_stroke_gray(*stroke)
                            .set_line_width(1.0)
                            .rect(*x, *y, *width, *height)
                            .fill_nonzero_and_stroke();
                    }
                    None => {
                        content.rect(*x, *y, *width, *height).fill_nonzero();
                    }
                }
                content.restore_state();
            }
        }
    }
    content
}
