//! Renderer integration tests: Markdown in, laid-out pages and PDF bytes out.

use pdf_translate::render::{layout_markdown, DrawOp, LayoutReport};
use pdf_translate::{render_markdown, render_markdown_to_pdf, PageGeometry, RenderConfig, TranslateError};

const EPS: f32 = 0.01;

fn layout(md: &str) -> LayoutReport {
    layout_markdown(md, &RenderConfig::default()).unwrap()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn lines(report: &LayoutReport) -> Vec<(f32, f32, f32, f32)> {
    report
        .ops()
        .filter_map(|(_, op)| match op {
            DrawOp::Line { x1, y1, x2, y2, .. } => Some((*x1, *y1, *x2, *y2)),
            _ => None,
        })
        .collect()
}

#[test]
fn empty_markdown_is_one_blank_page() {
    let bytes = render_markdown_to_pdf("", &RenderConfig::default()).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(contains(&bytes, b"%%EOF"));

    let doc = render_markdown("", &RenderConfig::default()).unwrap();
    assert_eq!(doc.page_count, 1);
    assert!(doc.skipped_blocks.is_empty());
}

#[test]
fn long_document_stays_inside_margins() {
    let para = "El análisis de los resultados muestra una mejora consistente en todas las métricas evaluadas durante el experimento.";
    let md = (0..200).map(|i| format!("{i}: {para}")).collect::<Vec<_>>().join("\n\n");
    let report = layout(&md);
    let g = PageGeometry::LETTER;

    assert!(report.page_count() > 5, "got {} pages", report.page_count());
    for (_, op) in report.ops() {
        if let DrawOp::Text { x, y, .. } = op {
            assert!(*y >= g.margin - EPS, "baseline {y} below bottom margin");
            assert!(*y <= g.top() + EPS, "baseline {y} above top margin");
            assert!(*x >= g.margin - EPS);
        }
    }
    // Every paragraph made it, in order.
    let texts: Vec<&str> = report.texts().collect();
    let firsts: Vec<usize> = texts
        .iter()
        .filter_map(|t| t.split(':').next()?.parse().ok())
        .collect();
    assert_eq!(firsts, (0..200).collect::<Vec<_>>());
}

#[test]
fn table_columns_are_equal_width() {
    let md = "| A | B | C |\n|---|---|---|\n| 1 | 2 | 3 |\n| 4 | 5 | 6 |";
    let report = layout(md);
    let g = PageGeometry::LETTER;
    let col_w = g.content_width() / 3.0;

    let mut vertical_x: Vec<f32> = lines(&report)
        .into_iter()
        .filter(|(x1, _, x2, _)| (x1 - x2).abs() < EPS)
        .map(|(x1, ..)| x1)
        .collect();
    vertical_x.sort_by(|a, b| a.total_cmp(b));
    vertical_x.dedup_by(|a, b| (*a - *b).abs() < EPS);
    assert_eq!(vertical_x.len(), 4);
    for (j, x) in vertical_x.iter().enumerate() {
        assert!((x - (g.margin + j as f32 * col_w)).abs() < EPS, "line {j} at {x}");
    }

    // Top border plus one separator under each of the three rows.
    let horizontal = lines(&report)
        .into_iter()
        .filter(|(_, y1, _, y2)| (y1 - y2).abs() < EPS)
        .count();
    assert_eq!(horizontal, 4);

    // Header row is shaded and set in bold.
    assert!(report
        .ops()
        .any(|(_, op)| matches!(op, DrawOp::Rect { stroke_gray: None, .. })));
    let header_font = report.ops().find_map(|(_, op)| match op {
        DrawOp::Text { text, font, .. } if text == "A" => Some(*font),
        _ => None,
    });
    assert_eq!(header_font, Some(pdf_translate::render::fonts::FontVariant::Bold));

    let cells: Vec<&str> = report.texts().collect();
    assert_eq!(cells, vec!["A", "B", "C", "1", "2", "3", "4", "5", "6"]);
}

fn encoded_texts(report: &LayoutReport) -> Vec<Vec<u8>> {
    report
        .ops()
        .filter_map(|(_, op)| match op {
            DrawOp::Text { encoded, .. } => Some(encoded.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn unencodable_characters_keep_their_block() {
    let md = "Párrafo uno.\n\nNo → cabe ∑\n\nPárrafo dos.";
    let doc = render_markdown(md, &RenderConfig::default()).unwrap();
    assert!(doc.skipped_blocks.is_empty());
    assert_eq!(doc.replaced_chars, vec!['∑']);

    let report = layout(md);
    let texts: Vec<&str> = report.texts().collect();
    assert_eq!(texts, vec!["Párrafo uno.", "No → cabe ∑", "Párrafo dos."]);
    assert_eq!(encoded_texts(&report)[1], b"No -> cabe ?".to_vec());
}

#[test]
fn greek_letter_in_table_keeps_every_row() {
    let md = "| Símbolo | Valor |\n|---|---|\n| α | 0.05 |\n| n | 120 |";
    let report = layout(md);
    assert!(report.skipped_blocks.is_empty());
    let texts: Vec<&str> = report.texts().collect();
    assert_eq!(texts, vec!["Símbolo", "Valor", "α", "0.05", "n", "120"]);
    assert_eq!(encoded_texts(&report)[2], b"?".to_vec());
    assert_eq!(report.replaced_chars, vec!['α']);
}

#[test]
fn every_block_kind_paginates_inside_margins() {
    let g = PageGeometry::LETTER;
    let row = "| celda con bastante texto para ocupar varias líneas dentro de la columna | 2 |\n";
    let item = "- elemento de lista con texto suficiente para ocupar más de una línea en la página\n";
    let quote = "> una línea de cita que se repite muchas veces para cruzar páginas\n";
    let code: String = (0..90).map(|i| format!("let x{i} = {i};\n")).collect();
    let md = format!(
        "| A | B |\n|---|---|\n{}\n{}\n{}\n```\n{code}```\n",
        row.repeat(60),
        item.repeat(60),
        quote.repeat(90),
    );
    let report = layout(&md);
    assert!(report.skipped_blocks.is_empty());
    assert!(report.page_count() > 6, "got {} pages", report.page_count());

    for (page, op) in report.ops() {
        match op {
            DrawOp::Text { y, .. } => {
                assert!(*y >= g.margin - EPS, "page {page}: baseline {y} below margin");
                assert!(*y <= g.top() + EPS, "page {page}: baseline {y} above margin");
            }
            DrawOp::Line { y1, y2, .. } => {
                assert!(y1.min(*y2) >= g.margin - EPS, "page {page}: line below margin");
                assert!(y1.max(*y2) <= g.top() + EPS, "page {page}: line above margin");
            }
            DrawOp::Rect { y, height, .. } => {
                assert!(*y >= g.margin - EPS, "page {page}: box below margin");
                assert!(y + height <= g.top() + EPS, "page {page}: box above margin");
            }
        }
    }
    assert_eq!(report.texts().filter(|t| t.starts_with("let x")).count(), 90);
}

#[test]
fn front_matter_is_drawn_once() {
    let md = "# Un estudio\n\nAna García\n*Universidad de Chile*\n\n## Introducción\n\nTexto.";
    let report = layout(md);
    assert_eq!(report.front_matter.title.as_deref(), Some("Un estudio"));
    assert_eq!(report.front_matter.authors, vec!["Ana García"]);

    let texts: Vec<&str> = report.texts().collect();
    assert_eq!(texts.iter().filter(|t| **t == "Un estudio").count(), 1);
    assert_eq!(texts.iter().filter(|t| **t == "Ana García").count(), 1);
    assert!(texts.contains(&"Introducción"));
}

#[test]
fn pdf_title_comes_from_front_matter() {
    let md = "# Informe anual\n\nLuis Pérez\n*Universidad de Lima*\n\nCuerpo.";
    let bytes = render_markdown_to_pdf(md, &RenderConfig::default()).unwrap();
    assert!(contains(&bytes, b"Informe anual"));
}

#[test]
fn every_block_kind_renders_without_skips() {
    let md = "\
# Título

Un párrafo con **negrita** y *cursiva*.

## Lista

- uno
- dos
  - anidado
1. primero
2. segundo

> Una cita breve.

```
fn main() {}
```

---

| Col | Valor |
|-----|-------|
| x   | 1     |
";
    let doc = render_markdown(md, &RenderConfig::default()).unwrap();
    assert!(doc.skipped_blocks.is_empty(), "{:?}", doc.skipped_blocks);
    assert_eq!(doc.page_count, 1);
}

#[test]
fn degenerate_geometry_is_fatal() {
    let config = RenderConfig {
        geometry: PageGeometry {
            width: 100.0,
            height: 100.0,
            margin: 60.0,
        },
        ..RenderConfig::default()
    };
    let err = render_markdown_to_pdf("Hola", &config).unwrap_err();
    assert!(matches!(err, TranslateError::RenderFatal { .. }));
}
