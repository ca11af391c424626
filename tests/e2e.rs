//! End-to-end tests against the live Gemini API.
//!
//! Gated behind `E2E_ENABLED` so CI never spends API quota by accident. They
//! also need `GEMINI_API_KEY`, and the PDF tests need pdfium (downloaded on
//! first use).
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture

use pdf_translate::{
    convert, convert_text, translate_document, Credentials, OutputTarget, RenderConfig,
    TranslationConfig,
};
use std::path::PathBuf;

const ABSTRACT: &str = "\
# Attention Is All You Need

## Abstract

The dominant sequence transduction models are based on complex recurrent or
convolutional neural networks that include an encoder and a decoder. We propose
a new simple network architecture, the Transformer, based solely on attention
mechanisms, dispensing with recurrence and convolutions entirely.

| Model | BLEU |
|-------|------|
| Transformer (big) | 28.4 |
";

/// Skip unless E2E_ENABLED and a key are both set; yields the credentials.
macro_rules! e2e_credentials {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        match std::env::var("GEMINI_API_KEY") {
            Ok(k) if !k.trim().is_empty() => Credentials::new(k),
            _ => {
                println!("SKIP — GEMINI_API_KEY is not set");
                return;
            }
        }
    }};
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/e2e");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Basic sanity checks on translated Markdown.
fn assert_translation_quality(md: &str, context: &str) {
    assert!(!md.trim().is_empty(), "[{context}] translation is empty");
    let first_line = md.lines().next().unwrap_or("");
    assert!(
        !first_line.starts_with("```"),
        "[{context}] output must not start with a code fence, got: {first_line:?}"
    );
    assert!(
        !md.contains("\n\n\n\n"),
        "[{context}] output has more than 3 consecutive blank lines"
    );
    for ch in ['\u{200B}', '\u{FEFF}', '\u{2060}'] {
        assert!(!md.contains(ch), "[{context}] invisible char U+{:04X}", ch as u32);
    }
}

#[tokio::test]
async fn e2e_translate_short_text() {
    let credentials = e2e_credentials!();
    let config = TranslationConfig::builder()
        .source_language("English")
        .target_language("Spanish")
        .build()
        .unwrap();

    let out = translate_document(ABSTRACT, &credentials, &config).await.unwrap();
    println!("{}", out.markdown);

    assert_translation_quality(&out.markdown, "short text");
    assert_eq!(out.stats.total_fragments, 1);
    // A Spanish rendering of this abstract should mention "atención".
    assert!(
        out.markdown.to_lowercase().contains("atenci"),
        "no Spanish keyword in: {}",
        out.markdown
    );
}

#[tokio::test]
async fn e2e_translate_several_fragments() {
    let credentials = e2e_credentials!();
    let config = TranslationConfig::builder()
        .max_chunk_size(400)
        .target_language("French")
        .build()
        .unwrap();

    let out = translate_document(ABSTRACT, &credentials, &config).await.unwrap();
    assert!(out.stats.total_fragments > 1);
    assert_translation_quality(&out.markdown, "several fragments");
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_convert_text_to_pdf() {
    let credentials = e2e_credentials!();
    let dir = output_dir();
    let target = OutputTarget::pdf(dir.join("abstract.es.pdf")).with_markdown(dir.join("abstract.es.md"));

    let report = convert_text(
        ABSTRACT,
        &target,
        &credentials,
        &TranslationConfig::default(),
        &RenderConfig::default(),
    )
    .await
    .unwrap();

    assert!(report.output_pages >= 1);
    let bytes = std::fs::read(&target.pdf).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    let md = std::fs::read_to_string(dir.join("abstract.es.md")).unwrap();
    assert_translation_quality(&md, "convert_text");
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_convert_pdf_from_url() {
    let credentials = e2e_credentials!();
    let out = output_dir().join("attention.es.pdf");
    let config = TranslationConfig::builder()
        .max_chunk_size(30_000)
        .build()
        .unwrap();

    let report = convert(
        "https://arxiv.org/pdf/1706.03762",
        &OutputTarget::pdf(&out),
        &credentials,
        &config,
        &RenderConfig::default(),
    )
    .await
    .unwrap();

    println!(
        "{} source pages → {} output pages, {} fragments, {} blocks skipped",
        report.source_pages,
        report.output_pages,
        report.translation.total_fragments,
        report.skipped_blocks
    );
    assert!(report.source_pages > 5);
    assert!(report.output_pages >= 1);
    assert!(out.exists());
}
