//! CLI binary for pdf-translate.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `TranslationConfig` / `RenderConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_translate::pipeline::{extract, input};
use pdf_translate::{
    convert, render_markdown_file, BackendKind, ConversionReport, Credentials, OutputTarget,
    ProgressCallback, RenderConfig, TranslationConfig, TranslationProgressCallback,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one percentage bar for the whole run plus a
/// log line per fragment, retry and failure.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}%  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        let bar = ProgressBar::new(100);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_extraction_progress(&self, percent: u8, page: usize, total_pages: usize) {
        // Extraction fills the 0–10 band ahead of translation.
        self.bar.set_position(percent as u64 / 10);
        self.bar.set_message(format!("page {page}/{total_pages}"));
    }

    fn on_translation_start(&self, total_fragments: usize) {
        self.bar.set_prefix("Translating");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Translating {total_fragments} fragment(s)…"))
        ));
    }

    fn on_fragment_start(&self, position: usize, total: usize) {
        self.bar.set_message(format!("fragment {position}/{total}"));
    }

    fn on_fragment_retry(&self, position: usize, total: usize, retry: u32, wait_ms: u64, error: &str) {
        self.bar.println(format!(
            "  {} Fragment {:>3}/{:<3}  retry {} in {:.1}s  {}",
            yellow("↻"),
            position,
            total,
            retry,
            wait_ms as f64 / 1000.0,
            dim(&truncate(error, 80)),
        ));
    }

    fn on_progress(&self, percent: u8) {
        if percent >= 90 {
            self.bar.set_prefix("Rendering");
        }
        self.bar.set_position(percent as u64);
    }

    fn on_fragment_error(&self, position: usize, total: usize, error: &str) {
        self.bar.println(format!(
            "  {} Fragment {:>3}/{:<3}  {}",
            red("✗"),
            position,
            total,
            red(&truncate(error, 80)),
        ));
        self.bar.abandon();
    }

    fn on_translation_complete(&self, total_fragments: usize, output_len: usize) {
        self.bar.println(format!(
            "  {} {} fragment(s) translated  {}",
            green("✓"),
            total_fragments,
            dim(&format!("{output_len} bytes")),
        ));
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{cut}\u{2026}")
    } else {
        s.to_string()
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Translate English → Spanish (default pair) with Gemini
  pdftranslate paper.pdf -o paper.es.pdf

  # Keep the translated Markdown too
  pdftranslate paper.pdf -o paper.es.pdf --markdown paper.es.md

  # Another language pair
  pdftranslate --source-lang German --target-lang English bericht.pdf

  # Any edgequake-llm provider (key read from its usual env var)
  pdftranslate --provider openai --model gpt-4.1-mini paper.pdf

  # Translate from a URL
  pdftranslate https://arxiv.org/pdf/1706.03762 -o attention.es.pdf

  # Only typeset an existing Markdown file
  pdftranslate --render-only notes.md -o notes.pdf

  # Only extract the text layer (no API key needed)
  pdftranslate --extract-only paper.pdf > paper.txt

ENVIRONMENT VARIABLES:
  PDFTRANSLATE_API_KEY    API key for the Gemini backend
  GEMINI_API_KEY          Fallback when PDFTRANSLATE_API_KEY is unset
  PDFTRANSLATE_PROVIDER   Backend: gemini (default) or an edgequake-llm provider
  PDFTRANSLATE_MODEL      Model ID (default gemini-2.0-flash)
  PDFIUM_LIB_PATH         Path to an existing libpdfium (skips auto-download)
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Log filter, overrides --verbose/--quiet

  PDFium (~30 MB) is downloaded automatically on first run and cached.
"#;

/// Translate PDF documents with an LLM and typeset the result as PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdftranslate",
    version,
    about = "Translate PDF documents with an LLM and typeset the result as PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL (a Markdown file with --render-only).
    input: String,

    /// Output PDF path. Default: `<input stem>.translated.pdf`.
    #[arg(short, long, env = "PDFTRANSLATE_OUTPUT")]
    output: Option<PathBuf>,

    /// Also write the translated Markdown to this file.
    #[arg(long, env = "PDFTRANSLATE_MARKDOWN")]
    markdown: Option<PathBuf>,

    /// API key for the Gemini backend.
    #[arg(long, env = "PDFTRANSLATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Backend: gemini, or any edgequake-llm provider (openai, anthropic, ollama, auto…).
    #[arg(long, env = "PDFTRANSLATE_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Model ID.
    #[arg(long, env = "PDFTRANSLATE_MODEL", default_value = "gemini-2.0-flash")]
    model: String,

    /// Language of the source document.
    #[arg(long, env = "PDFTRANSLATE_SOURCE_LANG", default_value = "English")]
    source_lang: String,

    /// Language to translate into.
    #[arg(long, env = "PDFTRANSLATE_TARGET_LANG", default_value = "Spanish")]
    target_lang: String,

    /// Largest fragment sent in one request, in characters.
    #[arg(long, env = "PDFTRANSLATE_MAX_CHUNK_SIZE", default_value_t = 30_000)]
    max_chunk_size: usize,

    /// Retries per fragment after the first attempt.
    #[arg(long, env = "PDFTRANSLATE_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PDFTRANSLATE_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max output tokens per fragment.
    #[arg(long, env = "PDFTRANSLATE_MAX_TOKENS", default_value_t = 8_192)]
    max_tokens: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFTRANSLATE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to a text file with a custom translation prompt
    /// (`{source}` and `{target}` are replaced by the language names).
    #[arg(long, env = "PDFTRANSLATE_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Typeset the Markdown file given as input; no translation.
    #[arg(long, conflicts_with = "extract_only")]
    render_only: bool,

    /// Print the extracted source text and exit; no translation.
    #[arg(long)]
    extract_only: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "PDFTRANSLATE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFTRANSLATE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFTRANSLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFTRANSLATE_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFTRANSLATE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-request model timeout in seconds.
    #[arg(long, env = "PDFTRANSLATE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar gives all the feedback that matters; keep INFO logs
    // out of its way unless --verbose was asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.extract_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let render = RenderConfig::default();

    // ── Render-only mode ─────────────────────────────────────────────────
    if cli.render_only {
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| default_output(&cli.input, "pdf"));
        let doc = render_markdown_file(&cli.input, &output, &render)
            .await
            .context("Rendering failed")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} pages  →  {}",
                green("✔"),
                doc.page_count,
                bold(&output.display().to_string())
            );
            report_render_issues(doc.skipped_blocks.len(), doc.replaced_chars.len());
        }
        return Ok(());
    }

    ensure_pdfium(cli.quiet)?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let resolved = input::resolve_input(&cli.input, cli.download_timeout)
            .await
            .context("Failed to open input")?;
        let doc = extract::extract_text(resolved.path(), cli.password.as_deref(), None)
            .await
            .context("Text extraction failed")?;
        match &cli.output {
            Some(path) => tokio::fs::write(path, &doc.text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(doc.text.as_bytes())
                    .context("Failed to write to stdout")?;
                handle.write_all(b"\n").ok();
            }
        }
        if !cli.quiet {
            eprintln!("Extracted {} pages", doc.num_pages);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn TranslationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;
    let credentials = Credentials::new(
        cli.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .unwrap_or_default(),
    );

    let target = OutputTarget {
        pdf: cli
            .output
            .clone()
            .unwrap_or_else(|| default_output(&cli.input, "translated.pdf")),
        markdown: cli.markdown.clone(),
    };

    // ── Run translation ──────────────────────────────────────────────────
    let report = convert(&cli.input, &target, &credentials, &config, &render)
        .await
        .context("Translation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Download pdfium on first run, with a byte-progress bar unless quiet.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }
    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.set_message("Connecting…");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    // block_in_place keeps the borrowed callback valid without a 'static bound.
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Map CLI args to `TranslationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TranslationConfig> {
    let mut builder = TranslationConfig::builder()
        .max_chunk_size(cli.max_chunk_size)
        .max_retries(cli.max_retries)
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_tokens)
        .model(cli.model.clone())
        .backend(BackendKind::from_name(&cli.provider))
        .source_language(cli.source_lang.clone())
        .target_language(cli.target_lang.clone())
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `dir/name.pdf` → `dir/name.<suffix>`; URLs land in the working directory.
fn default_output(input: &str, suffix: &str) -> PathBuf {
    let name = if input::is_url(input) {
        input::filename_from_url(input)
    } else {
        Path::new(input)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string())
    };
    let stem = Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let file = format!("{stem}.{suffix}");
    if input::is_url(input) {
        PathBuf::from(file)
    } else {
        Path::new(input).with_file_name(file)
    }
}

fn print_summary(report: &ConversionReport) {
    let t = &report.translation;
    eprintln!(
        "{}  {} pages  →  {} pages  {}ms  →  {}",
        green("✔"),
        report.source_pages,
        report.output_pages,
        report.total_duration_ms,
        bold(&report.output_path.display().to_string()),
    );
    eprintln!(
        "   {} fragments  /  {} attempts  /  {} → {} chars",
        dim(&t.total_fragments.to_string()),
        dim(&t.total_attempts.to_string()),
        dim(&t.source_chars.to_string()),
        dim(&t.translated_chars.to_string()),
    );
    if let Some(md) = &report.markdown_path {
        eprintln!("   Markdown  →  {}", md.display());
    }
    report_render_issues(report.skipped_blocks, report.replaced_chars);
}

fn report_render_issues(skipped: usize, replaced: usize) {
    if skipped > 0 {
        eprintln!(
            "   {} {} block(s) could not be typeset and were skipped (run with -v for details)",
            yellow("⚠"),
            skipped
        );
    }
    if replaced > 0 {
        eprintln!(
            "   {} {} character(s) missing from the PDF fonts were drawn as '?'",
            yellow("⚠"),
            replaced
        );
    }
}
