//! CLI binary for claimlens.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use claimlens::{
    analyze, analyze_to_document, inspect, AnalysisConfig, AnalysisOutput,
    AnalysisProgressCallback, ProgressCallback, WatsonxCredentials,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
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
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner through extraction and token fetch,
/// then a chunk-level progress bar. Chunks complete strictly in order, so no
/// out-of-order bookkeeping is needed.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_analysis_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} chunks  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Analyzing");
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self) {
        self.bar.set_message("Extracting text from PDF…");
    }

    fn on_extraction_complete(&self, total_pages: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracted text from {total_pages} pages"))
        ));
    }

    fn on_token_fetch(&self) {
        self.bar.set_message("Fetching watsonx token…");
    }

    fn on_analysis_start(&self, total_chunks: usize) {
        self.activate_bar(total_chunks);
    }

    fn on_chunk_start(&self, index: usize, _total: usize) {
        self.bar.set_message(format!("chunk {index}"));
    }

    fn on_chunk_complete(&self, index: usize, total: usize, output_len: usize) {
        self.bar.println(format!(
            "  {} Chunk {:>2}/{:<2}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{output_len:>5} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_chunk_soft_failure(&self, index: usize, total: usize, diagnostic: &str) {
        // Truncate very long diagnostics to keep output tidy.
        let msg: String = diagnostic.chars().take(80).collect();
        self.bar.println(format!(
            "  {} Chunk {:>2}/{:<2}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_analysis_complete(&self, total_chunks: usize, soft_failed: usize) {
        self.bar.finish_and_clear();
        if soft_failed == 0 {
            eprintln!(
                "{} {} chunks analyzed successfully",
                green("✔"),
                bold(&total_chunks.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} chunks analyzed  ({} soft-failed, diagnostics embedded in report)",
                cyan("⚠"),
                bold(&(total_chunks - soft_failed).to_string()),
                total_chunks,
                red(&soft_failed.to_string()),
            );
        }
    }

    fn on_document_start(&self) {
        eprintln!("{} Generating Word document…", cyan("◆"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyze a claim and write the .docx report next to it
  claimlens claim.pdf

  # Markdown report to a file, no .docx
  claimlens claim.pdf --no-docx -o claim_report.md

  # Smaller chunks for dense documents
  claimlens --chunk-size 15 claim.pdf

  # Inspect page/text structure (no credentials needed)
  claimlens --inspect-only claim.pdf
  claimlens --inspect-only --show-pages claim.pdf

  # Structured JSON output
  claimlens --json claim.pdf > output.json

ENVIRONMENT VARIABLES:
  WATSONX_API_KEY      IBM Cloud API key (exchanged for a bearer token)
  WATSONX_PROJECT_ID   watsonx.ai project identifier

SETUP:
  1. Set credentials:  export WATSONX_API_KEY=...  WATSONX_PROJECT_ID=...
  2. Install pandoc for .docx output (https://pandoc.org) — optional;
     without it use --no-docx to stop at the Markdown report.
  3. Analyze:          claimlens claim.pdf
"#;

/// Analyze insurance-claim PDFs into structured key-insight reports.
#[derive(Parser, Debug)]
#[command(
    name = "claimlens",
    version,
    about = "Analyze insurance-claim PDFs into structured key-insight reports using IBM watsonx.ai",
    long_about = "Extracts text from an insurance-claim PDF page by page, batches pages into \
chunks, summarizes each chunk into a structured table via IBM watsonx.ai, and assembles a \
Markdown report — optionally converted to a Word document via pandoc.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local claim PDF file path.
    input: PathBuf,

    /// Write the Markdown report to this file instead of stdout.
    #[arg(short, long, env = "CLAIMLENS_OUTPUT")]
    output: Option<PathBuf>,

    /// Directory for the generated .docx document.
    #[arg(long, env = "CLAIMLENS_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Skip .docx generation; stop at the Markdown report.
    #[arg(long, env = "CLAIMLENS_NO_DOCX")]
    no_docx: bool,

    /// Maximum pages per generation request.
    #[arg(long, env = "CLAIMLENS_CHUNK_SIZE", default_value_t = 90,
          value_parser = clap::value_parser!(usize))]
    chunk_size: usize,

    /// watsonx.ai model identifier.
    #[arg(long, env = "CLAIMLENS_MODEL", default_value = claimlens::config::DEFAULT_MODEL_ID)]
    model: String,

    /// IBM Cloud API key.
    #[arg(long, env = "WATSONX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// watsonx.ai project identifier.
    #[arg(long, env = "WATSONX_PROJECT_ID", hide_env_values = true)]
    project_id: Option<String>,

    /// Path to a text file containing a custom instruction prompt.
    #[arg(long, env = "CLAIMLENS_PROMPT")]
    prompt: Option<PathBuf>,

    /// Hard cap on generated tokens per chunk.
    #[arg(long, env = "CLAIMLENS_MAX_NEW_TOKENS", default_value_t = 8100)]
    max_new_tokens: usize,

    /// Identity-service token URL.
    #[arg(long, env = "CLAIMLENS_TOKEN_URL", hide = true)]
    token_url: Option<String>,

    /// Generation-service URL.
    #[arg(long, env = "CLAIMLENS_GENERATION_URL", hide = true)]
    generation_url: Option<String>,

    /// Output structured JSON (AnalysisOutput) instead of the report text.
    #[arg(long, env = "CLAIMLENS_JSON")]
    json: bool,

    /// Print page/text statistics only, no analysis. No credentials needed.
    #[arg(long)]
    inspect_only: bool,

    /// With --inspect-only: also print each page's text (first 1000 chars).
    #[arg(long, requires = "inspect_only")]
    show_pages: bool,

    /// Disable the progress bar.
    #[arg(long, env = "CLAIMLENS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CLAIMLENS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the report itself.
    #[arg(short, long, env = "CLAIMLENS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        return run_inspect(&cli).await;
    }

    // ── Build config (credentials fail fast) ─────────────────────────────
    let config = build_config(&cli, show_progress).await?;

    // ── Run the pipeline ─────────────────────────────────────────────────
    let output = if cli.no_docx {
        analyze(&cli.input, &config).await.context("Analysis failed")?
    } else {
        analyze_to_document(&cli.input, &config)
            .await
            .context("Analysis failed")?
    };

    // ── Emit results ─────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if let Some(ref report_path) = cli.output {
        write_report(&output.report, report_path).await?;
        if !cli.quiet {
            eprintln!(
                "{}  report  →  {}",
                green("✔"),
                bold(&report_path.display().to_string())
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.report.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.report.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet {
        print_summary(&output);
    }

    Ok(())
}

/// Print page/text statistics without analyzing.
async fn run_inspect(cli: &Cli) -> Result<()> {
    let info = inspect(&cli.input).await.context("Failed to inspect PDF")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialize info")?
        );
        return Ok(());
    }

    println!("File:         {}", cli.input.display());
    println!("Pages:        {}", info.page_count);
    println!("Empty pages:  {}", info.empty_pages);
    for (i, chars) in info.page_chars.iter().enumerate() {
        println!("  Page {:>3}:  {chars} chars", i + 1);
    }

    if cli.show_pages {
        let bytes = tokio::fs::read(&cli.input)
            .await
            .with_context(|| format!("Failed to read {}", cli.input.display()))?;
        let pages = claimlens::pipeline::extract::extract_pages(bytes)
            .await
            .context("Failed to extract page text")?;
        for page in &pages {
            println!("\n── {} ──", page.label());
            if page.text.chars().count() > 1000 {
                let preview: String = page.text.chars().take(1000).collect();
                println!("{preview}…");
            } else {
                println!("{}", page.text);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `AnalysisConfig`, failing fast on missing credentials.
async fn build_config(cli: &Cli, show_progress: bool) -> Result<AnalysisConfig> {
    let api_key = cli
        .api_key
        .clone()
        .context("Missing API key: set WATSONX_API_KEY or pass --api-key")?;
    let project_id = cli
        .project_id
        .clone()
        .context("Missing project ID: set WATSONX_PROJECT_ID or pass --project-id")?;

    let prompt = if let Some(ref path) = cli.prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read prompt from {path:?}"))?,
        )
    } else {
        None
    };

    let mut builder = AnalysisConfig::builder(WatsonxCredentials::new(api_key, project_id))
        .chunk_size(cli.chunk_size)
        .model_id(cli.model.as_str())
        .max_new_tokens(cli.max_new_tokens)
        .output_dir(cli.out_dir.clone());

    if let Some(ref url) = cli.token_url {
        builder = builder.token_url(url.as_str());
    }
    if let Some(ref url) = cli.generation_url {
        builder = builder.generation_url(url.as_str());
    }
    if let Some(p) = prompt {
        builder = builder.prompt(p);
    }
    if show_progress {
        let cb = CliProgressCallback::new();
        builder = builder.progress_callback(cb as ProgressCallback);
    }

    builder.build().context("Invalid configuration")
}

/// Write the Markdown report atomically (temp file + rename).
async fn write_report(report: &str, path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, report)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to move report into place at {}", path.display()))?;
    Ok(())
}

/// Final summary lines on stderr.
fn print_summary(output: &AnalysisOutput) {
    eprintln!(
        "   {}",
        dim(&format!(
            "{} pages / {} chunks / {}ms total",
            output.stats.total_pages, output.stats.total_chunks, output.stats.total_duration_ms
        ))
    );
    match (&output.document, &output.conversion_error) {
        (Some(path), _) => eprintln!(
            "{}  document  →  {}",
            green("✔"),
            bold(&path.display().to_string())
        ),
        (None, Some(err)) => eprintln!(
            "{}  document conversion failed (report above is unaffected): {}",
            red("✗"),
            err
        ),
        (None, None) => {}
    }
}
