//! CLI binary for edgequake-paperscan.
//!
//! A thin shim over the library crate: one subcommand per task, flags mapped
//! onto `RunConfig`, results summarised on stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_paperscan::{
    tasks, CitationMode, DocumentCitations, GroupedRow, PageTokenRecord, ProgressCallback,
    RunConfig, SummaryOutcome, TaskProgressCallback, TokenTasks, VisionTasks,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

/// One progress bar, reset for every document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Fetching");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl TaskProgressCallback for CliProgressCallback {
    fn on_document_start(&self, url: &str, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.set_position(0);
        self.bar.reset_elapsed();
        self.bar.set_prefix(short_name(url));
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{url}  ({total_pages} pages)"))
        ));
    }

    fn on_skipped(&self, page_num: Option<usize>, artifact: &Path) {
        let what = match page_num {
            Some(p) => format!("page {p:>3}"),
            None => "document".to_string(),
        };
        self.bar.println(format!(
            "  {} {}  {}",
            dim("↷"),
            what,
            dim(&format!("exists: {}", artifact.display()))
        ));
        if page_num.is_some() {
            self.bar.inc(1);
        }
    }

    fn on_page_complete(&self, page_num: usize, _total_pages: usize) {
        self.bar.set_position(page_num as u64);
    }

    fn on_document_complete(&self, url: &str) {
        self.bar.println(format!("  {} {}", green("✓"), dim(url)));
    }
}

fn short_name(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .chars()
        .take(24)
        .collect()
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Which pages claim to beat GPT-4o? One JSON file per page.
  paperscan outperform --output-dir out/gpt4o --urls https://arxiv.org/pdf/2406.12345

  # Resume an interrupted run: pages whose JSON exists are not re-sent.
  paperscan outperform --output-dir out/gpt4o --skip-existing --urls ...

  # References and citations, page by page, plus out/refs/results.json
  paperscan citations --output-dir out/refs --urls URL1 URL2

  # Same, but the whole paper in a single request
  paperscan citations --single-shot --output-dir out/refs --urls URL1

  # Summarise every page into out/summary/<pdf>.json
  paperscan summarize --output-dir out/summary --urls URL1

  # Character and token counts of the text layer (no LLM, no API key)
  paperscan tokens --output-dir out/tokens --urls URL1 URL2

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (default: system library)
"#;

/// Ask Vision LLMs questions about academic papers, page by page.
#[derive(Parser, Debug)]
#[command(
    name = "paperscan",
    version,
    about = "Ask Vision LLMs questions about academic papers, page by page",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    task: Task,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAPERSCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PAPERSCAN_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PAPERSCAN_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Task {
    /// Classify each page: does it claim the method beats GPT-4o?
    Outperform(VisionArgs),
    /// Extract references and citation occurrences.
    Citations(CitationArgs),
    /// Summarise and explain every page.
    Summarize(VisionArgs),
    /// Count characters and tokens of each page's text layer.
    Tokens(CommonArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory for the JSON/CSV artifacts.
    #[arg(long = "output-dir", alias = "output_dir")]
    output_dir: PathBuf,

    /// Directory for downloaded PDFs.
    #[arg(long = "cache-dir", alias = "cache_dir", default_value = "_cache")]
    cache_dir: PathBuf,

    /// PDF URLs, processed in the order given.
    #[arg(long, required = true, num_args = 1..)]
    urls: Vec<String>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PAPERSCAN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Path to the pdfium shared library (default: system library).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct VisionArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Keep artifacts that already exist instead of regenerating them.
    #[arg(long, alias = "not_skip")]
    skip_existing: bool,

    /// LLM model ID.
    #[arg(long, env = "EDGEQUAKE_MODEL", default_value = "gpt-4o")]
    model: String,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0). Provider default when unset.
    #[arg(long, env = "PAPERSCAN_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max LLM output tokens per call.
    #[arg(long, env = "PAPERSCAN_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Longest edge of a rendered page, in pixels.
    #[arg(long, env = "PAPERSCAN_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,
}

#[derive(Args, Debug)]
struct CitationArgs {
    #[command(flatten)]
    vision: VisionArgs,

    /// Send all pages of a paper in one request instead of one per page.
    #[arg(long, alias = "once_shot")]
    single_shot: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose asks for more.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    let progress = show_progress.then(CliProgressCallback::new);
    let progress_cb = progress
        .clone()
        .map(|p| p as Arc<dyn TaskProgressCallback>);

    let result = run_task(&cli, progress_cb).await;
    if let Some(p) = progress {
        p.finish();
    }
    result
}

async fn run_task(cli: &Cli, progress: Option<ProgressCallback>) -> Result<()> {
    match &cli.task {
        Task::Outperform(args) => {
            let config = build_config(args, progress)?;
            let vision = VisionTasks::from_config(&config).context("Failed to set up tasks")?;
            let verdicts = tasks::outperform::run(&vision, &args.common.urls)
                .await
                .context("Superiority classification failed")?;

            if !cli.quiet {
                let claims = verdicts
                    .iter()
                    .filter(|v| v.verdict.parsed().and_then(|p| p.is_superior_to_gpt_4o) == Some(true))
                    .count();
                eprintln!(
                    "{}  {} pages classified, {} claim to beat GPT-4o  →  {}",
                    green("✔"),
                    verdicts.len(),
                    bold(&claims.to_string()),
                    bold(&args.common.output_dir.display().to_string()),
                );
            }
        }
        Task::Citations(args) => {
            let config = build_config(&args.vision, progress)?;
            let vision = VisionTasks::from_config(&config).context("Failed to set up tasks")?;
            let mode = if args.single_shot {
                CitationMode::SingleShot
            } else {
                CitationMode::PerPage
            };
            let results = tasks::citations::run(&vision, &args.vision.common.urls, mode)
                .await
                .context("Citation extraction failed")?;

            if !cli.quiet {
                let unparsed: usize = results.iter().map(count_unparsed).sum();
                eprintln!(
                    "{}  {} documents  ({} unparsed answers)  →  {}",
                    if unparsed == 0 { green("✔") } else { cyan("⚠") },
                    results.len(),
                    unparsed,
                    bold(&vision.store().results_path().display().to_string()),
                );
            }
        }
        Task::Summarize(args) => {
            let config = build_config(args, progress)?;
            let vision = VisionTasks::from_config(&config).context("Failed to set up tasks")?;
            let outcomes = tasks::summarize::run(&vision, &args.common.urls)
                .await
                .context("Summarisation failed")?;

            if !cli.quiet {
                let skipped = outcomes
                    .iter()
                    .filter(|o| **o == SummaryOutcome::Skipped)
                    .count();
                eprintln!(
                    "{}  {} summarised, {} skipped  →  {}",
                    green("✔"),
                    outcomes.len() - skipped,
                    skipped,
                    bold(&args.common.output_dir.display().to_string()),
                );
            }
        }
        Task::Tokens(common) => {
            let mut builder = base_builder(common);
            if let Some(cb) = progress {
                builder = builder.progress_callback(cb);
            }
            let config = builder.build().context("Invalid configuration")?;
            let report = TokenTasks::from_config(&config)
                .context("Failed to set up tasks")?
                .run(&common.urls)
                .await
                .context("Token accounting failed")?;

            if !cli.quiet {
                println!("{}", details_table(&report.details));
                print!("{}", grouped_table(&report.grouped));
                eprintln!(
                    "{}  {} pages  →  {}",
                    green("✔"),
                    report.details.len(),
                    bold(&common.output_dir.display().to_string()),
                );
            }
        }
    }
    Ok(())
}

fn base_builder(common: &CommonArgs) -> edgequake_paperscan::RunConfigBuilder {
    let mut builder = RunConfig::builder()
        .output_dir(&common.output_dir)
        .cache_dir(&common.cache_dir)
        .download_timeout_secs(common.download_timeout);
    if let Some(ref lib) = common.pdfium_lib {
        builder = builder.pdfium_library(lib);
    }
    builder
}

/// Map vision-task args to `RunConfig`.
fn build_config(args: &VisionArgs, progress: Option<ProgressCallback>) -> Result<RunConfig> {
    let mut builder = base_builder(&args.common)
        .skip_existing(args.skip_existing)
        .model(&args.model)
        .max_tokens(args.max_tokens)
        .max_rendered_pixels(args.max_pixels);

    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(t) = args.temperature {
        builder = builder.temperature(t);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn count_unparsed(doc: &DocumentCitations) -> usize {
    match doc {
        DocumentCitations::PerPage(pages) => {
            pages.iter().filter(|p| !p.result.is_parsed()).count()
        }
        DocumentCitations::SingleShot(result) => usize::from(!result.is_parsed()),
    }
}

fn details_table(records: &[PageTokenRecord]) -> String {
    let mut out = format!(
        "{:<32} {:>5} {:>8} {:>10} {:>10} {:>10}\n",
        "pdf", "page", "chars", "non-empty", "o200k", "cl100k"
    );
    for r in records {
        out.push_str(&format!(
            "{:<32} {:>5} {:>8} {:>10} {:>10} {:>10}\n",
            r.pdf, r.page, r.length, r.non_empty_chars, r.o200k_base, r.cl100k_base,
        ));
    }
    out
}

fn grouped_table(rows: &[GroupedRow]) -> String {
    let mut out = format!(
        "{:<32} {:>6} {:>10} {:>10} {:>12} {:>12}\n",
        "pdf", "pages", "chars", "chars/pg", "o200k", "cl100k"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<32} {:>6} {:>10} {:>10.1} {:>12} {:>12}\n",
            row.pdf,
            row.page_count,
            row.length_sum,
            row.length_mean,
            row.o200k_base_sum,
            row.cl100k_base_sum,
        ));
    }
    out
}
