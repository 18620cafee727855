//! CLI binary for pdf2md-outline.
//!
//! A thin shim over the library crate that maps CLI flags and an optional
//! YAML config file to `ConversionConfig` and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2md_outline::{
    convert, ConversionConfig, ConversionProgressCallback, ConversionStats, ProgressCallback,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar advancing per written section, with a
/// log line per section printed above it.
struct CliProgressCallback {
    bar: ProgressBar,
    image_errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` reports the section count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            image_errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} sections  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_sections: usize) {
        self.activate_bar(total_sections);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Writing {total_sections} sections…"))
        ));
    }

    fn on_section_start(&self, _index: usize, _total: usize, id: &str, title: &str) {
        self.bar.set_message(format!("{id} {title}"));
    }

    fn on_section_complete(&self, index: usize, total: usize, chunk_count: usize) {
        self.bar.println(format!(
            "  {} Section {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{chunk_count} chunks")),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, page: usize, error: &str) {
        self.image_errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} Image on page {:>3}  {}", red("✗"), page, red(&msg)));
    }

    fn on_conversion_complete(&self, _total_sections: usize, _total_chunks: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Sectioned Markdown next to report.md (report/, report/images/)
  pdf2md-outline report.pdf out/report.md

  # Custom chunking from a config file
  pdf2md-outline -c config.yaml book.pdf out/book.md

  # Machine-readable summary
  pdf2md-outline --json paper.pdf out/paper.md > stats.json

CONFIG FILE (all keys optional):
  margins:    { header_margin: 50.0, footer_margin: 50.0 }
  chunking:   { max_chars: 4000, overlap_chars: 200, toc_level: 6, keep_full_file: true }
  images:     { min_size: 100, formats: [png, jpg, jpeg], output_dir: images }
  formatting: { max_newlines: 2 }

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (file or directory)
  RUST_LOG          Overrides the log filter, e.g. RUST_LOG=pdf2md_outline=debug
"#;

/// Convert a PDF into section-chunked Markdown using its outline.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md-outline",
    version,
    about = "Convert a PDF into section-chunked Markdown using its outline",
    long_about = "Split a PDF along its bookmarks (outline) into one directory per top-level \
section, with each section written as size-bounded Markdown chunk files. Running headers and \
footers are dropped by position, embedded images are extracted and referenced inline.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input PDF file.
    pdf_path: PathBuf,

    /// Full-document Markdown path; chunks go to the sibling directory named after its stem.
    output_path: PathBuf,

    /// YAML configuration file.
    #[arg(short, long, env = "PDF2MD_CONFIG")]
    config: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2MD_PASSWORD")]
    password: Option<String>,

    /// Print conversion statistics as JSON on stdout.
    #[arg(long, env = "PDF2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2MD_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", red("✘"), e);
            ExitCode::FAILURE
        }
    }
}

fn show_progress(cli: &Cli) -> bool {
    !cli.quiet && !cli.no_progress && !cli.json
}

fn init_logging(cli: &Cli) {
    // Library INFO logs are noise while the bar is on screen.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress(cli) {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress(cli) {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(cli, progress_cb)?;

    let stats = convert(&cli.pdf_path, &cli.output_path, &config)
        .await
        .with_context(|| format!("Conversion of {} failed", cli.pdf_path.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(cli, &stats);
    }
    Ok(())
}

/// Load the config file (if any) and apply CLI-only settings.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut config = match cli.config {
        Some(ref path) => ConversionConfig::from_yaml_file(path)?,
        None => ConversionConfig::default(),
    };
    config.password = cli.password.clone();
    config.progress_callback = progress;
    Ok(config)
}

fn print_summary(cli: &Cli, stats: &ConversionStats) {
    let base = pdf2md_outline::output_base_dir(&cli.output_path);
    let mark = if stats.image_errors.is_empty() {
        green("✔")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{}  {} sections  {} chunks  {}ms  →  {}",
        mark,
        stats.sections,
        stats.chunks_written,
        stats.total_duration_ms,
        bold(&base.display().to_string()),
    );
    eprintln!(
        "   {} pages  /  {} images saved  /  {} skipped  /  {} failed",
        dim(&stats.total_pages.to_string()),
        dim(&stats.images_saved.to_string()),
        dim(&stats.images_skipped.to_string()),
        dim(&stats.image_errors.len().to_string()),
    );
    if !stats.used_outline {
        eprintln!("   {} no outline, document chunked as a whole", cyan("⚠"));
    }
    for dup in &stats.duplicate_sections {
        eprintln!(
            "   {} duplicate section id {}: '{}' replaced '{}'",
            cyan("⚠"),
            dup.id,
            dup.title,
            dup.previous_title
        );
    }
    if let Some(ref full) = stats.full_file {
        eprintln!("   full document: {}", dim(&full.display().to_string()));
    }
}
