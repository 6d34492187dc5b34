//! CLI binary for corpus2md.
//!
//! A thin shim over the library crate: maps flags onto `ExtractionConfig`,
//! runs one extractor with a terminal progress bar, and prints the summary.
//! `serve` starts the HTTP job service instead.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use corpus2md::server::{serve, AppState, ServerOptions};
use corpus2md::{
    analyze_corpus, extract_legacy_records, extract_remote_to_paged_document, extract_tabular,
    ExtractionConfig, ExtractionProgress, ExtractionStatus, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, BufRead, Write};
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

/// Terminal progress callback. Starts as a spinner and turns into a bar once
/// the extractor reports how many records it will attempt.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Print a line per written record (`--verbose`).
    per_record: bool,
}

impl CliProgressCallback {
    fn new_dynamic(per_record: bool) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening source…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            per_record,
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} records  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }
}

impl ExtractionProgress for CliProgressCallback {
    fn on_batch_start(&self, total_records: Option<usize>) {
        match total_records {
            Some(total) => {
                self.activate_bar(total);
                self.bar.println(format!(
                    "{} {}",
                    cyan("◆"),
                    bold(&format!("Extracting {total} records…"))
                ));
            }
            None => {
                self.bar.set_prefix("Extracting");
                self.bar.set_message("fetching…");
            }
        }
    }

    fn on_message(&self, message: &str) {
        self.bar.println(format!("  {} {}", dim("·"), message));
    }

    fn on_record_complete(&self, ordinal: usize, identifier: &str) {
        if self.per_record {
            self.bar
                .println(format!("  {} {:>5}  {}", green("✓"), ordinal, dim(identifier)));
        }
        self.bar.set_message(identifier.to_string());
        self.bar.inc(1);
    }

    fn on_record_skipped(&self, ordinal: usize, identifier: &str) {
        if self.per_record {
            self.bar.println(format!(
                "  {} {:>5}  {}  {}",
                cyan("↷"),
                ordinal,
                dim(identifier),
                dim("(exists)")
            ));
        }
        self.bar.inc(1);
    }

    fn on_record_error(&self, ordinal: usize, error: &str) {
        self.bar
            .println(format!("  {} {:>5}  {}", red("✗"), ordinal, red(error)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} records written",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} records written  ({} failed)",
                if succeeded == 0 { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
                succeeded + failed,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Sample 1000 rows of a Parquet corpus into Markdown
  corpus2md tabular papers.parquet -o extracted_papers -n 1000 --seed 42

  # Split a legacy fielded corpus into one Markdown file per record
  corpus2md legacy CISI.ALL -o cisi_papers

  # Pull 20 random Wikipedia articles into PDFs
  corpus2md remote --source-id wikipedia:en --limit 20 -o remote_documents

  # Render a JSON Lines dump into PDFs
  corpus2md remote --source-id dump.jsonl -o remote_documents

  # Token statistics for a remote corpus
  corpus2md analyze --source-id wikipedia:en --limit 50 --json

  # Remove generated PDFs without prompting
  corpus2md cleanup remote_documents --ext pdf --force

  # Run the HTTP job service
  corpus2md serve --port 4000

REMOTE SOURCES:
  wikipedia:<lang>     random articles from <lang>.wikipedia.org
  <path or URL>.jsonl  one JSON object per line: doc_id|id, title, text, body, url

ENVIRONMENT VARIABLES:
  RUST_LOG                     Override the log filter (e.g. corpus2md=debug)
  CORPUS2MD_OUTPUT_DIR         Default output directory for extraction commands
  CORPUS2MD_REQUEST_DELAY_MS   Pause between remote requests
  CORPUS2MD_REQUEST_TIMEOUT    Per-request timeout for remote catalogs (seconds)
  CORPUS2MD_DOWNLOAD_TIMEOUT   Timeout for downloading a source from a URL (seconds)
  CORPUS2MD_HOST / _PORT       Listener for `serve`
"#;

/// Normalize heterogeneous corpora into Markdown and paged documents.
#[derive(Parser, Debug)]
#[command(
    name = "corpus2md",
    version,
    about = "Normalize tabular, legacy, and remote corpora into Markdown and PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs and per-record lines.
    #[arg(short, long, global = true, env = "CORPUS2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the final summary.
    #[arg(short, long, global = true, env = "CORPUS2MD_QUIET")]
    quiet: bool,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "CORPUS2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Print the summary as JSON on stdout.
    #[arg(long, global = true, env = "CORPUS2MD_JSON")]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP job service.
    Serve {
        #[arg(long, env = "CORPUS2MD_HOST", default_value = "0.0.0.0")]
        host: String,

        #[arg(long, env = "CORPUS2MD_PORT", default_value_t = 4000)]
        port: u16,

        /// Largest accepted upload, in MiB.
        #[arg(long, env = "CORPUS2MD_MAX_UPLOAD_MB", default_value_t = 512)]
        max_upload_mb: usize,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Sample rows of a Parquet file into Markdown documents.
    Tabular {
        /// Local Parquet file or HTTP/HTTPS URL.
        source: String,

        #[arg(short, long, env = "CORPUS2MD_OUTPUT_DIR", default_value = "extracted_papers")]
        output_dir: PathBuf,

        /// Number of rows to sample.
        #[arg(short, long, default_value_t = 1000)]
        num_papers: usize,

        /// Seed for the row sampler.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Drop string metadata values longer than this many characters.
        #[arg(long)]
        max_metadata_len: Option<usize>,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Split a marker-delimited legacy corpus into Markdown documents.
    Legacy {
        /// Local corpus file.
        source: PathBuf,

        #[arg(short, long, env = "CORPUS2MD_OUTPUT_DIR", default_value = "cisi_papers")]
        output_dir: PathBuf,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Render remote documents into PDFs.
    Remote {
        /// `wikipedia:<lang>`, or a JSON Lines dump path or URL.
        #[arg(long, env = "CORPUS2MD_SOURCE_ID")]
        source_id: String,

        /// Documents to pull (capped by --max-documents).
        #[arg(short, long, default_value_t = 100)]
        limit: usize,

        #[arg(short, long, env = "CORPUS2MD_OUTPUT_DIR", default_value = "remote_documents")]
        output_dir: PathBuf,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Token statistics over a remote corpus.
    Analyze {
        #[arg(long, env = "CORPUS2MD_SOURCE_ID")]
        source_id: String,

        /// Documents to read; unlimited for dumps, the catalog ceiling otherwise.
        #[arg(short, long)]
        limit: Option<usize>,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Delete files with one extension from a directory.
    Cleanup {
        dir: PathBuf,

        /// Extension to remove, without the dot.
        #[arg(long, default_value = "pdf")]
        ext: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },
}

/// Knobs shared by every command that builds an `ExtractionConfig`.
#[derive(Args, Debug, Clone)]
struct LimitArgs {
    /// Hard ceiling on documents pulled from a remote source.
    #[arg(long, env = "CORPUS2MD_MAX_DOCUMENTS", default_value_t = 500)]
    max_documents: usize,

    /// Pause between remote requests, in milliseconds.
    #[arg(long, env = "CORPUS2MD_REQUEST_DELAY_MS", default_value_t = 1000)]
    request_delay_ms: u64,

    /// Per-request timeout for remote catalogs, in seconds.
    #[arg(long, env = "CORPUS2MD_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    /// Timeout for downloading a source from a URL, in seconds.
    #[arg(long, env = "CORPUS2MD_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar owns stderr while it runs; library INFO lines would
    // tear it, so only errors get through unless --verbose.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    // serve and cleanup never draw a bar.
    let extracting = !matches!(cli.command, Command::Serve { .. } | Command::Cleanup { .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || (show_progress && extracting) {
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

    let progress: Option<ProgressCallback> = if show_progress && extracting {
        Some(CliProgressCallback::new_dynamic(cli.verbose) as ProgressCallback)
    } else {
        None
    };

    match &cli.command {
        Command::Serve {
            host,
            port,
            max_upload_mb,
            limits,
        } => {
            let config = build_config(limits, None, None)?;
            let options = ServerOptions {
                host: host.clone(),
                port: *port,
                max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            };
            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime
                .block_on(serve(options, AppState::new(config)))
                .context("Server failed")?;
        }

        Command::Tabular {
            source,
            output_dir,
            num_papers,
            seed,
            max_metadata_len,
            limits,
        } => {
            let config = build_config(limits, progress, *max_metadata_len)?;
            let summary = extract_tabular(source, output_dir, *num_papers, *seed, &config)
                .context("Tabular extraction failed")?;
            if let Some(schema) = &summary.schema {
                note(&cli, &format!(
                    "content column: {}  title column: {}",
                    bold(&schema.content_column),
                    schema.title_column.as_deref().unwrap_or("-")
                ));
            }
            report(&cli, &summary, || {
                format!(
                    "Wrote {}/{} records to {}",
                    summary.written,
                    summary.records_seen,
                    summary.output_dir.display()
                )
            })?;
        }

        Command::Legacy {
            source,
            output_dir,
            limits,
        } => {
            let config = build_config(limits, progress, None)?;
            let summary = extract_legacy_records(source, output_dir, &config)
                .context("Legacy extraction failed")?;
            report(&cli, &summary, || {
                format!(
                    "Wrote {}/{} records to {}",
                    summary.written,
                    summary.records_seen,
                    summary.output_dir.display()
                )
            })?;
        }

        Command::Remote {
            source_id,
            limit,
            output_dir,
            limits,
        } => {
            let config = build_config(limits, progress, None)?;
            let summary = extract_remote_to_paged_document(output_dir, source_id, *limit, &config)
                .context("Remote extraction failed")?;
            report(&cli, &summary, || {
                format!(
                    "{} documents from {}: {} created, {} already present, {} errors",
                    summary.docs_extracted,
                    summary.source_id,
                    summary.files_created,
                    summary.files_skipped,
                    summary.error_count
                )
            })?;
            if summary.status == ExtractionStatus::Failed {
                bail!("No document from {} could be rendered", summary.source_id);
            }
        }

        Command::Analyze {
            source_id,
            limit,
            limits,
        } => {
            let config = build_config(limits, progress, None)?;
            let stats = analyze_corpus(source_id, *limit, &config).context("Analysis failed")?;
            report(&cli, &stats, || {
                format!(
                    "{} documents, {} tokens (avg {:.1}, min {}, max {})",
                    stats.document_count,
                    stats.total_tokens,
                    stats.average_tokens_per_doc,
                    stats.min_tokens,
                    stats.max_tokens
                )
            })?;
        }

        Command::Cleanup { dir, ext, force } => {
            let removed = cleanup(dir, ext, *force)?;
            if !cli.quiet {
                eprintln!("{} removed {} file(s)", green("✔"), bold(&removed.to_string()));
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(
    limits: &LimitArgs,
    progress: Option<ProgressCallback>,
    max_metadata_len: Option<usize>,
) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .remote_max_documents(limits.max_documents)
        .request_delay_ms(limits.request_delay_ms)
        .request_timeout_secs(limits.request_timeout)
        .download_timeout_secs(limits.download_timeout)
        .max_metadata_text_len(max_metadata_len);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn note(cli: &Cli, line: &str) {
    if !cli.quiet && !cli.json {
        eprintln!("   {line}");
    }
}

/// Print a summary as JSON on stdout, or as one human line on stderr.
fn report<T: Serialize>(cli: &Cli, value: &T, human: impl FnOnce() -> String) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(value).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!("{}", human());
    }
    Ok(())
}

/// Remove every `*.{ext}` file directly inside `dir`. Returns how many went.
fn cleanup(dir: &Path, ext: &str, force: bool) -> Result<usize> {
    if !dir.is_dir() {
        bail!("Directory {:?} does not exist", dir);
    }
    let ext = ext.trim_start_matches('.');

    let mut targets: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == ext))
        .collect();
    targets.sort();

    if targets.is_empty() {
        eprintln!("{} no .{ext} files in {}", dim("·"), dir.display());
        return Ok(0);
    }

    if !force && !confirm(&format!(
        "Delete {} .{ext} file(s) from {}? [y/N] ",
        targets.len(),
        dir.display()
    ))? {
        eprintln!("{}", dim("Aborted."));
        return Ok(0);
    }

    for path in &targets {
        std::fs::remove_file(path).with_context(|| format!("Failed to remove {:?}", path))?;
        tracing::debug!("removed {}", path.display());
    }
    Ok(targets.len())
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt}");
    io::stderr().flush().ok();
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
