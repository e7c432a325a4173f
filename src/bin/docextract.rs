//! CLI binary for edgequake-docextract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docextract::{
    extract_async, extract_to_file, inspect, DocumentKind, ExtractionConfig,
    ExtractionProgressCallback, ExtractionStats, ProgressCallback, RecognitionMode, Strategy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

/// Terminal progress callback: a spinner while the input is classified and
/// checked for a text layer, switching to a page bar once OCR starts.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the page currently being recognised.
    page_start: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_start: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        if self.bar.length() == Some(total as u64) {
            return;
        }
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("OCR");
        self.bar.reset_eta();
    }

    fn page_elapsed_secs(&self) -> f64 {
        self.page_start
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, kind: DocumentKind) {
        self.bar.set_message(format!("Reading {kind}…"));
    }

    fn on_page_start(&self, page_num: usize, total: usize) {
        self.activate_bar(total);
        if let Ok(mut s) = self.page_start.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        let elapsed = self.page_elapsed_secs();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed = self.page_elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(79) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, strategy: Strategy, content_len: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} chars extracted ({})",
                green("✔"),
                bold(&content_len.to_string()),
                strategy
            );
        } else {
            eprintln!(
                "{} {} chars extracted ({})  {} pages degraded",
                cyan("⚠"),
                bold(&content_len.to_string()),
                strategy,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Text-layer or scanned PDF (stdout)
  docextract datasheet.pdf

  # Write to file
  docextract scan.pdf -o scan.txt

  # Spreadsheet stored without an extension
  docextract upload.bin --type xlsx

  # Photo of a label, sparse text
  docextract label.jpg --psm 11

  # How would this file be handled? (no OCR)
  docextract --inspect-only datasheet.pdf

  # JSON output with strategy and per-page errors
  docextract --json scan.pdf > out.json

  # Bound latency for a service wrapper
  docextract --timeout 120 big-scan.pdf

TYPE HINTS:
  Matched case-insensitively as substrings, first match wins:
    pdf                              → PDF (text layer, else OCR)
    image, png, jpeg, jpg            → image OCR
    csv                              → CSV table
    spreadsheet, excel, xlsx, xls    → first worksheet
  Without --type the file extension is used.

RECOGNITION MODES (--psm):
  3   fully automatic page segmentation
  4   single column of text
  6   single uniform block of text (default)
  7   single text line
  11  sparse text

ENVIRONMENT VARIABLES:
  Every flag can be set with DOCEXTRACT_<FLAG>, e.g. DOCEXTRACT_DPI=200.
  RUST_LOG                 Override log filter (e.g. edgequake_docextract=debug)

SETUP:
  PDFs need the pdfium shared library: https://github.com/bblanchon/pdfium-binaries
  OCR needs tesseract: apt install tesseract-ocr / brew install tesseract
"#;

/// Extract plain text from PDFs, scans, images, CSV and spreadsheets.
#[derive(Parser, Debug)]
#[command(
    name = "docextract",
    version,
    about = "Extract plain text from PDFs, scans, images, CSV and spreadsheets",
    long_about = "Extract normalised plain text from documents. PDFs with a text layer are read \
directly; scanned PDFs and images are rasterised, cleaned up and run through Tesseract; CSV and \
spreadsheets are rendered as fixed-width tables. Fails when nothing could be extracted.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path.
    input: PathBuf,

    /// Type hint (pdf, image/png, text/csv, xlsx, …). Defaults to the file extension.
    #[arg(long = "type", env = "DOCEXTRACT_TYPE")]
    type_hint: Option<String>,

    /// Write text to this file instead of stdout.
    #[arg(short, long, env = "DOCEXTRACT_OUTPUT")]
    output: Option<PathBuf>,

    /// Output structured JSON (Extraction) instead of plain text.
    #[arg(long, env = "DOCEXTRACT_JSON")]
    json: bool,

    /// Classify the input and report the strategy, no OCR.
    #[arg(long, env = "DOCEXTRACT_INSPECT_ONLY")]
    inspect_only: bool,

    /// Rasterisation DPI for scanned PDFs (72–600).
    #[arg(long, env = "DOCEXTRACT_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Tesseract page segmentation mode: 3, 4, 6, 7 or 11.
    #[arg(long, env = "DOCEXTRACT_PSM", default_value_t = 6)]
    psm: u8,

    /// Tesseract executable.
    #[arg(long, env = "DOCEXTRACT_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Tesseract language data directory.
    #[arg(long, env = "DOCEXTRACT_TESSDATA_DIR")]
    tessdata_dir: Option<PathBuf>,

    /// Path to libpdfium. Defaults to the system library path.
    #[arg(long, env = "DOCEXTRACT_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCEXTRACT_PASSWORD")]
    password: Option<String>,

    /// Give up after this many seconds.
    #[arg(long, env = "DOCEXTRACT_TIMEOUT")]
    timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCEXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCEXTRACT_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCEXTRACT_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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

    let type_hint = resolve_type_hint(&cli);

    let progress = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };
    let config = build_config(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn ExtractionProgressCallback>),
    )?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&cli.input, &type_hint, &config).context("Failed to inspect input")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize inspection")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            println!("Kind:         {}", info.kind);
            println!("Strategy:     {}", info.strategy);
            if let Some(n) = info.page_count {
                println!("Pages:        {}", n);
            }
            if let Some(t) = info.has_text_layer {
                println!("Text layer:   {}", if t { "yes" } else { "no" });
            }
        }
        return Ok(());
    }

    // ── Run extraction ───────────────────────────────────────────────────
    let run = run_extraction(&cli, &type_hint, &config);
    let result = match cli.timeout {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), run).await {
            Ok(r) => r,
            Err(_) => {
                if let Some(ref cb) = progress {
                    cb.bar.finish_and_clear();
                }
                eprintln!("{} Extraction timed out after {secs}s", red("Error:"));
                // The blocking extraction task cannot be cancelled and runtime
                // shutdown would wait for it.
                std::process::exit(1);
            }
        },
        None => run.await,
    };

    if let Some(ref cb) = progress {
        cb.bar.finish_and_clear();
    }
    result
}

/// Extract and print (or write) the result.
async fn run_extraction(cli: &Cli, type_hint: &str, config: &ExtractionConfig) -> Result<()> {
    if let Some(ref output_path) = cli.output {
        let input = cli.input.clone();
        let hint = type_hint.to_string();
        let out = output_path.clone();
        let cfg = config.clone();
        let stats = tokio::task::spawn_blocking(move || extract_to_file(&input, &hint, &out, &cfg))
            .await
            .context("Extraction task failed")?
            .context("Extraction failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
            );
        } else if !cli.quiet {
            print_summary(&stats, Some(output_path));
        }
        return Ok(());
    }

    let output = extract_async(&cli.input, type_hint, config)
        .await
        .context("Extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.content.as_bytes())
            .and_then(|_| handle.write_all(b"\n"))
            .context("Failed to write to stdout")?;

        if !cli.quiet && (cli.no_progress || cli.verbose) {
            print_summary(&output.stats, None);
        }
    }
    Ok(())
}

fn print_summary(stats: &ExtractionStats, output_path: Option<&Path>) {
    let mark = if stats.degraded_pages() == 0 {
        green("✔")
    } else {
        cyan("⚠")
    };
    let target = output_path
        .map(|p| format!("  →  {}", bold(&p.display().to_string())))
        .unwrap_or_default();
    if stats.total_pages > 0 {
        eprintln!(
            "{}  {}/{} pages  {}ms{}",
            mark, stats.contributing_pages, stats.total_pages, stats.duration_ms, target
        );
    } else {
        eprintln!("{}  {}ms{}", mark, stats.duration_ms, target);
    }
    for e in &stats.page_errors {
        eprintln!("   {}", dim(&e.to_string()));
    }
}

/// `--type` if given, otherwise the input's extension.
fn resolve_type_hint(cli: &Cli) -> String {
    cli.type_hint.clone().unwrap_or_else(|| {
        cli.input
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mode = RecognitionMode::from_psm(cli.psm)
        .with_context(|| format!("Unsupported --psm {} (use 3, 4, 6, 7 or 11)", cli.psm))?;

    let mut builder = ExtractionConfig::builder()
        .dpi(cli.dpi)
        .recognition_mode(mode)
        .tesseract_cmd(cli.tesseract.clone());

    if let Some(ref dir) = cli.tessdata_dir {
        builder = builder.tessdata_dir(dir.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    if let Some(ref pw) = cli.password {
        builder = builder.password(pw.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
