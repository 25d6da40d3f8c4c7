//! CLI binary for transcript-credits.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `AuditConfig` and prints the credit summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use transcript_credits::{
    audit_file, export_csv, AuditConfig, AuditError, AuditReport, CourseRecord, CreditGap,
    Credits, RetakePolicyKind,
};

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
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

/// Exit status when the document has no readable course rows.
const EXIT_NO_RECORDS: u8 = 2;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Total the passed credits of a transcript
  credit-audit transcript.pdf

  # Graduate programme: 36 credits, pass mark 70
  credit-audit --target 36 --pass-score 70 transcript.docx

  # Save passed.csv / failed.csv next to the summary
  credit-audit transcript.pdf --csv-dir ./out

  # Machine-readable report
  credit-audit --json transcript.pdf > report.json

RETAKE POLICIES:
  latest-term   later term wins, else better grade (default)
  best-grade    better grade wins, terms ignored
  last-listed   the attempt printed last wins

ENVIRONMENT VARIABLES:
  CREDIT_AUDIT_TARGET         Graduation target credits
  CREDIT_AUDIT_PASS_SCORE     Minimum passing score (0-100)
  CREDIT_AUDIT_RETAKE_POLICY  latest-term | best-grade | last-listed
  CREDIT_AUDIT_CSV_DIR        Directory for CSV export
  PDFIUM_LIB_PATH             Path to libpdfium (file or directory)
  RUST_LOG                    Log filter, overrides -v / -q
"#;

/// Total the passed credits of a PDF or DOCX transcript.
#[derive(Parser, Debug)]
#[command(
    name = "credit-audit",
    version,
    about = "Total the passed credits of a PDF or DOCX transcript",
    long_about = "Read the course tables of a transcript (PDF or DOCX), resolve retaken \
courses, and report passed and failed courses with the exact credit total against a \
graduation target.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Transcript file (.pdf or .docx).
    input: PathBuf,

    /// Graduation target in credits (e.g. 128 or 132.5).
    #[arg(long, env = "CREDIT_AUDIT_TARGET", default_value = "128",
          value_parser = parse_credits)]
    target: Credits,

    /// Minimum passing numeric score (0–100).
    #[arg(long, env = "CREDIT_AUDIT_PASS_SCORE", default_value_t = 60,
          value_parser = clap::value_parser!(u32).range(0..=100))]
    pass_score: u32,

    /// Which attempt of a retaken course counts.
    #[arg(long, env = "CREDIT_AUDIT_RETAKE_POLICY", value_enum, default_value = "latest-term")]
    retake_policy: RetakeArg,

    /// Write passed.csv and failed.csv into this directory.
    #[arg(long, env = "CREDIT_AUDIT_CSV_DIR")]
    csv_dir: Option<PathBuf>,

    /// Output the full report as JSON instead of the summary.
    #[arg(long, env = "CREDIT_AUDIT_JSON")]
    json: bool,

    /// Path to libpdfium (file or containing directory).
    #[arg(long, env = "CREDIT_AUDIT_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// PDF user password for encrypted transcripts.
    #[arg(long, env = "CREDIT_AUDIT_PASSWORD")]
    password: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CREDIT_AUDIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "CREDIT_AUDIT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum RetakeArg {
    LatestTerm,
    BestGrade,
    LastListed,
}

impl From<RetakeArg> for RetakePolicyKind {
    fn from(v: RetakeArg) -> Self {
        match v {
            RetakeArg::LatestTerm => RetakePolicyKind::LatestTermThenBestGrade,
            RetakeArg::BestGrade => RetakePolicyKind::BestGrade,
            RetakeArg::LastListed => RetakePolicyKind::LastListed,
        }
    }
}

fn parse_credits(s: &str) -> std::result::Result<Credits, String> {
    s.parse::<Credits>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers the quiet stretch; library INFO logs would only
    // interleave with it.
    let show_progress = !cli.quiet && !cli.json;
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

    let config = build_config(&cli)?;

    let spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Reading");
        bar.set_message(cli.input.display().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let outcome = audit_file(&cli.input, &config).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {}", red("✘"), e.user_message());
            tracing::debug!("{e:?}");
            return Ok(ExitCode::FAILURE);
        }
    };

    if !report.has_records() {
        eprintln!(
            "{} {}",
            yellow("⚠"),
            AuditError::NoRecordsFound {
                grids: report.stats.grids
            }
            .user_message()
        );
        return Ok(ExitCode::from(EXIT_NO_RECORDS));
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else {
        print_summary(&report, cli.quiet);
    }

    if let Some(ref dir) = cli.csv_dir {
        let (passed, failed) = export_csv(&report, dir)
            .await
            .with_context(|| format!("Failed to write CSV files to {}", dir.display()))?;
        if !cli.quiet {
            eprintln!(
                "{} wrote {} and {}",
                green("✔"),
                bold(&passed.display().to_string()),
                bold(&failed.display().to_string())
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `AuditConfig`.
fn build_config(cli: &Cli) -> Result<AuditConfig> {
    let mut builder = AuditConfig::builder()
        .target_credits(cli.target)
        .pass_score(cli.pass_score)
        .retake_policy(cli.retake_policy.into());

    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &AuditReport, quiet: bool) {
    let result = &report.result;

    if !quiet {
        println!(
            "{}",
            bold(&format!("Passed ({} courses)", result.passed.len()))
        );
        print_records(&result.passed);
        println!();
        println!(
            "{}",
            bold(&format!("Failed ({} courses)", result.failed.len()))
        );
        print_records(&result.failed);
        println!();
    }

    println!(
        "Total passed credits: {}",
        bold(&result.total_credits.to_string())
    );
    println!("Graduation target:    {}", report.target_credits);
    match report.credit_gap() {
        CreditGap::Remaining(c) => println!("Remaining:            {}", red(&c.to_string())),
        CreditGap::Exceeded(c) => println!("Exceeded by:          {}", green(&c.to_string())),
    }

    if !quiet && !report.warnings.is_empty() {
        eprintln!();
        eprintln!(
            "{} {} rows could not be read:",
            yellow("⚠"),
            report.warnings.len()
        );
        for w in &report.warnings {
            eprintln!("  {}", dim(&w.to_string()));
        }
    }
}

fn print_records(records: &[CourseRecord]) {
    if records.is_empty() {
        println!("  {}", dim("(none)"));
        return;
    }
    for r in records {
        let term = r
            .term
            .as_ref()
            .map(|t| dim(&format!("  [{t}]")))
            .unwrap_or_default();
        println!(
            "  {:<32} {:>6}  {:<8}{}",
            r.course_name, r.credit.to_string(), r.grade.as_str(), term
        );
    }
}
