//! rewrite-imports CLI binary entry point.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use serde::Serialize;
use similar::TextDiff;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use rewrite_imports::{apply_plan, ImportRewriter, RewriteError, RuleTable};

const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];
const SKIPPED_DIRS: &[&str] = &["node_modules", "cdk.out"];

/// Rewrite @aws-cdk/* imports to their aws-cdk-lib locations.
#[derive(Parser, Debug)]
#[command(name = "rewrite-imports")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Files or directories to rewrite
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Report files that would change without writing them
    #[arg(long, short)]
    check: bool,

    /// Show a unified diff for every file that changes
    #[arg(long)]
    diff: bool,

    /// Print each rewritten file to stdout instead of writing it back
    #[arg(long, conflicts_with = "check")]
    stdout: bool,

    /// JSON rule table to use instead of the built-in one
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// -----------------------------------------------------------------------------
// Per-file results
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Rewritten,
    Unchanged,
    Failed,
}

#[derive(Debug, Serialize)]
struct FileReport {
    path: PathBuf,
    status: Status,
    replacements: usize,
    insertions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    files: Vec<FileReport>,
    changed: usize,
    failed: usize,
}

struct Outcome {
    report: FileReport,
    original: String,
    rewritten: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: &Cli) -> Result<ExitCode, RewriteError> {
    let rules = match &cli.rules {
        Some(path) => RuleTable::load(path)?,
        None => RuleTable::default(),
    };
    let rewriter = ImportRewriter::new(rules);

    let files = collect_files(&cli.paths)?;
    info!(files = files.len(), "collected source files");

    let write_back = !cli.check && !cli.stdout;
    let outcomes: Vec<Outcome> = files
        .par_iter()
        .map(|path| process_file(&rewriter, path, write_back))
        .collect();

    let mut stdout = io::stdout().lock();
    for outcome in &outcomes {
        if cli.diff && outcome.report.status == Status::Rewritten {
            let old = format!("a/{}", outcome.report.path.display());
            let new = format!("b/{}", outcome.report.path.display());
            let diff = TextDiff::from_lines(outcome.original.as_str(), outcome.rewritten.as_str());
            write!(stdout, "{}", diff.unified_diff().header(&old, &new))
                .map_err(stdout_error)?;
        }
        if cli.stdout && outcome.report.status != Status::Failed {
            write!(stdout, "{}", outcome.rewritten).map_err(stdout_error)?;
        }
    }

    let reports: Vec<FileReport> = outcomes.into_iter().map(|o| o.report).collect();
    let changed = count(&reports, Status::Rewritten);
    let failed = count(&reports, Status::Failed);

    match cli.format {
        Format::Json => {
            let report = Report {
                files: reports,
                changed,
                failed,
            };
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| stdout_error(io::Error::other(e)))?;
            if cli.stdout {
                eprintln!("{}", json);
            } else {
                writeln!(stdout, "{}", json).map_err(stdout_error)?;
            }
        }
        Format::Text => print_summary(&reports, cli.check, changed, failed),
    }
    stdout.flush().map_err(stdout_error)?;

    Ok(if failed > 0 {
        ExitCode::from(2)
    } else if cli.check && changed > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn process_file(rewriter: &ImportRewriter, path: &Path, write_back: bool) -> Outcome {
    match rewrite_file(rewriter, path, write_back) {
        Ok(outcome) => outcome,
        Err(e) => Outcome {
            report: FileReport {
                path: path.to_path_buf(),
                status: Status::Failed,
                replacements: 0,
                insertions: 0,
                error: Some(e.to_string()),
            },
            original: String::new(),
            rewritten: String::new(),
        },
    }
}

fn rewrite_file(
    rewriter: &ImportRewriter,
    path: &Path,
    write_back: bool,
) -> Result<Outcome, RewriteError> {
    let io_error = |source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let original = fs::read_to_string(path).map_err(io_error)?;
    let plan = rewriter.plan(&original, &path.to_string_lossy())?;
    let rewritten = apply_plan(&original, &plan)?;

    let status = if rewritten == original {
        Status::Unchanged
    } else {
        if write_back {
            fs::write(path, &rewritten).map_err(io_error)?;
            debug!(path = %path.display(), "wrote rewritten file");
        }
        Status::Rewritten
    };

    Ok(Outcome {
        report: FileReport {
            path: path.to_path_buf(),
            status,
            replacements: plan.text_replacements.len(),
            insertions: plan.leading_insertions.len(),
            error: None,
        },
        original,
        rewritten,
    })
}

fn print_summary(reports: &[FileReport], check: bool, changed: usize, failed: usize) {
    for report in reports {
        match report.status {
            Status::Rewritten if check => eprintln!("would rewrite: {}", report.path.display()),
            Status::Rewritten => eprintln!("rewrote: {}", report.path.display()),
            Status::Failed => eprintln!(
                "error: {}",
                report.error.as_deref().unwrap_or("unknown error")
            ),
            Status::Unchanged => {}
        }
    }
    let verb = if check { "would be rewritten" } else { "rewritten" };
    eprintln!(
        "{} file(s) {}, {} unchanged, {} failed",
        changed,
        verb,
        reports.len() - changed - failed,
        failed
    );
}

fn count(reports: &[FileReport], status: Status) -> usize {
    reports.iter().filter(|r| r.status == status).count()
}

fn stdout_error(source: io::Error) -> RewriteError {
    RewriteError::Io {
        path: PathBuf::from("<stdout>"),
        source,
    }
}

// -----------------------------------------------------------------------------
// File discovery
// -----------------------------------------------------------------------------

/// Expand `paths` into source files. Explicit files are taken as given;
/// directories are walked in file-name order.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, RewriteError> {
    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e));
        for entry in walker {
            let entry = entry.map_err(|err| RewriteError::Io {
                path: err.path().map_or_else(|| root.clone(), Path::to_path_buf),
                source: err.into(),
            })?;
            if entry.file_type().is_file() && has_source_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&&*name)
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}
