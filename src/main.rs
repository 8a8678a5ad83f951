use std::path::PathBuf;

use clap::{Parser, Subcommand};
use novel_tracker::config::Config;
use novel_tracker::io::folder::FolderSource;
use novel_tracker::io::workbook::XlsxWorkbook;
use novel_tracker::jobs;
use novel_tracker::model::SheetKind;
use novel_tracker::reconcile::{Difference, RecordOutcome};
use novel_tracker::store::SystemClock;
use novel_tracker::{Result, TrackerError};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
    if let Err(err) = run(cli) {
        error!(error = %err, "run failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| TrackerError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(workbook) = cli.workbook {
        config.workbook = workbook;
    }
    if let Some(documents) = cli.documents {
        config.documents_dir = documents;
    }

    match cli.command {
        Command::Daily => execute_record(&config, SheetKind::Daily),
        Command::Hourly => execute_record(&config, SheetKind::Hourly),
        Command::Count => {
            let documents = FolderSource::new(&config.documents_dir)?;
            let total = jobs::count(&documents)?;
            println!("{total}");
            Ok(())
        }
        Command::Status => {
            let mut workbook = XlsxWorkbook::open(&config.workbook)?;
            let report = jobs::status(&config, &mut workbook, &SystemClock)?;
            print!("{report}");
            Ok(())
        }
        Command::Init { force } => {
            let mut workbook = if config.workbook.exists() && !force {
                XlsxWorkbook::open(&config.workbook)?
            } else {
                XlsxWorkbook::create(&config.workbook)
            };
            jobs::init_workbook(&config, &mut workbook)?;
            println!("initialised {}", config.workbook.display());
            Ok(())
        }
    }
}

fn execute_record(config: &Config, kind: SheetKind) -> Result<()> {
    let mut workbook = XlsxWorkbook::open(&config.workbook)?;
    let documents = FolderSource::new(&config.documents_dir)?;
    let outcome = jobs::record(kind, config, &mut workbook, &documents, &SystemClock)?;
    println!("{}", describe(kind, &outcome));
    Ok(())
}

fn describe(kind: SheetKind, outcome: &RecordOutcome) -> String {
    let action = if outcome.appended { "appended" } else { "updated" };
    match outcome.difference {
        Difference::NotApplicable => {
            format!("{kind}: {action} row {} (difference N/A)", outcome.row)
        }
        Difference::Deferred { value, .. } => {
            format!("{kind}: {action} row {} (difference {value:+})", outcome.row)
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Record manuscript character counts in a tracking workbook."
)]
struct Cli {
    /// JSON configuration file. Defaults to ./novel-tracker.json when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Workbook path, overriding the configuration.
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,

    /// Manuscript directory, overriding the configuration.
    #[arg(long, global = true)]
    documents: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record today's count, updating today's row if it exists.
    Daily,
    /// Append the current count with a timestamp.
    Hourly,
    /// Print the current character count.
    Count,
    /// Show progress toward the configured goals.
    Status,
    /// Create the tracking sheets.
    Init {
        /// Replace an existing workbook instead of adding missing sheets.
        #[arg(long)]
        force: bool,
    },
}
