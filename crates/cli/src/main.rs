mod config;
mod demo;
mod error;

use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use clap::{ArgAction, Parser, Subcommand};
use journal::{Event, EventKind, Journal, ScopeId};
use tracing_subscriber::EnvFilter;

use config::Config;
use demo::{ChainOptions, Console, DemoOptions};
use error::{Error, Result};

#[derive(Parser)]
#[command(name = "scoped")]
#[command(about = "Demonstrates guaranteed, ordered resource release", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./scoped.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON Lines journal to append lifecycle events to, or read them from
    #[arg(long, global = true)]
    journal: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire one resource, run a body, and print lifecycle markers
    Demo {
        /// Make the body fail
        #[arg(long)]
        fail_body: bool,
        /// Make the release fail
        #[arg(long)]
        fail_release: bool,
        /// Acquire this file instead of the marker resource
        #[arg(long)]
        missing: Option<PathBuf>,
    },
    /// Compare manual cleanup with scoped cleanup for a file
    Compare {
        /// File to read (defaults to demo.path, then to an empty path)
        path: Option<PathBuf>,
    },
    /// Acquire several named resources and show the release order
    Chain {
        /// Resource names, in acquisition order
        #[arg(required = true)]
        names: Vec<String>,
        /// Refuse to acquire this resource
        #[arg(long)]
        fail_acquire: Option<String>,
        /// Make the body fail
        #[arg(long)]
        fail_body: bool,
        /// Make releasing these resources fail
        #[arg(long)]
        fail_release: Vec<String>,
    },
    /// List scopes recorded in the journal
    Scopes {
        /// Show only the last N scopes
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show the events of one scope
    Logs {
        /// Scope ID (prefix match supported)
        #[arg(short, long)]
        scope: String,
        /// Filter by event kind (acquired, released, release_failed, ...)
        #[arg(short, long)]
        kind: Option<String>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref())?;
    init_tracing(&config, cli.verbose);

    let journal_path = cli.journal.or(config.demo.journal.clone());

    match cli.command {
        Some(Commands::Scopes { limit }) => cmd_scopes(journal_path.as_deref(), limit),
        Some(Commands::Logs { scope, kind }) => {
            cmd_logs(journal_path.as_deref(), &scope, kind.as_deref())
        }
        Some(Commands::Demo {
            fail_body,
            fail_release,
            missing,
        }) => {
            let options = DemoOptions {
                fail_body,
                fail_release,
                missing,
            };
            record(journal_path.as_deref(), |console, journal| {
                demo::run_demo(console, journal, &options).map(|_| ())
            })
        }
        None => record(journal_path.as_deref(), |console, journal| {
            demo::run_demo(console, journal, &DemoOptions::default()).map(|_| ())
        }),
        Some(Commands::Compare { path }) => {
            let path = path.or(config.demo.path.clone()).unwrap_or_default();
            record(journal_path.as_deref(), |console, journal| {
                demo::compare(console, &path, journal).map(|_| ())
            })
        }
        Some(Commands::Chain {
            names,
            fail_acquire,
            fail_body,
            fail_release,
        }) => {
            let options = ChainOptions {
                names,
                fail_acquire,
                fail_body,
                fail_release,
            };
            record(journal_path.as_deref(), |console, journal| {
                demo::run_chain(console, journal, &options).map(|_| ())
            })
        }
    }
}

fn init_tracing(config: &Config, verbose: u8) {
    let level = match verbose {
        0 => config.log.level.as_str(),
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Run a demo against stdout and append its events to the journal file, if any.
fn record<F>(journal_path: Option<&Path>, scenario: F) -> Result<()>
where
    F: FnOnce(&Console<io::Stdout>, &Journal) -> io::Result<()>,
{
    let console = Console::new(io::stdout());
    let journal = Journal::new();

    scenario(&console, &journal)?;

    if let Some(path) = journal_path {
        journal.save(path)?;
        tracing::info!(events = journal.len(), path = %path.display(), "journal saved");
    }
    Ok(())
}

fn open_journal(journal_path: Option<&Path>) -> Result<Journal> {
    let path = journal_path.ok_or(Error::JournalNotConfigured)?;
    Ok(Journal::open(path)?)
}

fn cmd_scopes(journal_path: Option<&Path>, limit: usize) -> Result<()> {
    let journal = open_journal(journal_path)?;
    let scopes = journal.list_scopes();

    if scopes.is_empty() {
        println!("No scopes found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<20}  {:<5}  {:<5}  {:<5}  STATUS",
        "SCOPE ID", "OPENED", "ACQ", "REL", "FAIL"
    );
    println!("{}", "-".repeat(90));

    for summary in scopes.into_iter().take(limit) {
        let opened = Local
            .from_utc_datetime(&summary.opened_at.naive_utc())
            .format("%Y-%m-%d %H:%M");
        let status = if summary.closed_at.is_some() {
            "closed"
        } else {
            "open"
        };
        println!(
            "{:<36}  {:<20}  {:<5}  {:<5}  {:<5}  {status}",
            summary.id.to_string(),
            opened.to_string(),
            summary.acquired,
            summary.released,
            summary.failures
        );
    }

    Ok(())
}

fn cmd_logs(journal_path: Option<&Path>, scope_prefix: &str, kind_filter: Option<&str>) -> Result<()> {
    let journal = open_journal(journal_path)?;
    let scope_id = find_scope(&journal, scope_prefix)?;
    let events = journal.load_scope(scope_id, kind_filter);

    if events.is_empty() {
        println!("No events found for scope {scope_id}");
        return Ok(());
    }

    println!("Scope: {scope_id}\n");

    for event in events {
        print_event(&event);
    }

    Ok(())
}

fn find_scope(journal: &Journal, prefix: &str) -> Result<ScopeId> {
    let scopes = journal.list_scopes();
    let matching: Vec<_> = scopes
        .iter()
        .filter(|s| s.id.to_string().starts_with(prefix))
        .collect();

    match matching.as_slice() {
        [] => Err(Error::ScopeNotFound {
            prefix: prefix.to_string(),
        }),
        [only] => Ok(only.id),
        _ => Err(Error::AmbiguousScope {
            prefix: prefix.to_string(),
            matches: matching.iter().map(|s| s.id.to_string()).collect(),
        }),
    }
}

fn print_event(event: &Event) {
    let time = Local
        .from_utc_datetime(&event.timestamp.naive_utc())
        .format("%H:%M:%S");

    match &event.kind {
        EventKind::ScopeOpened => println!("[{time}] === Scope opened ==="),
        EventKind::ScopeClosed => println!("[{time}] === Scope closed ==="),
        EventKind::Acquired { resource } => println!("[{time}] ACQUIRED: {resource}"),
        EventKind::AcquireFailed { error } => println!("[{time}] ACQUIRE FAILED: {error}"),
        EventKind::BodyCompleted => println!("[{time}] BODY: completed"),
        EventKind::BodyFailed { error } => println!("[{time}] BODY FAILED: {error}"),
        EventKind::Released { resource } => println!("[{time}] RELEASED: {resource}"),
        EventKind::ReleaseFailed {
            resource,
            error,
            suppressed,
        } => {
            let note = if *suppressed { " (suppressed)" } else { "" };
            println!("[{time}] RELEASE FAILED: {resource}: {error}{note}");
        }
    }
}
