//! dbtop - live terminal dashboard for one database instance.
//!
//! Usage:
//!   dbtop                 # the only configured instance
//!   dbtop prod-pg         # a named instance from ~/.dbtop
//!   dbtop --config ./dbtop.yaml staging
//!   dbtop --list-engines

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use dbtop::adapter::AdapterRegistry;
use dbtop::config::{Config, SelectError};
use dbtop::scheduler::PollScheduler;
use dbtop::tui::{App, InstanceInfo};

/// Live terminal dashboard for PostgreSQL, MySQL/MariaDB and Oracle.
#[derive(Parser)]
#[command(name = "dbtop", version, about = "Database activity monitor")]
struct Args {
    /// Instance name from the configuration file.
    /// May be omitted when exactly one instance is configured.
    #[arg(value_name = "INSTANCE")]
    instance: Option<String>,

    /// Path to the configuration file (default: ~/.dbtop).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log file (default: <tmp>/dbtop.log).
    /// The terminal belongs to the dashboard, so logs never go to stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print supported engine types and exit.
    #[arg(long)]
    list_engines: bool,
}

fn main() {
    let args = Args::parse();
    let registry = AdapterRegistry::with_builtin();

    if args.list_engines {
        for name in registry.list_supported() {
            println!("{}", name);
        }
        return;
    }

    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("dbtop.log"));
    if let Err(e) = init_logging(&log_file, args.verbose, args.quiet) {
        eprintln!("Error: cannot open log file {}: {}", log_file.display(), e);
        std::process::exit(1);
    }

    let Some(config_path) = args.config.clone().or_else(Config::default_path) else {
        eprintln!("Error: cannot determine home directory, use --config");
        std::process::exit(1);
    };
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let (name, instance) = match config.select(args.instance.as_deref()) {
        Ok(selected) => selected,
        Err(e) => {
            print_selection_error(&e);
            std::process::exit(1);
        }
    };

    let adapter = match registry.lookup(&instance.engine) {
        Ok(adapter) => adapter,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!(
                "Supported types: {}",
                registry
                    .list_supported()
                    .into_iter()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            std::process::exit(1);
        }
    };

    info!(
        instance = name,
        engine = adapter.engine(),
        host = %instance.host,
        port = instance.port(),
        "connecting"
    );
    let session = match adapter.connect(instance) {
        Ok(session) => session,
        Err(e) => {
            error!(instance = name, error = %e, "initial connection failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let info = InstanceInfo::new(name, adapter.engine(), instance);
    let scheduler = PollScheduler::new(
        adapter,
        session,
        instance.database.clone(),
        instance.refresh_interval,
    );

    let app = App::new(info, instance.refresh_interval);
    if let Err(e) = app.run(scheduler) {
        error!(error = %e, "terminal error");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_selection_error(e: &SelectError) {
    eprintln!("Error: {}", e);
    if !e.available().is_empty() {
        eprintln!("Available instances:");
        for name in e.available() {
            eprintln!("  {}", name);
        }
    }
}

/// Initializes file logging with the level from `-v`/`-q`.
fn init_logging(path: &Path, verbose: u8, quiet: bool) -> std::io::Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::from_level(level).into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}
