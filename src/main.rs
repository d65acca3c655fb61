//! VPN-Sweep main entry point
//!
//! This is the command-line interface for the VPN-Sweep record harvester.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use vpn_sweep::config::{load_config_with_overrides, Config, ConfigOverrides};
use vpn_sweep::crawler::run_sweep;
use vpn_sweep::input::{load_items, without_completed};
use vpn_sweep::output::CsvSink;
use vpn_sweep::{IdentityPool, RotationStateStore};

/// VPN-Sweep: a resilient, identity-rotating record harvester
///
/// VPN-Sweep looks up every key from the input file on the target site,
/// extracts the record it finds and appends it to a CSV file. The VPN
/// location is rotated every few keys and whenever the site blocks us;
/// rotation progress is kept in a state file so restarts carry on where
/// the last run stopped.
#[derive(Parser, Debug)]
#[command(name = "vpn-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A resilient, identity-rotating record harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Key file to read instead of the configured one
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Results file to append to instead of the configured one
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Rotate the VPN after this many keys
    #[arg(long, value_name = "N")]
    rotate_every: Option<usize>,

    /// Validate config and show what would be processed without doing it
    #[arg(long, conflicts_with_all = ["show_state", "reset_state"])]
    dry_run: bool,

    /// Show the saved rotation state and exit
    #[arg(long, conflicts_with_all = ["dry_run", "reset_state"])]
    show_state: bool,

    /// Delete the saved rotation state and exit
    #[arg(long, conflicts_with_all = ["dry_run", "show_state"])]
    reset_state: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_overrides(&cli.config, &cli.overrides()) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    // Handle different modes
    let result = if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.show_state {
        handle_show_state(&config)
    } else if cli.reset_state {
        handle_reset_state(&config)
    } else {
        return handle_sweep(config).await;
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vpn_sweep=info,warn"),
            1 => EnvFilter::new("vpn_sweep=debug,info"),
            2 => EnvFilter::new("vpn_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

impl Cli {
    /// Flags that take precedence over the config file
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            input: self.input.clone(),
            output: self.output.clone(),
            rotate_every: self.rotate_every,
        }
    }
}

fn state_store(config: &Config) -> RotationStateStore {
    let pool = Arc::new(IdentityPool::from_config(&config.egress));
    RotationStateStore::new(&config.rotation.state_path, pool)
}

/// Handles the --dry-run mode: validates config and shows what would be processed
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== VPN-Sweep Dry Run ===\n");

    println!("Target:");
    println!("  Search URL: {}?{}=<key>", config.target.search_url, config.target.search_param);
    println!("  Profile link selector: {}", config.target.profile_link_selector);
    println!("  Blocked patterns: {}", config.target.blocked_patterns.join(", "));
    println!("  Item delay: {}ms", config.target.item_delay);

    let pool = IdentityPool::from_config(&config.egress);
    println!("\nEgress:");
    println!("  Command: {} {}", config.egress.command, config.egress.connect_args.join(" "));
    println!(
        "  Identities: {} ({})",
        pool.size(),
        if config.egress.identities.is_some() {
            "configured"
        } else {
            "built-in"
        }
    );
    println!("  Attempts per identity: {}", config.egress.max_attempts);
    println!("  Rotate every: {} items", config.rotation.every_n);
    println!("  State file: {}", config.rotation.state_path);

    let items = load_items(Path::new(&config.input.path))
        .with_context(|| format!("loading work items from {}", config.input.path))?;
    let total = items.len();
    let sink = CsvSink::new(&config.output.results_path);
    let remaining = if config.input.skip_completed {
        let completed = sink
            .completed_keys()
            .with_context(|| format!("reading {}", config.output.results_path))?;
        without_completed(items, &completed).len()
    } else {
        total
    };

    println!("\nWork:");
    println!("  Input: {} ({} keys)", config.input.path, total);
    println!("  Results: {}", config.output.results_path);
    println!("  Remaining: {}", remaining);

    println!("\n✓ Configuration is valid");
    println!("✓ Would process {} keys", remaining);

    Ok(())
}

/// Handles the --show-state mode: prints the saved rotation state
fn handle_show_state(config: &Config) -> anyhow::Result<()> {
    let store = state_store(config);
    println!("State file: {}\n", store.path().display());

    let Some(raw) = store
        .read_file()
        .with_context(|| format!("reading {}", store.path().display()))?
    else {
        println!("No rotation state saved yet");
        return Ok(());
    };

    let state = store.load();
    let current = store
        .pool()
        .identity_at(state.current_index)
        .map(|identity| identity.name().to_string())
        .unwrap_or_else(|_| "-".to_string());

    println!("Current identity: #{} {}", state.current_index, current);
    println!(
        "Used this cycle: {}/{}",
        state.used.len(),
        store.pool().size()
    );
    for name in &state.used {
        println!("  - {}", name);
    }
    println!("Last updated: {}", raw.last_updated);

    Ok(())
}

/// Handles the --reset-state mode: deletes the rotation state file
fn handle_reset_state(config: &Config) -> anyhow::Result<()> {
    let store = state_store(config);
    let removed = store
        .clear()
        .with_context(|| format!("removing {}", store.path().display()))?;

    if removed {
        println!("✓ Removed {}", store.path().display());
    } else {
        println!("No rotation state at {}", store.path().display());
    }

    Ok(())
}

/// Handles the main sweep operation
async fn handle_sweep(config: Config) -> ExitCode {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing up (press Ctrl-C again to force)");
            on_signal.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });

    match run_sweep(&config, cancel).await {
        Ok(summary) => {
            tracing::info!(
                "Blocks: {}, rotations: {} scheduled / {} forced, {} failed",
                summary.blocks,
                summary.scheduled_rotations,
                summary.forced_rotations,
                summary.rotation_failures
            );
            if summary.cancelled {
                println!("Interrupted.");
            }
            println!(
                "Processed {} keys, {} with data",
                summary.processed, summary.with_data
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Sweep failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
