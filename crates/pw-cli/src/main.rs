//! CLI entry point for pathwatch.
//!
//! This binary watches one file or directory and prints each normalized
//! event as it arrives.
//!
//! # Usage
//!
//! ```bash
//! pathwatch [OPTIONS] <TARGET>
//!
//! # Watch a directory, one `<kind>\t<name>` line per event
//! pathwatch ./watch1
//!
//! # Watch a file, stop after the first event
//! pathwatch --no-persistent ./watch2/bar
//!
//! # Recursive watch with JSON lines output, polling every 500ms
//! pathwatch --recursive --json --poll 500 file:///srv/data
//!
//! # Target and options from a config file
//! pathwatch --config pathwatch.json
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use color_eyre::eyre::{bail, eyre};
use pw_core::{BackendChoice, Config, Encoding, WatchConfig};
use pw_watcher::{NormalizedEvent, WatchError, WatchHandle, WatchTarget};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Watch a file or directory and print what changes.
///
/// Each event is printed as `<kind>\t<name>`, where kind is `rename` (an entry
/// appeared, disappeared, or was renamed) or `change` (contents or metadata
/// changed).
#[derive(Parser)]
#[command(name = "pathwatch", version, about, long_about = None)]
struct Cli {
    /// Path or `file:` URL to watch.
    ///
    /// Overrides the `target` of the config file.
    target: Option<String>,

    /// JSON config file supplying `target` and `watch` options.
    #[arg(short, long, env = "PATHWATCH_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Watch subdirectories too.
    #[arg(short, long, env = "PATHWATCH_RECURSIVE")]
    recursive: bool,

    /// Encoding for entry names (utf8, latin1, hex).
    #[arg(short, long, env = "PATHWATCH_ENCODING")]
    encoding: Option<Encoding>,

    /// Poll every N milliseconds instead of using native notifications.
    #[arg(
        long,
        value_name = "MS",
        env = "PATHWATCH_POLL",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll: Option<u64>,

    /// Print events as JSON lines.
    #[arg(long)]
    json: bool,

    /// Exit after N events.
    #[arg(short = 'n', long, value_name = "N")]
    count: Option<usize>,

    /// Exit after the first event.
    #[arg(long)]
    no_persistent: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// Logs go to stderr so stdout carries only events.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},mio=warn,notify=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds the effective [`Config`] from the config file and CLI flags.
///
/// Flags override file values.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            info!(path = %path, "Loading config");
            Config::load(path).map_err(|e| eyre!("Failed to load config {path}: {e}"))?
        }
        None => Config::default(),
    };

    apply_flags(cli, &mut config.watch);
    config.watch.validate()?;
    Ok(config)
}

fn apply_flags(cli: &Cli, watch: &mut WatchConfig) {
    if cli.recursive {
        watch.recursive = true;
    }
    if let Some(encoding) = cli.encoding {
        watch.encoding = encoding;
    }
    if let Some(interval_ms) = cli.poll {
        watch.backend = BackendChoice::Poll { interval_ms };
    }
    if cli.no_persistent {
        watch.persistent = false;
    }
}

/// Picks the watch target: the positional argument, else the config's.
///
/// A positional argument starting with `file:` is taken as a URL.
fn select_target(positional: Option<&str>, config: &Config) -> Result<WatchTarget, WatchError> {
    match positional {
        Some(text) if text.starts_with("file:") => match Url::parse(text) {
            Ok(url) => WatchTarget::from_url(&url),
            Err(_) => Err(WatchError::InvalidFileUrlPath),
        },
        Some(text) => WatchTarget::new(text),
        None => WatchTarget::from_value(config.target.as_ref()),
    }
}

/// Converts a watcher error into a report carrying its code.
fn report(err: &WatchError) -> color_eyre::Report {
    eyre!("{} [{}]", err, err.code())
}

// =============================================================================
// COMMAND IMPLEMENTATION
// =============================================================================

/// Stop condition for the event loop.
fn event_limit(watch: &WatchConfig, count: Option<usize>) -> Option<usize> {
    if watch.persistent {
        count
    } else {
        Some(count.map_or(1, |n| n.min(1)))
    }
}

/// Renders one event as an output line.
fn format_event(event: &NormalizedEvent, json: bool) -> color_eyre::Result<String> {
    if json {
        return serde_json::to_string(event).map_err(|e| eyre!("Failed to serialize event: {e}"));
    }
    Ok(format!(
        "{}\t{}",
        event.kind,
        event.entry_name.as_deref().unwrap_or_default()
    ))
}

/// Resolves once Ctrl-C (or SIGTERM on Unix) is received.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Prints events until the limit, a backend failure, or a shutdown signal.
///
/// The handle is closed before returning in every case where it is still
/// running.
async fn run_watch(mut handle: WatchHandle, limit: Option<usize>, json: bool) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut delivered = 0;
    let mut failure = None;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    while limit.is_none_or(|limit| delivered < limit) {
        tokio::select! {
            delivery = handle.recv() => match delivery {
                Some(Ok(event)) => {
                    let line = format_event(&event, json)?;
                    let mut out = stdout.lock();
                    writeln!(out, "{line}")?;
                    out.flush()?;
                    delivered += 1;
                }
                Some(Err(err)) => {
                    failure = Some(err);
                    break;
                }
                None => break,
            },
            () = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    if handle.is_running() {
        handle.close().map_err(|e| report(&e))?;
    }

    info!(events = delivered, "Watch finished");

    if let Some(err) = failure {
        return Err(report(&err));
    }
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Resolve configuration and target
    let config = build_config(&cli)?;
    if cli.target.is_none() && cli.config.is_none() {
        bail!("No target given; pass a path or --config");
    }
    let target = select_target(cli.target.as_deref(), &config).map_err(|e| report(&e))?;

    // 5. Start watching
    let mut handle = WatchHandle::new(target, config.watch);
    handle.start().map_err(|e| report(&e))?;
    info!(
        target = %handle.target().path().display(),
        family = %handle.family(),
        "Watching"
    );

    run_watch(handle, event_limit(&config.watch, cli.count), cli.json).await
}
