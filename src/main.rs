//! WeRead Pacer CLI application
//!
//! Replays a captured WeRead reading session in paced ticks and pushes a
//! summary through the configured notification channel.

use std::path::PathBuf;
use std::process;

use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

// Import CLI modules through the library
use weread_pacer::app::shutdown_signal;
use weread_pacer::cli::{handle_notify, handle_run, handle_sign, Cli, Commands};
use weread_pacer::config::AppConfig;
use weread_pacer::errors::Result;

/// Exit status after an interrupt, as shells report SIGINT
const EXIT_INTERRUPTED: i32 = 130;

/// Level used until the configuration file has been read
const DEFAULT_LOG_LEVEL: &str = "info";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let cli_level = cli.log_level();
    let filter_handle = init_logging(&cli);

    info!("WeRead Pacer v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = cli.global.config;
    match cli.command {
        Commands::Run(args) => {
            let config = load_config(config_path, cli_level.is_none(), &filter_handle).await?;
            info!("Executing run command");
            tokio::select! {
                result = handle_run(args, config) => result.map(|_| ()),
                _ = shutdown_signal() => {
                    warn!("Interrupted, exiting without notification");
                    process::exit(EXIT_INTERRUPTED);
                }
            }
        }
        Commands::Notify(args) => {
            let config = load_config(config_path, cli_level.is_none(), &filter_handle).await?;
            info!("Executing notify command");
            handle_notify(args, config).await
        }
        Commands::Sign(args) => handle_sign(args),
    }
}

/// Load configuration once logging is up, then apply its log level unless a
/// CLI flag chose one
async fn load_config(
    path: Option<PathBuf>,
    use_config_level: bool,
    handle: &FilterHandle,
) -> Result<AppConfig> {
    let config = AppConfig::load(path).await?;
    if use_config_level {
        apply_config_level(handle, &config.logging.level);
    }
    Ok(config)
}

fn build_filter(level: &str) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("weread_pacer={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(e) => {
            eprintln!("Ignoring invalid log level '{}': {}", level, e);
            filter
        }
    }
}

/// Initialize logging from CLI verbosity; the configured level is applied later
fn init_logging(cli: &Cli) -> FilterHandle {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let (filter, handle) = reload::Layer::new(build_filter(&level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(cli.global.very_verbose), // Show levels only in very verbose mode
        )
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }

    handle
}

/// Switch to the `[logging] level` from the configuration file
fn apply_config_level(handle: &FilterHandle, level: &str) {
    if level.eq_ignore_ascii_case(DEFAULT_LOG_LEVEL) {
        return;
    }
    if let Err(e) = handle.reload(build_filter(level)) {
        warn!("Could not apply configured log level '{}': {}", level, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_levels() {
        let filter = build_filter("debug");
        assert!(filter.to_string().contains("weread_pacer=debug"));
    }
}
