//! procsnap - point-in-time host telemetry snapshots from /proc.
//!
//! This is the main entry point that resolves configuration, sets up logging
//! and dispatches to the snapshot loop or one of the subcommands.

mod cli;
mod commands;
mod config;
mod report;
mod startup_checks;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::filter::LevelFilter;

use cli::{Args, Commands};
use commands::{command_check, command_config, command_snapshot};
use config::{resolve_config, show_config, validate_effective_config, Config};
use procsnap::ProcFs;

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr so snapshot output on stdout stays machine-readable.
fn setup_logging(config: &Config) {
    let log_level = config.log_level_filter();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(log_level >= LevelFilter::DEBUG)
        .with_line_number(log_level >= LevelFilter::DEBUG)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    debug!("Logging initialized with level: {}", log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Sizes the global rayon pool used by parallel collection.
fn configure_parallelism(config: &Config) {
    if let Some(threads) = config.parallelism {
        if threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .unwrap_or_else(|e| error!("Failed to set rayon thread pool: {}", e));
            debug!("Rayon thread pool configured with {} threads", threads);
        }
    }
}

/// Cancels `token` on SIGINT or SIGTERM.
fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), cancelling snapshot...");
            }
            _ = terminate => {
                info!("Received SIGTERM, cancelling snapshot...");
            }
        }

        token.cancel();
    });
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), *format, *commented);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config);
    configure_parallelism(&config);

    if let Some(Commands::Check { sources_only }) = &args.command {
        return command_check(*sources_only, &config);
    }

    info!("Starting procsnap {}", env!("CARGO_PKG_VERSION"));

    let source = ProcFs::new(config.proc_root()).with_io_buffer_kb(config.io_buffer_kb());
    if let Err(e) = startup_checks::validate_requirements(&source) {
        error!("❌ Startup validation failed: {}", e);
        error!("   Affected domains will be reported as failed");
    }

    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    let outcome = command_snapshot(&config, shutdown).await?;
    info!("procsnap finished: {:?}", outcome);

    std::process::exit(outcome.exit_code());
}
