// # aliddnsd - Alidns dynamic DNS runner
//
// This binary is a THIN integration layer:
// - All reconciliation logic lives in aliddns-core
// - Configuration comes from environment variables (optionally seeded from
//   a JSON file), read here and nowhere else
// - Scheduling (one-shot or interval) lives here, outside the core
//
// ## Commands
//
// - `aliddnsd sync` (default): reconcile every configured record once
// - `aliddnsd watch [--interval SECS]`: reconcile, sleep, repeat until
//   SIGTERM/SIGINT
// - `aliddnsd delete <domain> <label>`: remove one record if present
//
// ## Configuration
//
// ### Credentials
// - `ALIDNS_APP_ID`: AccessKey ID
// - `ALIDNS_APP_SECRET`: AccessKey secret
// - `ALIDNS_REGION_ID`: Region (e.g. cn-hangzhou)
// - `ALIDNS_ENDPOINT`: Endpoint override (optional)
// - `ALIDNS_MODE`: `live` (default) or `dry-run`
//
// ### Records
// - `ALIDNS_RECORDS`: `example.com=www,api;example.org=@`
//
// ### IP Discovery
// - `ALIDNS_IP_URL`: Page echoing the caller's address
// - `ALIDNS_IP_PATTERN`: Regex whose first group captures the address
// - `ALIDNS_IP_TIMEOUT_SECS`: Request timeout (default 10)
//
// ### Engine
// - `ALIDNS_RUN_TIMEOUT_SECS`: Deadline per run (default 300)
// - `ALIDNS_INTERVAL_SECS`: Pause between runs in watch mode (default 600)
//
// ### Other
// - `ALIDNS_CONFIG`: JSON file read before the variables above
// - `ALIDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export ALIDNS_APP_ID=LTAI5t...
// export ALIDNS_APP_SECRET=...
// export ALIDNS_REGION_ID=cn-hangzhou
// export ALIDNS_RECORDS="example.com=www,@"
//
// aliddnsd watch --interval 300
// ```

mod config;

use aliddns_core::{Action, DeleteOutcome, ErrorKind, Reconciler, SyncReport};
use aliddns_ip_http::HttpIpSource;
use aliddns_provider_aliyun::AliyunProvider;
use anyhow::Result;
use clap::{Parser, Subcommand};
use config::DaemonConfig;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Keep Alidns "A" records pointed at this host's public IPv4 address
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile every configured record once
    Sync,
    /// Reconcile repeatedly until interrupted
    Watch {
        /// Seconds between runs (overrides ALIDNS_INTERVAL_SECS)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Delete the record for <label>.<domain> if it exists
    Delete {
        /// Domain, e.g. example.com
        domain: String,
        /// Label, e.g. www or @
        label: String,
    },
}

/// Exit codes for different termination scenarios
///
/// - 0: Success (or clean shutdown in watch mode)
/// - 1: Configuration or startup error
/// - 2: Runtime error (discovery, provider, deadline)
/// - 3: Sync finished but some records failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AliddnsExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
    PartialFailure = 3,
}

impl From<AliddnsExitCode> for ExitCode {
    fn from(code: AliddnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl AliddnsExitCode {
    /// Exit code for a run that failed with `error`
    fn for_error(error: &aliddns_core::Error) -> Self {
        match error.kind() {
            ErrorKind::Configuration => AliddnsExitCode::ConfigError,
            _ => AliddnsExitCode::RuntimeError,
        }
    }

    /// Exit code for a completed sync
    fn for_report(report: &SyncReport) -> Self {
        if report.has_failures() {
            AliddnsExitCode::PartialFailure
        } else {
            AliddnsExitCode::Success
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match DaemonConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return AliddnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AliddnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AliddnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(cli.command.unwrap_or(Command::Sync), config))
        .into()
}

/// Build the components and dispatch the command
async fn run(command: Command, config: DaemonConfig) -> AliddnsExitCode {
    let settings = config.settings;

    let reconciler = match build_reconciler(&settings) {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!("Startup failed: {}", e);
            return AliddnsExitCode::ConfigError;
        }
    };

    match command {
        Command::Sync => {
            if settings.records.is_empty() {
                error!("ALIDNS_RECORDS must contain at least one record");
                return AliddnsExitCode::ConfigError;
            }
            sync_once(&reconciler, &settings.records).await
        }
        Command::Watch { interval } => {
            if settings.records.is_empty() {
                error!("ALIDNS_RECORDS must contain at least one record");
                return AliddnsExitCode::ConfigError;
            }
            let interval = interval.unwrap_or(settings.engine.interval_secs);
            if interval == 0 {
                error!("--interval must be > 0");
                return AliddnsExitCode::ConfigError;
            }
            watch(&reconciler, &settings.records, Duration::from_secs(interval)).await
        }
        Command::Delete { domain, label } => match reconciler.delete(&domain, &label).await {
            Ok(DeleteOutcome::Deleted { record_id }) => {
                info!("Deleted {}.{} ({})", label, domain, record_id);
                AliddnsExitCode::Success
            }
            Ok(DeleteOutcome::NotFound) => {
                info!("No record for {}.{}, nothing to delete", label, domain);
                AliddnsExitCode::Success
            }
            Err(e) => {
                error!("Delete failed: {}", e);
                AliddnsExitCode::for_error(&e)
            }
        },
    }
}

fn build_reconciler(settings: &aliddns_core::AliddnsConfig) -> aliddns_core::Result<Reconciler> {
    let ip_source = HttpIpSource::new(&settings.ip_source)?;
    let provider = AliyunProvider::new(&settings.credentials)?;

    info!(
        "Using {} with IP page {}",
        provider.endpoint(),
        ip_source.url()
    );

    Reconciler::new(Box::new(ip_source), Box::new(provider), &settings.engine)
}

/// Run one sync and log its outcome
async fn sync_once(
    reconciler: &Reconciler,
    records: &aliddns_core::DesiredState,
) -> AliddnsExitCode {
    match reconciler.sync(records).await {
        Ok(report) => {
            for outcome in report.outcomes.iter().filter(|o| o.action == Action::Failed) {
                warn!(
                    "{}: {}",
                    outcome.hostname,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            AliddnsExitCode::for_report(&report)
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            AliddnsExitCode::for_error(&e)
        }
    }
}

/// Sync, sleep, repeat until a shutdown signal arrives
///
/// Runs never overlap. A failed run is logged and the loop continues; only
/// a configuration error stops it.
async fn watch(
    reconciler: &Reconciler,
    records: &aliddns_core::DesiredState,
    interval: Duration,
) -> AliddnsExitCode {
    info!("Watching {} record(s) every {:?}", records.label_count(), interval);

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        let code = tokio::select! {
            signal = &mut shutdown => return shutdown_code(signal),
            code = sync_once(reconciler, records) => code,
        };

        if code == AliddnsExitCode::ConfigError {
            return code;
        }

        tokio::select! {
            signal = &mut shutdown => return shutdown_code(signal),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

fn shutdown_code(signal: Result<&'static str>) -> AliddnsExitCode {
    match signal {
        Ok(signal) => {
            info!("Received shutdown signal: {}", signal);
            AliddnsExitCode::Success
        }
        Err(e) => {
            error!("Shutdown error: {}", e);
            AliddnsExitCode::RuntimeError
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
