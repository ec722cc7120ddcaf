//! Bridge monitor
//!
//! Main entry point. Prints bridge link and FDB notifications from the
//! kernel, or from a capture file with `file <path>`.

use clap::Parser;
use sonic_bridge_monitor::{ExitStatus, MonitorSettings, SessionOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "bridge-monitor")]
#[command(about = "Monitor bridge link and FDB notifications", long_about = None)]
struct Args {
    /// Print a capture timestamp before every record
    #[arg(short, long)]
    timestamp: bool,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter for diagnostics on stderr (overridden by RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Monitor keywords: file <path> | link | fdb | all | help
    #[arg(value_name = "TOKENS")]
    tokens: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => match MonitorSettings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("bridge-monitor: {}", e);
                return ExitStatus::ConfigFailed.into();
            }
        },
        None => MonitorSettings::default(),
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| settings.logging.level.clone());
    if let Err(e) = init_logging(&level) {
        eprintln!("bridge-monitor: {}", e);
        return ExitStatus::ConfigFailed.into();
    }

    let mut options = SessionOptions::from_settings(&settings);
    options.timestamp |= args.timestamp;
    debug!(?options, tokens = ?args.tokens, "Starting bridge monitor");

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let status = sonic_bridge_monitor::run(
        &args.tokens,
        &options,
        &mut stdout.lock(),
        &mut stderr.lock(),
        shutdown_signal(),
    )
    .await;

    info!(code = status.code(), "bridge-monitor exiting");
    status.into()
}

/// Initialize diagnostics on stderr; records own stdout
fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))?;

    Ok(())
}

/// Completes on SIGINT or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
                    _ = term.recv() => info!("Received SIGTERM"),
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received SIGINT");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_tokens_pass_through() {
        let args = Args::parse_from(["bridge-monitor", "-t", "link", "fdb"]);
        assert!(args.timestamp);
        assert_eq!(args.tokens, vec!["link", "fdb"]);
    }

    #[test]
    fn test_args_file_token() {
        let args = Args::parse_from(["bridge-monitor", "file", "/tmp/cap", "all"]);
        assert!(!args.timestamp);
        assert_eq!(args.tokens, vec!["file", "/tmp/cap", "all"]);
    }

    #[test]
    fn test_args_flags_after_keywords() {
        let args = Args::parse_from(["bridge-monitor", "link", "fdb", "-t"]);
        assert!(args.timestamp);
        assert_eq!(args.tokens, vec!["link", "fdb"]);
    }

    #[test]
    fn test_args_unknown_flag_rejected() {
        assert!(Args::try_parse_from(["bridge-monitor", "link", "-x"]).is_err());
    }

    #[test]
    fn test_args_help_keyword_is_a_token() {
        let args = Args::parse_from(["bridge-monitor", "help"]);
        assert_eq!(args.tokens, vec!["help"]);
    }

    #[test]
    fn test_args_config_and_level() {
        let args = Args::parse_from([
            "bridge-monitor",
            "--config",
            "/etc/sonic/bridge-monitor.toml",
            "--log-level",
            "debug",
        ]);
        assert_eq!(
            args.config,
            Some(PathBuf::from("/etc/sonic/bridge-monitor.toml"))
        );
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.tokens.is_empty());
    }
}
