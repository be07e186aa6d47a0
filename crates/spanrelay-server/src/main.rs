use anyhow::{Context, Result};
use clap::Parser;
use spanrelay_config::RuntimeConfig;
use std::path::PathBuf;

/// Telemetry relay: receives export streams and fans them out to exporters
#[derive(Parser)]
#[command(name = "spanrelay")]
#[command(version)]
#[command(about = "Telemetry relay: receives export streams and fans them out to exporters", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stream receiver listen address (overrides config file)
    #[arg(short, long, value_name = "ADDR")]
    address: Option<String>,

    /// HTTP gateway listen address (overrides config file)
    #[arg(long, value_name = "ADDR")]
    http_address: Option<String>,

    /// Number of export workers per signal
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Dispatch queue capacity per signal
    #[arg(short, long, value_name = "N")]
    queue_size: Option<usize>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build tokio runtime and run async server
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration (file, then environment overrides)
    let mut config = if let Some(config_path) = &cli.config {
        // Explicit config file path provided
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Try default locations, fall back to defaults
        RuntimeConfig::load_or_default().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli);

    // Step 3: Validate the merged result before binding anything
    config.validate().context("Invalid configuration")?;

    // Step 4: Run server with resolved config
    spanrelay_server::run_with_config(config).await
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(address) = &cli.address {
        config.receiver.address = address.clone();
    }

    if let Some(http_address) = &cli.http_address {
        config.server.http_address = Some(http_address.clone());
    }

    if let Some(workers) = cli.workers {
        config.receiver.workers = workers;
    }

    if let Some(queue_size) = cli.queue_size {
        config.receiver.queue_size = queue_size;
    }

    if let Some(level) = &cli.log_level {
        config.server.log_level = level.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_take_priority() {
        let cli = Cli::parse_from([
            "spanrelay",
            "--address",
            "127.0.0.1:6000",
            "--http-address",
            "127.0.0.1:6001",
            "--workers",
            "8",
            "--queue-size",
            "256",
            "-v",
            "debug",
        ]);
        let mut config = RuntimeConfig::default();
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.receiver.address, "127.0.0.1:6000");
        assert_eq!(config.server.http_address.as_deref(), Some("127.0.0.1:6001"));
        assert_eq!(config.receiver.workers, 8);
        assert_eq!(config.receiver.queue_size, 256);
        assert_eq!(config.server.log_level, "debug");
        config.validate().unwrap();
    }

    #[test]
    fn test_config_file_then_cli() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spanrelay.toml");
        std::fs::write(&path, "[receiver]\nworkers = 2\nqueue_size = 16\n").unwrap();

        let cli = Cli::parse_from(["spanrelay", "--config", path.to_str().unwrap(), "-q", "32"]);
        let mut config = RuntimeConfig::load_from_path(cli.config.as_ref().unwrap()).unwrap();
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.receiver.workers, 2);
        assert_eq!(config.receiver.queue_size, 32);
    }
}
