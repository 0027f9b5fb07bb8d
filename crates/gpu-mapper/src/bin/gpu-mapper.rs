//! gpu-mapper CLI - register cluster GPUs as Proxmox VE PCI mappings.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gpu_mapper::config::{DEFAULT_TIMEOUT_SECS, ENV_API_URL, ENV_TOKEN_ID, ENV_TOKEN_VALUE};
use gpu_mapper::{GpuMapper, MapperConfig, ProxmoxClient};

/// gpu-mapper - Discover GPUs on every cluster node and map them for passthrough.
#[derive(Parser)]
#[command(name = "gpu-mapper")]
#[command(about = "Create Proxmox VE PCI mappings for every GPU in the cluster")]
struct Cli {
    /// API base URL, e.g. `https://pve1:8006/api2/json` (or set `PROXMOX_API_URL`).
    #[arg(long, env = "PROXMOX_API_URL", default_value = "")]
    api_url: String,

    /// API token id, e.g. `root@pam!mapper` (or set `PROXMOX_TOKEN_ID`).
    #[arg(long, env = "PROXMOX_TOKEN_ID", default_value = "")]
    token_id: String,

    /// API token secret (or set `PROXMOX_TOKEN_VALUE`).
    #[arg(
        long,
        env = "PROXMOX_TOKEN_VALUE",
        default_value = "",
        hide_env_values = true
    )]
    token_value: String,

    /// Verify TLS certificates when `true` (or set `PROXMOX_VERIFY_SSL`).
    #[arg(long, env = "PROXMOX_VERIFY_SSL", default_value = "false")]
    verify_ssl: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Log the mappings that would be written without changing anything.
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

/// Exit status for a run that could not start because configuration is missing.
const EXIT_CONFIG: i32 = 1;

/// Validate the CLI settings, or return the usage message to print.
fn resolve_config(cli: &Cli) -> Result<MapperConfig, String> {
    let required = [ENV_API_URL, ENV_TOKEN_ID, ENV_TOKEN_VALUE].join(", ");
    let config = MapperConfig::from_parts(
        &cli.api_url,
        &cli.token_id,
        &cli.token_value,
        &cli.verify_ssl,
    )
    .map_err(|e| format!("Error: {e}\nPlease set: {required}"))?;

    Ok(config
        .with_timeout_secs(cli.timeout_secs)
        .with_dry_run(cli.dry_run))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(usage) => {
            println!("{usage}");
            std::process::exit(EXIT_CONFIG);
        }
    };

    info!(
        api_url = %config.api_url,
        token_id = %config.token_id,
        verify_ssl = config.verify_ssl,
        dry_run = config.dry_run,
        "Initializing GPU mapper"
    );

    let client = ProxmoxClient::new(&config).context("Failed to create Proxmox API client")?;
    GpuMapper::new(&client)
        .dry_run(config.dry_run)
        .scan_and_map()
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings_produce_usage() {
        let cli = Cli::try_parse_from([
            "gpu-mapper",
            "--api-url=",
            "--token-id=",
            "--token-value=",
        ])
        .unwrap();
        let usage = resolve_config(&cli).unwrap_err();

        let expected = "Please set: PROXMOX_API_URL, PROXMOX_TOKEN_ID, PROXMOX_TOKEN_VALUE";
        assert!(usage.starts_with("Error: "));
        assert!(usage.ends_with(expected));
    }

    #[test]
    fn test_complete_settings_resolve() {
        let cli = Cli::try_parse_from([
            "gpu-mapper",
            "--api-url",
            "https://pve1:8006/api2/json",
            "--token-id",
            "root@pam!mapper",
            "--token-value",
            "secret",
            "--verify-ssl",
            "true",
            "--timeout-secs",
            "5",
            "--dry-run",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();

        assert_eq!(config.api_url, "https://pve1:8006/api2/json");
        assert!(config.verify_ssl);
        assert_eq!(config.timeout_secs, 5);
        assert!(config.dry_run);
    }
}
