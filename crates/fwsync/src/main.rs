// # fwsync - Firewall allow-list updater
//
// This binary is a THIN integration layer:
// - DO NOT add rule logic or retry logic here
// - All sync logic lives in fwsync-core
//
// It is responsible for:
// 1. Reading configuration from flags and environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the IP sources, provider and state store into a SyncEngine
// 4. Running the engine once and mapping the outcome to an exit code
//
// Scheduling is external: run it from cron or a systemd timer.
//
// ## Configuration
//
// Every flag can also be set through its environment variable:
//
// - `--token` / `FWSYNC_TOKEN`: DigitalOcean API token (required)
// - `--firewall-name` / `FWSYNC_FIREWALL_NAME`: Firewall to update, by name
// - `--firewall-id` / `FWSYNC_FIREWALL_ID`: Firewall to update, by id
// - `--ip-api` / `FWSYNC_IP_API`: Plain-text "what is my IP" service
// - `--state-path` / `FWSYNC_STATE_PATH`: Address record (default `old_ips.json`)
// - `--log-level` / `FWSYNC_LOG_LEVEL`: trace, debug, info, warn, error
// - `--dry-run`, or `FWSYNC_MODE=dry-run`: Read everything, change nothing
//
// Exactly one of `--firewall-name` and `--firewall-id` must be given.
//
// ## Example
//
// ```bash
// export FWSYNC_TOKEN=your_token
// fwsync --firewall-name home
// ```

use anyhow::Result;
use clap::Parser;
use fwsync_core::config::{IpLookupConfig, ProviderConfig, StateStoreConfig, SyncConfig};
use fwsync_core::traits::{IpFamily, StateStore};
use fwsync_core::{
    AddressResolver, FileStateStore, FirewallRef, MemoryStateStore, RunReport, SyncEngine,
};
use fwsync_ip_http::HttpIpSource;
use fwsync_provider_digitalocean::DigitalOceanProvider;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: No change needed, or the firewall was updated
/// - 1: Configuration or startup error
/// - 2: The run failed
#[derive(Debug, Clone, Copy)]
enum FwsyncExitCode {
    /// Clean exit
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<FwsyncExitCode> for ExitCode {
    fn from(code: FwsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep a cloud firewall's allow-list in step with this host's public addresses
#[derive(Parser)]
#[command(name = "fwsync", version, about)]
struct Args {
    /// DigitalOcean API token
    #[arg(long, env = "FWSYNC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Service answering with the caller's IP address as plain text
    #[arg(long, env = "FWSYNC_IP_API", default_value = fwsync_core::config::DEFAULT_IP_API)]
    ip_api: String,

    /// Name of the firewall to update
    #[arg(long, env = "FWSYNC_FIREWALL_NAME")]
    firewall_name: Option<String>,

    /// Id of the firewall to update
    #[arg(long, env = "FWSYNC_FIREWALL_ID")]
    firewall_id: Option<String>,

    /// Where the last seen addresses are kept
    #[arg(long, env = "FWSYNC_STATE_PATH", default_value = fwsync_core::state::DEFAULT_STATE_FILE)]
    state_path: String,

    /// Log verbosity
    #[arg(long, env = "FWSYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log the firewall update instead of sending it
    #[arg(long)]
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .field("ip_api", &self.ip_api)
            .field("firewall_name", &self.firewall_name)
            .field("firewall_id", &self.firewall_id)
            .field("state_path", &self.state_path)
            .field("log_level", &self.log_level)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Args {
    /// Turn flags into a validated configuration
    fn to_config(&self) -> Result<SyncConfig> {
        let api_token = self.token.clone().unwrap_or_default();
        if api_token.is_empty() {
            anyhow::bail!(
                "An API token is required. \
                Pass --token or set it via: export FWSYNC_TOKEN=your_token"
            );
        }

        let firewall =
            FirewallRef::from_parts(self.firewall_name.clone(), self.firewall_id.clone())?;

        let config = SyncConfig {
            ip_lookup: IpLookupConfig {
                url: self.ip_api.clone(),
                ..IpLookupConfig::default()
            },
            provider: ProviderConfig::DigitalOcean {
                api_token,
                api_base: None,
                dry_run: self.dry_run,
            },
            state_store: StateStoreConfig::File {
                path: self.state_path.clone(),
            },
            firewall,
        };
        config.validate()?;

        Ok(config)
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "FWSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                FwsyncExitCode::ConfigError.into()
            } else {
                FwsyncExitCode::Success.into()
            };
        }
    };

    let log_level = match args.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return FwsyncExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return FwsyncExitCode::ConfigError.into();
    }

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration validation error: {}", e);
            return FwsyncExitCode::ConfigError.into();
        }
    };

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {}", e);
            return FwsyncExitCode::ConfigError.into();
        }
    };

    // One run, two concurrent lookups: no need for a thread pool
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return FwsyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match engine.run().await {
            Ok(RunReport::Unchanged { .. }) => FwsyncExitCode::Success,
            Ok(RunReport::Updated {
                firewall_name,
                touched_rules,
                dry_run,
                ..
            }) => {
                info!(
                    "Done: {} rule(s) of firewall {} rewritten{}",
                    touched_rules,
                    firewall_name,
                    if dry_run { " (dry run)" } else { "" }
                );
                FwsyncExitCode::Success
            }
            Err(e) => {
                error!("Run failed: {}", e);
                FwsyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Wire the configured components into an engine
fn build_engine(config: &SyncConfig) -> Result<SyncEngine> {
    let timeout = Duration::from_secs(config.ip_lookup.timeout_secs);
    let resolver = AddressResolver::new(
        Box::new(HttpIpSource::with_timeout(&config.ip_lookup.url, IpFamily::V4, timeout)?),
        Box::new(HttpIpSource::with_timeout(&config.ip_lookup.url, IpFamily::V6, timeout)?),
    )?;

    let provider = DigitalOceanProvider::from_config(&config.provider)?;

    let state_store: Box<dyn StateStore> = match &config.state_store {
        StateStoreConfig::File { path } => Box::new(FileStateStore::new(path)),
        StateStoreConfig::Memory => Box::new(MemoryStateStore::new()),
    };

    info!(
        "Syncing firewall {} via {} (lookups at {})",
        config.firewall,
        config.provider.type_name(),
        config.ip_lookup.url
    );

    Ok(SyncEngine::new(
        resolver,
        Box::new(provider),
        state_store,
        config.firewall.clone(),
    ))
}
