//! warchestd — the Warchest daemon.
//!
//! Polls the chain, runs the decision engine on every sample, and serves
//! the controller's gauges over HTTP.
//!
//! # Usage
//!
//! ```text
//! warchestd init --account-id pool.betanet --delegator-id alice.betanet
//! warchestd run --config warchest.toml
//! ```

mod daemon;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use warchest_core::WarchestConfig;
use warchest_core::config::parse_duration;

const DEFAULT_LOG_FILTER: &str = "info,warchestd=debug,warchest=debug";

#[derive(Parser)]
#[command(name = "warchestd", about = "Validator seat-price controller")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the controller.
    Run(RunArgs),

    /// Write a starter config with near-cli command templates.
    Init {
        /// Validator pool account id.
        #[arg(long)]
        account_id: String,

        /// Delegator account id.
        #[arg(long)]
        delegator_id: String,

        /// Where to write the config.
        #[arg(long, short, default_value = "warchest.toml")]
        output: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Config file. Built-in defaults are used when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Chain JSON-RPC endpoint.
    #[arg(long)]
    url: Option<String>,

    /// Metrics listen address.
    #[arg(long)]
    addr: Option<String>,

    /// Validator pool account id.
    #[arg(long)]
    account_id: Option<String>,

    /// Delegator account id. Repeat for several delegators.
    #[arg(long = "delegator-id")]
    delegator_ids: Vec<String>,

    /// Chain poll period (e.g. "180s", "3m").
    #[arg(long)]
    poll_interval: Option<String>,
}

impl RunArgs {
    /// Load the config file, if any, and apply command-line overrides.
    fn load_config(&self) -> anyhow::Result<WarchestConfig> {
        let mut config = match &self.config {
            Some(path) => WarchestConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => WarchestConfig::default(),
        };
        self.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut WarchestConfig) -> anyhow::Result<()> {
        if let Some(url) = &self.url {
            config.rpc_url = url.clone();
        }
        if let Some(addr) = &self.addr {
            config.listen_addr = addr.clone();
        }
        if let Some(account_id) = &self.account_id {
            config.pool_id = account_id.clone();
        }
        if !self.delegator_ids.is_empty() {
            config.delegator_ids = self.delegator_ids.clone();
        }
        if let Some(interval) = &self.poll_interval {
            if parse_duration(interval).is_none() {
                anyhow::bail!("invalid --poll-interval {interval:?}");
            }
            config.poll_interval = interval.clone();
        }
        Ok(())
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        fmt.json().init();
    } else {
        fmt.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Run(args) => {
            let config = args.load_config()?;
            daemon::run(config).await
        }
        Command::Init {
            account_id,
            delegator_id,
            output,
            force,
        } => {
            if output.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
            }
            let config = WarchestConfig::scaffold(&account_id, &delegator_id);
            std::fs::write(&output, config.to_toml_string()?)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(path = %output.display(), pool = %account_id, "config written");
            Ok(())
        }
    }
}
