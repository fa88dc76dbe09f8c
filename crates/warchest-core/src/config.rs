//! warchest.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Top-level daemon configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarchestConfig {
    /// JSON-RPC endpoint of the chain.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Listen address for the metrics endpoint.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Validator pool account id.
    #[serde(default)]
    pub pool_id: String,
    /// Delegator accounts whose funds the controller may move.
    #[serde(default)]
    pub delegator_ids: Vec<String>,
    /// Chain poll period (e.g., "180s", "3m").
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
    /// Hard timeout per external command.
    #[serde(default = "default_command_timeout")]
    pub command_timeout: String,
    /// Timeout per JSON-RPC request.
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout: String,
    /// Extra tokens kept above the seat price when staking or unstaking.
    #[serde(default = "default_safety_margin")]
    pub safety_margin: u64,
    /// Seat ratios in `[1, 1 + ratio_tolerance]` count as balanced.
    #[serde(default = "default_ratio_tolerance")]
    pub ratio_tolerance: f64,
    /// Liveness gauge value reported after a ping when the pool has no stake.
    #[serde(default = "default_ping_sentinel")]
    pub ping_sentinel: u64,
    /// Overrides the epoch length derived from the chain id.
    #[serde(default)]
    pub epoch_length: Option<u64>,
    #[serde(default)]
    pub commands: CommandTemplates,
}

/// External command templates. `%s` placeholders are substituted in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandTemplates {
    pub current_seat_price: String,
    pub next_seat_price: String,
    pub expected_seat_price: String,
    /// Args: pool id.
    pub proposals: String,
    /// Args: pool id, delegator id.
    pub staked_balance: String,
    /// Args: pool id, delegator id.
    pub unstaked_balance: String,
    /// Args: pool id, method, amount, delegator id.
    pub stake: String,
    /// Args: pool id, delegator id.
    pub ping: String,
}

impl CommandTemplates {
    fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("current_seat_price", &self.current_seat_price),
            ("next_seat_price", &self.next_seat_price),
            ("expected_seat_price", &self.expected_seat_price),
            ("proposals", &self.proposals),
            ("staked_balance", &self.staked_balance),
            ("unstaked_balance", &self.unstaked_balance),
            ("stake", &self.stake),
            ("ping", &self.ping),
        ]
    }
}

fn default_rpc_url() -> String {
    "https://rpc.betanet.near.org".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:9444".to_string()
}

fn default_poll_interval() -> String {
    "180s".to_string()
}

fn default_command_timeout() -> String {
    "15s".to_string()
}

fn default_rpc_timeout() -> String {
    "10s".to_string()
}

fn default_safety_margin() -> u64 {
    100
}

fn default_ratio_tolerance() -> f64 {
    0.001
}

fn default_ping_sentinel() -> u64 {
    100_000
}

impl Default for WarchestConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            listen_addr: default_listen_addr(),
            pool_id: String::new(),
            delegator_ids: Vec::new(),
            poll_interval: default_poll_interval(),
            command_timeout: default_command_timeout(),
            rpc_timeout: default_rpc_timeout(),
            safety_margin: default_safety_margin(),
            ratio_tolerance: default_ratio_tolerance(),
            ping_sentinel: default_ping_sentinel(),
            epoch_length: None,
            commands: CommandTemplates::default(),
        }
    }
}

impl WarchestConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn poll_interval(&self) -> ConfigResult<Duration> {
        duration_field("poll_interval", &self.poll_interval)
    }

    pub fn command_timeout(&self) -> ConfigResult<Duration> {
        duration_field("command_timeout", &self.command_timeout)
    }

    pub fn rpc_timeout(&self) -> ConfigResult<Duration> {
        duration_field("rpc_timeout", &self.rpc_timeout)
    }

    /// Check that the config describes a runnable controller.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pool_id.trim().is_empty() {
            return Err(ConfigError::Invalid("pool_id must be set".into()));
        }
        if self.delegator_ids.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one delegator id is required".into(),
            ));
        }
        if self.delegator_ids.iter().any(|d| d.trim().is_empty()) {
            return Err(ConfigError::Invalid("delegator ids must not be empty".into()));
        }
        if self.poll_interval()?.is_zero() {
            return Err(ConfigError::Invalid("poll_interval must be positive".into()));
        }
        if self.command_timeout()?.is_zero() {
            return Err(ConfigError::Invalid("command_timeout must be positive".into()));
        }
        self.rpc_timeout()?;
        if !(self.ratio_tolerance > 0.0) {
            return Err(ConfigError::Invalid("ratio_tolerance must be positive".into()));
        }
        if self.epoch_length == Some(0) {
            return Err(ConfigError::Invalid("epoch_length must be positive".into()));
        }
        if let Some((name, _)) = self
            .commands
            .entries()
            .into_iter()
            .find(|(_, template)| template.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "command template `{name}` is empty"
            )));
        }
        Ok(())
    }

    /// Scaffold a config for a pool with near-cli style command templates.
    pub fn scaffold(pool_id: &str, delegator_id: &str) -> Self {
        WarchestConfig {
            pool_id: pool_id.to_string(),
            delegator_ids: vec![delegator_id.to_string()],
            commands: CommandTemplates {
                current_seat_price: "'near validators current | awk \"/price/ {print \\$NF}\"'"
                    .to_string(),
                next_seat_price: "'near validators next | awk \"/price/ {print \\$NF}\"'".to_string(),
                expected_seat_price: "'near proposals | awk \"/price/ {print \\$NF}\"'"
                    .to_string(),
                proposals: "'near proposals | grep %s'".to_string(),
                staked_balance:
                    "'near view %s get_account_staked_balance \"{\\\"account_id\\\": \\\"%s\\\"}\"'"
                        .to_string(),
                unstaked_balance:
                    "'near view %s get_account_unstaked_balance \"{\\\"account_id\\\": \\\"%s\\\"}\"'"
                        .to_string(),
                stake: "'near call %s %s \"{\\\"amount\\\": \\\"%s\\\"}\" --accountId %s'"
                    .to_string(),
                ping: "'near call %s ping \"{}\" --accountId %s'".to_string(),
            },
            ..Default::default()
        }
    }
}

fn duration_field(field: &'static str, value: &str) -> ConfigResult<Duration> {
    parse_duration(value).ok_or_else(|| ConfigError::Duration {
        field,
        value: value.to_string(),
    })
}

/// Parse a duration string like "5s", "500ms", "3m". A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
