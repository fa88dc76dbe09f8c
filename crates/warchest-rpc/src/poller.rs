//! Chain state poller.
//!
//! Samples the chain once per interval and turns the pool's view of the
//! validator sets into an [`EpochSnapshot`]. Ticks never fail out of the
//! loop: a transport failure becomes an `Err(PollError)` on the channel.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use warchest_core::units::decode_balance;
use warchest_core::{epoch_length_for_chain, EpochSnapshot, KICKOUT_THRESHOLD_PERCENT};

use crate::client::ChainClient;
use crate::types::{ValidatorInfo, ValidatorsResponse};

/// Error tag carried by a failed tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PollError {
    #[error("rpc `{method}` failed: {message}")]
    Transport {
        method: &'static str,
        message: String,
    },

    #[error("unknown chain id {0:?}")]
    UnknownChain(String),
}

/// Outcome of one poll tick.
pub type PollResult = Result<EpochSnapshot, PollError>;

/// Periodically polls the chain on behalf of one pool.
pub struct Poller {
    client: Arc<dyn ChainClient>,
    pool_id: String,
    interval: Duration,
    epoch_length: Option<u64>,
}

impl Poller {
    pub fn new(client: Arc<dyn ChainClient>, pool_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            client,
            pool_id: pool_id.into(),
            interval,
            epoch_length: None,
        }
    }

    /// Use a fixed epoch length instead of deriving it from the chain id.
    pub fn with_epoch_length(mut self, epoch_length: Option<u64>) -> Self {
        self.epoch_length = epoch_length;
        self
    }

    /// Take one sample of the chain.
    pub async fn poll(&self) -> PollResult {
        let status = self
            .client
            .status()
            .await
            .map_err(|e| PollError::Transport {
                method: "status",
                message: e.to_string(),
            })?;

        let epoch_length = self
            .epoch_length
            .or_else(|| epoch_length_for_chain(&status.chain_id))
            .ok_or_else(|| PollError::UnknownChain(status.chain_id.clone()))?;

        let height = status.sync_info.latest_block_height;
        let validators = self
            .client
            .validators(height)
            .await
            .map_err(|e| PollError::Transport {
                method: "validators",
                message: e.to_string(),
            })?;

        Ok(build_snapshot(&self.pool_id, epoch_length, height, &validators))
    }

    /// Poll until shutdown, sending every tick's outcome to `tx`.
    ///
    /// The channel is unbounded so a slow consumer never delays a tick.
    pub async fn run(
        &self,
        tx: mpsc::UnboundedSender<PollResult>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            pool = %self.pool_id,
            interval_secs = self.interval.as_secs(),
            "poller started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    info!("poller shutting down");
                    break;
                }
            }

            // A poll in flight is abandoned on shutdown.
            let result = tokio::select! {
                result = self.poll() => result,
                _ = shutdown.changed() => {
                    info!("poller shutting down during poll");
                    break;
                }
            };
            match &result {
                Ok(snapshot) => debug!(
                    height = snapshot.latest_block_height,
                    epoch_start = snapshot.epoch_start_height,
                    kicked_out = snapshot.kicked_out,
                    "chain sampled"
                ),
                Err(e) => warn!(error = %e, "chain poll failed"),
            }
            if tx.send(result).is_err() {
                info!("snapshot receiver dropped, poller stopping");
                break;
            }
        }
    }
}

/// Build the pool's snapshot from a validators response.
///
/// A pool missing from the current validator set is reported as kicked out.
pub fn build_snapshot(
    pool_id: &str,
    epoch_length: u64,
    latest_block_height: u64,
    validators: &ValidatorsResponse,
) -> EpochSnapshot {
    let mut kicked_out = true;
    let mut threshold = None;
    let mut current_stake = 0;

    if let Some(v) = find_entry(&validators.current_validators, pool_id) {
        let percent = production_percent(v);
        kicked_out = percent <= KICKOUT_THRESHOLD_PERCENT;
        threshold = Some(percent);
        current_stake = decode_balance(&v.stake);
        debug!(pool = %pool_id, threshold = percent, kicked_out, "block production");
    }

    let next_stake = find_entry(&validators.next_validators, pool_id)
        .map(|v| decode_balance(&v.stake))
        .unwrap_or(0);
    let expected_stake = find_entry(&validators.current_proposals, pool_id)
        .map(|v| decode_balance(&v.stake))
        .unwrap_or(0);

    EpochSnapshot {
        latest_block_height,
        epoch_start_height: validators.epoch_start_height,
        epoch_length,
        current_stake,
        next_stake,
        expected_stake,
        kicked_out,
        threshold,
    }
}

fn find_entry<'a>(list: &'a [ValidatorInfo], pool_id: &str) -> Option<&'a ValidatorInfo> {
    list.iter().rfind(|v| v.account_id == pool_id)
}

/// Produced/expected blocks in percent. A validator with nothing expected
/// of it yet is at 100%.
fn production_percent(v: &ValidatorInfo) -> f64 {
    if v.num_expected_blocks == 0 {
        return 100.0;
    }
    v.num_produced_blocks as f64 / v.num_expected_blocks as f64 * 100.0
}
