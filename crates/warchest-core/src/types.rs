//! Shared types used across warchest crates.
//!
//! Stake amounts are whole tokens (`u64`): chain values are fixed-point
//! strings that get truncated on the way in, see [`crate::units`].

use serde::{Deserialize, Serialize};

/// Whole-token stake amount.
pub type Amount = u64;

/// Account id of a delegator staking through the pool.
pub type DelegatorId = String;

/// Epoch length for betanet.
pub const BETANET_EPOCH_LENGTH: u64 = 10_000;

/// Epoch length for testnet and mainnet.
pub const DEFAULT_EPOCH_LENGTH: u64 = 43_200;

/// Produced/expected block percentage at or below which a validator is
/// considered kicked out.
pub const KICKOUT_THRESHOLD_PERCENT: f64 = 90.0;

/// Map a chain id to its fixed epoch length.
pub fn epoch_length_for_chain(chain_id: &str) -> Option<u64> {
    match chain_id {
        "betanet" => Some(BETANET_EPOCH_LENGTH),
        "testnet" | "mainnet" => Some(DEFAULT_EPOCH_LENGTH),
        _ => None,
    }
}

// ── Snapshot ──────────────────────────────────────────────────────

/// Chain state observed for the pool at one poll tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSnapshot {
    pub latest_block_height: u64,
    pub epoch_start_height: u64,
    /// Always non-zero.
    pub epoch_length: u64,
    /// Stake in the current validator set.
    pub current_stake: Amount,
    /// Stake in the next validator set.
    pub next_stake: Amount,
    /// Stake in the current proposals.
    pub expected_stake: Amount,
    pub kicked_out: bool,
    /// Produced/expected blocks in percent. `None` when the pool is not a
    /// current validator.
    pub threshold: Option<f64>,
}

impl EpochSnapshot {
    /// Blocks remaining until the epoch ends.
    pub fn left_blocks(&self) -> i64 {
        self.epoch_start_height as i64 - self.latest_block_height as i64 + self.epoch_length as i64
    }

    /// First block height of the next epoch.
    pub fn epoch_end(&self) -> u64 {
        self.epoch_start_height + self.epoch_length
    }
}

// ── Delegators ────────────────────────────────────────────────────

/// A delegator account and its last known balances in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegator {
    pub id: DelegatorId,
    pub staked_balance: Amount,
    pub unstaked_balance: Amount,
}

impl Delegator {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            staked_balance: 0,
            unstaked_balance: 0,
        }
    }
}

/// Staking pool contract method used to move a delegator's funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeMethod {
    Stake,
    Unstake,
}

impl StakeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StakeMethod::Stake => "stake",
            StakeMethod::Unstake => "unstake",
        }
    }
}

impl std::fmt::Display for StakeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Seat prices ───────────────────────────────────────────────────

/// Which seat price a query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatPriceKind {
    Current,
    Next,
    Expected,
}

impl SeatPriceKind {
    pub const ALL: [SeatPriceKind; 3] = [
        SeatPriceKind::Current,
        SeatPriceKind::Next,
        SeatPriceKind::Expected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatPriceKind::Current => "current",
            SeatPriceKind::Next => "next",
            SeatPriceKind::Expected => "expected",
        }
    }
}

/// Last known good seat prices. Each slot is cached independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeatPrices {
    pub current: Option<Amount>,
    pub next: Option<Amount>,
    pub expected: Option<Amount>,
}

impl SeatPrices {
    pub fn get(&self, kind: SeatPriceKind) -> Option<Amount> {
        match kind {
            SeatPriceKind::Current => self.current,
            SeatPriceKind::Next => self.next,
            SeatPriceKind::Expected => self.expected,
        }
    }

    pub fn set(&mut self, kind: SeatPriceKind, price: Amount) {
        let slot = match kind {
            SeatPriceKind::Current => &mut self.current,
            SeatPriceKind::Next => &mut self.next,
            SeatPriceKind::Expected => &mut self.expected,
        };
        *slot = Some(price);
    }
}
