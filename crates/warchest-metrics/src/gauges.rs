//! Lock-free gauge cells.
//!
//! Each gauge stores the bit pattern of an `f64` in an `AtomicU64`, so the
//! engine can write while the metrics endpoint reads without locking.

use std::sync::atomic::{AtomicU64, Ordering};

/// A single numeric cell.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn inc(&self) {
        // Single writer, so load + store does not race with another writer.
        self.set(self.get() + 1.0);
    }
}

/// All gauges exported by the controller.
#[derive(Debug, Default)]
pub struct Gauges {
    /// Blocks left in the current epoch.
    pub left_blocks: Gauge,
    /// Liveness ping result: stake on success, zero on failure.
    pub ping: Gauge,
    /// Amount moved by the last successful stake/unstake.
    pub restake: Gauge,
    /// Current stake, or the amount of the action in flight.
    pub stake_amount: Gauge,
    pub next_seat_price: Gauge,
    pub expected_seat_price: Gauge,
    pub expected_stake: Gauge,
    /// Produced/expected blocks in percent.
    pub threshold: Gauge,
    pub delegator_staked_balance: Gauge,
    pub delegator_unstaked_balance: Gauge,
    pub rpc_success: Gauge,
    pub rpc_failure: Gauge,
}

/// Static description of one exported gauge.
pub struct GaugeDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub read: fn(&Gauges) -> &Gauge,
}

/// Export order and metadata for every gauge.
pub const GAUGES: &[GaugeDesc] = &[
    GaugeDesc {
        name: "warchest_left_blocks",
        help: "The number of blocks left in the current epoch.",
        read: |g| &g.left_blocks,
    },
    GaugeDesc {
        name: "warchest_ping",
        help: "Stake reported by the last epoch liveness ping (0 on failure).",
        read: |g| &g.ping,
    },
    GaugeDesc {
        name: "warchest_restake",
        help: "Amount moved by the last successful stake or unstake.",
        read: |g| &g.restake,
    },
    GaugeDesc {
        name: "warchest_stake_amount",
        help: "The amount of stake.",
        read: |g| &g.stake_amount,
    },
    GaugeDesc {
        name: "warchest_next_seat_price",
        help: "The next seat price.",
        read: |g| &g.next_seat_price,
    },
    GaugeDesc {
        name: "warchest_expected_seat_price",
        help: "The expected seat price.",
        read: |g| &g.expected_seat_price,
    },
    GaugeDesc {
        name: "warchest_expected_stake",
        help: "The expected stake.",
        read: |g| &g.expected_stake,
    },
    GaugeDesc {
        name: "warchest_threshold",
        help: "Produced/expected blocks in percent (kickout threshold).",
        read: |g| &g.threshold,
    },
    GaugeDesc {
        name: "warchest_delegator_staked_balance",
        help: "Total staked balance across delegators.",
        read: |g| &g.delegator_staked_balance,
    },
    GaugeDesc {
        name: "warchest_delegator_unstaked_balance",
        help: "Total unstaked balance across delegators.",
        read: |g| &g.delegator_unstaked_balance,
    },
    GaugeDesc {
        name: "warchest_rpc_success_total",
        help: "Chain polls that returned a snapshot.",
        read: |g| &g.rpc_success,
    },
    GaugeDesc {
        name: "warchest_rpc_failure_total",
        help: "Failed chain polls replaced by an estimated snapshot.",
        read: |g| &g.rpc_failure,
    },
];

impl Gauges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current values in export order.
    pub fn values(&self) -> Vec<(&'static str, f64)> {
        GAUGES.iter().map(|d| (d.name, (d.read)(self).get())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_starts_at_zero() {
        assert_eq!(Gauge::default().get(), 0.0);
    }

    #[test]
    fn gauge_set_and_inc() {
        let g = Gauge::default();
        g.set(42.5);
        assert_eq!(g.get(), 42.5);
        g.inc();
        assert_eq!(g.get(), 43.5);
    }

    #[test]
    fn values_cover_every_gauge() {
        let gauges = Gauges::new();
        gauges.expected_stake.set(1000.0);
        let values = gauges.values();
        assert_eq!(values.len(), 12);
        assert!(values.contains(&("warchest_expected_stake", 1000.0)));
        assert!(values.iter().all(|(name, _)| name.starts_with("warchest_")));
    }
}
