//! Cross-tick decision state.
//!
//! Owned by the engine and only touched inside a serialized cycle. Tracks
//! epoch progress so a failed poll can be replaced by an estimate built
//! from the last accepted snapshot and the observed block rate.

use warchest_core::{Amount, Delegator, EpochSnapshot, SeatPrices};
use warchest_rpc::PollResult;

/// A snapshot the engine has decided to act on.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub snapshot: EpochSnapshot,
    pub left_blocks: i64,
    /// True when the snapshot was extrapolated after a failed poll.
    pub estimated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DecisionState {
    /// Epoch start confirmed by the last successful liveness ping.
    pub last_known_epoch_start: Option<u64>,
    pub left_blocks_previous: i64,
    pub estimated_blocks_per_tick: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub seat_prices: SeatPrices,
    /// Last known balances per delegator, in configuration order.
    pub delegators: Vec<Delegator>,
    last_snapshot: Option<EpochSnapshot>,
    /// Height and tick number of the last real (non-estimated) snapshot.
    last_real: Option<(u64, u64)>,
    ticks: u64,
}

impl DecisionState {
    pub fn new(delegator_ids: &[String]) -> Self {
        Self {
            delegators: delegator_ids.iter().map(Delegator::new).collect(),
            ..Default::default()
        }
    }

    pub fn last_snapshot(&self) -> Option<&EpochSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Fold one poll result into the state.
    ///
    /// Returns `None` when the poll failed and there is no earlier success
    /// to extrapolate from; the tick is then dropped.
    ///
    /// The block rate is measured between real snapshots only, as blocks
    /// advanced per tick. Within one epoch that equals the drop in
    /// `left_blocks`; it also stays meaningful across epoch boundaries and
    /// outages, so a run of estimates advances at a constant rate.
    pub fn accept(&mut self, result: PollResult) -> Option<Accepted> {
        self.ticks += 1;

        let (snapshot, estimated) = match result {
            Ok(snapshot) => (snapshot, false),
            Err(_) => {
                self.failure_count += 1;
                let last = self.last_snapshot.as_ref()?;
                (extrapolate(last, self.estimated_blocks_per_tick), true)
            }
        };

        self.success_count += 1;
        let left_blocks = snapshot.left_blocks();

        if !estimated {
            if let Some((height, tick)) = self.last_real {
                let elapsed = (self.ticks - tick).max(1);
                self.estimated_blocks_per_tick =
                    snapshot.latest_block_height.saturating_sub(height) / elapsed;
            }
            self.last_real = Some((snapshot.latest_block_height, self.ticks));
        }

        self.left_blocks_previous = left_blocks;
        self.last_snapshot = Some(snapshot.clone());

        Some(Accepted {
            snapshot,
            left_blocks,
            estimated,
        })
    }

    /// Record fresh balances for a delegator.
    pub fn set_balances(&mut self, id: &str, staked: Option<Amount>, unstaked: Option<Amount>) {
        if let Some(d) = self.delegators.iter_mut().find(|d| d.id == id) {
            if let Some(staked) = staked {
                d.staked_balance = staked;
            }
            if let Some(unstaked) = unstaked {
                d.unstaked_balance = unstaked;
            }
        }
    }
}

/// Advance a snapshot by one tick's worth of blocks, rolling the epoch
/// start forward once if the boundary is crossed.
fn extrapolate(last: &EpochSnapshot, blocks_per_tick: u64) -> EpochSnapshot {
    let mut next = last.clone();
    next.latest_block_height += blocks_per_tick;
    if next.latest_block_height >= next.epoch_end() {
        next.epoch_start_height += next.epoch_length;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use warchest_rpc::PollError;

    const EPOCH: u64 = 10_000;

    fn snapshot(latest: u64, start: u64) -> EpochSnapshot {
        EpochSnapshot {
            latest_block_height: latest,
            epoch_start_height: start,
            epoch_length: EPOCH,
            current_stake: 1_000,
            next_stake: 1_000,
            expected_stake: 1_000,
            kicked_out: false,
            threshold: Some(99.0),
        }
    }

    fn failure() -> PollResult {
        Err(PollError::Transport {
            method: "status",
            message: "connection refused".to_string(),
        })
    }

    #[test]
    fn failure_without_success_is_dropped() {
        let mut state = DecisionState::new(&[]);
        assert!(state.accept(failure()).is_none());
        assert_eq!(state.failure_count, 1);
        assert_eq!(state.success_count, 0);
        assert!(state.last_snapshot().is_none());
    }

    #[test]
    fn left_blocks_follow_formula() {
        let mut state = DecisionState::new(&[]);
        let a = state.accept(Ok(snapshot(100_100, 100_000))).unwrap();
        assert_eq!(a.left_blocks, 9_900);
        assert!(!a.estimated);
        assert_eq!(state.left_blocks_previous, 9_900);
        // First tick is the baseline: no rate yet.
        assert_eq!(state.estimated_blocks_per_tick, 0);

        let b = state.accept(Ok(snapshot(100_250, 100_000))).unwrap();
        assert_eq!(b.left_blocks, 9_750);
        assert_eq!(state.estimated_blocks_per_tick, 150);
    }

    #[test]
    fn consecutive_failures_extrapolate_linearly() {
        let mut state = DecisionState::new(&[]);
        state.accept(Ok(snapshot(100_000, 100_000)));
        state.accept(Ok(snapshot(100_200, 100_000)));
        assert_eq!(state.estimated_blocks_per_tick, 200);

        for n in 1..=5u64 {
            let a = state.accept(failure()).unwrap();
            assert!(a.estimated);
            assert_eq!(a.snapshot.latest_block_height, 100_200 + n * 200);
            assert_eq!(a.snapshot.epoch_start_height, 100_000);
        }
        assert_eq!(state.failure_count, 5);
        assert_eq!(state.success_count, 7);
    }

    #[test]
    fn extrapolation_rolls_epoch_once() {
        let mut state = DecisionState::new(&[]);
        state.accept(Ok(snapshot(109_000, 100_000)));
        state.accept(Ok(snapshot(109_600, 100_000)));

        // 110_200 crosses the boundary at 110_000.
        let a = state.accept(failure()).unwrap();
        assert_eq!(a.snapshot.latest_block_height, 110_200);
        assert_eq!(a.snapshot.epoch_start_height, 110_000);

        // Further estimates stay in the new epoch.
        for n in 2..=4u64 {
            let a = state.accept(failure()).unwrap();
            assert_eq!(a.snapshot.latest_block_height, 109_600 + n * 600);
            assert_eq!(a.snapshot.epoch_start_height, 110_000);
        }
    }

    #[test]
    fn rate_after_outage_spans_missed_ticks() {
        let mut state = DecisionState::new(&[]);
        state.accept(Ok(snapshot(100_000, 100_000)));
        state.accept(Ok(snapshot(100_100, 100_000)));
        state.accept(failure());
        state.accept(failure());
        // Three ticks since the last real snapshot.
        state.accept(Ok(snapshot(100_400, 100_000)));
        assert_eq!(state.estimated_blocks_per_tick, 100);
    }

    #[test]
    fn rate_survives_real_epoch_rollover() {
        let mut state = DecisionState::new(&[]);
        state.accept(Ok(snapshot(109_900, 100_000)));
        let a = state.accept(Ok(snapshot(110_050, 110_000))).unwrap();
        assert_eq!(a.left_blocks, 9_950);
        assert_eq!(state.estimated_blocks_per_tick, 150);
    }

    #[test]
    fn set_balances_keeps_missing_values() {
        let ids = vec!["alice".to_string(), "bob".to_string()];
        let mut state = DecisionState::new(&ids);
        state.set_balances("alice", Some(10), Some(20));
        state.set_balances("alice", None, Some(5));
        state.set_balances("carol", Some(1), Some(1));

        assert_eq!(state.delegators[0].staked_balance, 10);
        assert_eq!(state.delegators[0].unstaked_balance, 5);
        assert_eq!(state.delegators[1], Delegator::new("bob"));
    }
}
