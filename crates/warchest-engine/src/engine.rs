//! The serialized decision cycle.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};
use warchest_core::{Amount, CommandTemplates, SeatPriceKind, StakeMethod, WarchestConfig};
use warchest_exec::CommandRunner;
use warchest_metrics::Gauges;
use warchest_rpc::PollResult;

use crate::allocation::{allocate_stake, allocate_unstake, Allocation};
use crate::policy::{classify, seat_ratio, stake_target, unstake_target, SeatDecision};
use crate::queries::Queries;
use crate::state::DecisionState;

/// Engine settings taken from the daemon configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub pool_id: String,
    pub delegator_ids: Vec<String>,
    pub safety_margin: Amount,
    pub ratio_tolerance: f64,
    pub ping_sentinel: Amount,
}

impl EngineConfig {
    pub fn from_config(config: &WarchestConfig) -> Self {
        Self {
            pool_id: config.pool_id.clone(),
            delegator_ids: config.delegator_ids.clone(),
            safety_margin: config.safety_margin,
            ratio_tolerance: config.ratio_tolerance,
            ping_sentinel: config.ping_sentinel,
        }
    }
}

/// Why a cycle took no stake action despite having prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    NotInProposals,
    KickedOut,
}

/// What one cycle ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Poll failed before any success; nothing was touched.
    Dropped,
    /// A seat price could not be fetched and nothing was cached.
    SeatPriceUnavailable(SeatPriceKind),
    Hold(HoldReason),
    Balanced,
    /// An action was needed but no delegator had funds to move.
    InsufficientLiquidity(StakeMethod),
    /// `completed < planned` means the batch stopped at a failed action.
    Executed {
        method: StakeMethod,
        planned: usize,
        completed: usize,
    },
}

pub struct DecisionEngine {
    config: EngineConfig,
    queries: Queries,
    gauges: Arc<Gauges>,
    /// Capacity-1 gate. Held for the whole cycle, commands included.
    state: Mutex<DecisionState>,
}

impl DecisionEngine {
    pub fn new(
        config: EngineConfig,
        runner: Arc<dyn CommandRunner>,
        commands: CommandTemplates,
        gauges: Arc<Gauges>,
    ) -> Self {
        let queries = Queries::new(runner, commands, config.pool_id.clone());
        let state = Mutex::new(DecisionState::new(&config.delegator_ids));
        Self {
            config,
            queries,
            gauges,
            state,
        }
    }

    pub fn gauges(&self) -> &Arc<Gauges> {
        &self.gauges
    }

    /// Copy of the current decision state. Waits for any running cycle.
    pub async fn state(&self) -> DecisionState {
        self.state.lock().await.clone()
    }

    /// Run one decision cycle for a poll result.
    pub async fn cycle(&self, result: PollResult) -> CycleOutcome {
        let mut state = self.state.lock().await;

        let Some(accepted) = state.accept(result) else {
            debug!(
                failures = state.failure_count,
                "poll failed with no earlier success, dropping tick"
            );
            return CycleOutcome::Dropped;
        };
        let snapshot = accepted.snapshot;

        if accepted.estimated {
            warn!(
                height = snapshot.latest_block_height,
                epoch_start = snapshot.epoch_start_height,
                blocks_per_tick = state.estimated_blocks_per_tick,
                "using estimated chain state"
            );
        }
        info!(
            pool = %self.config.pool_id,
            left_blocks = accepted.left_blocks,
            blocks_per_tick = state.estimated_blocks_per_tick,
            kicked_out = snapshot.kicked_out,
            "cycle started"
        );

        let g = &self.gauges;
        if accepted.estimated {
            g.rpc_failure.inc();
        } else {
            g.rpc_success.inc();
        }
        g.restake.set(0.0);
        g.ping.set(0.0);
        g.left_blocks.set(accepted.left_blocks as f64);
        g.threshold.set(snapshot.threshold.unwrap_or(0.0));
        g.stake_amount.set(snapshot.current_stake as f64);

        // Expected stake from the proposals listing. A failed query holds.
        let expected_stake = match self.queries.expected_stake().await {
            Ok(stake) => stake,
            Err(e) => {
                warn!(error = %e, "proposal query failed");
                0
            }
        };
        g.expected_stake.set(expected_stake as f64);
        let not_in_proposals = expected_stake == 0;
        if not_in_proposals {
            warn!(pool = %self.config.pool_id, "pool is not in the current proposals");
        }

        // Delegator balances. Failed queries keep the cached value.
        let mut staked_total: Amount = 0;
        let mut unstaked_total: Amount = 0;
        for id in &self.config.delegator_ids {
            let staked = match self.queries.staked_balance(id).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(delegator = %id, error = %e, "staked balance query failed");
                    None
                }
            };
            let unstaked = match self.queries.unstaked_balance(id).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(delegator = %id, error = %e, "unstaked balance query failed");
                    None
                }
            };
            staked_total += staked.unwrap_or(0);
            unstaked_total += unstaked.unwrap_or(0);
            state.set_balances(id, staked, unstaked);
        }
        g.delegator_staked_balance.set(staked_total as f64);
        g.delegator_unstaked_balance.set(unstaked_total as f64);

        self.check_epoch_rollover(&mut state, snapshot.epoch_start_height, snapshot.current_stake)
            .await;

        // Seat prices, each falling back to its own cached value.
        for kind in SeatPriceKind::ALL {
            match self.queries.seat_price(kind).await {
                Ok(price) => state.seat_prices.set(kind, price),
                Err(e) => match state.seat_prices.get(kind) {
                    Some(cached) => {
                        warn!(kind = kind.as_str(), cached, error = %e, "seat price query failed, using cached value")
                    }
                    None => {
                        error!(kind = kind.as_str(), error = %e, "seat price unavailable, skipping cycle");
                        return CycleOutcome::SeatPriceUnavailable(kind);
                    }
                },
            }
        }
        let prices = state.seat_prices;
        if let Some(next) = prices.next {
            g.next_seat_price.set(next as f64);
        }
        let Some(seat_price) = prices.expected else {
            return CycleOutcome::SeatPriceUnavailable(SeatPriceKind::Expected);
        };
        g.expected_seat_price.set(seat_price as f64);

        let Some(ratio) = seat_ratio(expected_stake, seat_price) else {
            return CycleOutcome::SeatPriceUnavailable(SeatPriceKind::Expected);
        };
        info!(expected_stake, seat_price, ratio, "seat ratio");

        if not_in_proposals {
            return CycleOutcome::Hold(HoldReason::NotInProposals);
        }
        if snapshot.kicked_out {
            warn!(pool = %self.config.pool_id, threshold = ?snapshot.threshold, "pool kicked out, holding");
            return CycleOutcome::Hold(HoldReason::KickedOut);
        }

        let margin = self.config.safety_margin;
        let (method, allocations) = match classify(ratio, self.config.ratio_tolerance) {
            SeatDecision::Balanced => {
                debug!("stake is balanced");
                return CycleOutcome::Balanced;
            }
            SeatDecision::Unstake => {
                let target = unstake_target(expected_stake, seat_price, margin);
                if target == 0 {
                    debug!("surplus within safety margin");
                    return CycleOutcome::Balanced;
                }
                (StakeMethod::Unstake, allocate_unstake(&state.delegators, target))
            }
            SeatDecision::Stake => {
                let target = stake_target(expected_stake, seat_price, margin);
                (StakeMethod::Stake, allocate_stake(&state.delegators, target))
            }
        };

        if allocations.is_empty() {
            warn!(method = %method, "no delegator funds available");
            return CycleOutcome::InsufficientLiquidity(method);
        }

        self.execute(&mut state, method, &allocations).await
    }

    /// Ping the pool when the epoch start moved since the last good ping.
    async fn check_epoch_rollover(
        &self,
        state: &mut DecisionState,
        epoch_start: u64,
        current_stake: Amount,
    ) {
        let Some(known) = state.last_known_epoch_start else {
            debug!(epoch_start, "epoch baseline established");
            state.last_known_epoch_start = Some(epoch_start);
            return;
        };
        if known == epoch_start {
            return;
        }
        let Some(delegator) = self.config.delegator_ids.first() else {
            warn!("epoch changed but no delegator is configured to ping");
            return;
        };

        info!(previous = known, epoch_start, delegator = %delegator, "new epoch, pinging pool");
        match self.queries.ping(delegator).await {
            Ok(()) => {
                let value = if current_stake == 0 {
                    self.config.ping_sentinel
                } else {
                    current_stake
                };
                self.gauges.ping.set(value as f64);
                state.last_known_epoch_start = Some(epoch_start);
            }
            Err(e) => {
                error!(delegator = %delegator, error = %e, "ping failed");
                self.gauges.ping.set(0.0);
            }
        }
    }

    /// Run a batch of actions in order, stopping at the first failure.
    async fn execute(
        &self,
        state: &mut DecisionState,
        method: StakeMethod,
        allocations: &[Allocation],
    ) -> CycleOutcome {
        let mut completed = 0;
        for a in allocations {
            self.gauges.stake_amount.set(a.amount as f64);
            info!(method = %method, delegator = %a.delegator_id, amount = a.amount, "submitting stake action");

            if let Err(e) = self.queries.stake(method, a.amount, &a.delegator_id).await {
                error!(
                    method = %method,
                    delegator = %a.delegator_id,
                    amount = a.amount,
                    error = %e,
                    remaining = allocations.len() - completed - 1,
                    "stake action failed, aborting batch"
                );
                break;
            }

            self.gauges.restake.set(a.amount as f64);
            if let Some(d) = state.delegators.iter_mut().find(|d| d.id == a.delegator_id) {
                match method {
                    StakeMethod::Unstake => {
                        d.staked_balance = d.staked_balance.saturating_sub(a.amount);
                        d.unstaked_balance += a.amount;
                    }
                    StakeMethod::Stake => {
                        d.unstaked_balance = d.unstaked_balance.saturating_sub(a.amount);
                        d.staked_balance += a.amount;
                    }
                }
            }
            completed += 1;
        }

        CycleOutcome::Executed {
            method,
            planned: allocations.len(),
            completed,
        }
    }

    /// Drain poll results until shutdown or until the poller goes away.
    ///
    /// A cycle in progress is abandoned as soon as shutdown is signalled.
    pub async fn run(
        &self,
        mut rx: mpsc::UnboundedReceiver<PollResult>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(pool = %self.config.pool_id, delegators = self.config.delegator_ids.len(), "decision engine started");

        loop {
            let next = tokio::select! {
                next = rx.recv() => next,
                _ = shutdown.changed() => break,
            };
            let Some(result) = next else {
                info!("poll channel closed, engine stopping");
                break;
            };

            tokio::select! {
                outcome = self.cycle(result) => debug!(?outcome, "cycle finished"),
                _ = shutdown.changed() => {
                    warn!("shutdown during cycle, abandoning it");
                    break;
                }
            }
        }

        info!("decision engine shut down");
    }
}
