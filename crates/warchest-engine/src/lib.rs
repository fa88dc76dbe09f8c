//! warchest-engine — keeps the pool's stake near the seat price.
//!
//! Consumes poll results, tracks epoch progress across RPC outages, and
//! decides whether delegators should stake, unstake, or hold.
//!
//! # Decision Algorithm
//!
//! ```text
//! ρ = expected_stake / expected_seat_price
//!
//! if not in proposals or kicked out:
//!     hold (metrics still reported)
//! if ρ > 1 + ε:
//!     unstake expected_stake - seat_price - margin, largest staked balance first
//! if ρ < 1:
//!     stake seat_price - expected_stake + margin, largest unstaked balance first
//! otherwise:
//!     hold
//! ```
//!
//! One cycle runs per poll result. Cycles are serialized through a
//! single-slot gate that also owns the [`DecisionState`], so no two cycles'
//! commands are ever in flight together.

pub mod allocation;
pub mod engine;
pub mod error;
pub mod policy;
pub mod queries;
pub mod state;

pub use allocation::{allocate_stake, allocate_unstake, Allocation};
pub use engine::{CycleOutcome, DecisionEngine, EngineConfig, HoldReason};
pub use error::QueryError;
pub use policy::{classify, seat_ratio, SeatDecision};
pub use queries::Queries;
pub use state::DecisionState;
