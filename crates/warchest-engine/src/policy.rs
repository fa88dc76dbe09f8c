//! Seat-ratio policy.

use warchest_core::Amount;

/// Default width of the balanced band above one seat.
pub const DEFAULT_RATIO_TOLERANCE: f64 = 0.001;

/// What the seat ratio asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatDecision {
    /// More stake than one seat needs.
    Unstake,
    /// Not enough stake for one seat.
    Stake,
    /// Within `[1, 1 + tolerance]`.
    Balanced,
}

/// Expected stake over expected seat price. `None` for a zero price.
pub fn seat_ratio(expected_stake: Amount, seat_price: Amount) -> Option<f64> {
    if seat_price == 0 {
        return None;
    }
    Some(expected_stake as f64 / seat_price as f64)
}

pub fn classify(ratio: f64, tolerance: f64) -> SeatDecision {
    if ratio > 1.0 + tolerance {
        SeatDecision::Unstake
    } else if ratio < 1.0 {
        SeatDecision::Stake
    } else {
        SeatDecision::Balanced
    }
}

/// Tokens to unstake so the pool keeps `margin` above the seat price.
pub fn unstake_target(expected_stake: Amount, seat_price: Amount, margin: Amount) -> Amount {
    expected_stake.saturating_sub(seat_price.saturating_add(margin))
}

/// Tokens to stake to reach the seat price plus `margin`.
pub fn stake_target(expected_stake: Amount, seat_price: Amount, margin: Amount) -> Amount {
    seat_price
        .saturating_add(margin)
        .saturating_sub(expected_stake)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_boundaries() {
        assert_eq!(classify(1.0005, DEFAULT_RATIO_TOLERANCE), SeatDecision::Balanced);
        assert_eq!(classify(1.002, DEFAULT_RATIO_TOLERANCE), SeatDecision::Unstake);
        assert_eq!(classify(0.999, DEFAULT_RATIO_TOLERANCE), SeatDecision::Stake);
        assert_eq!(classify(1.0, DEFAULT_RATIO_TOLERANCE), SeatDecision::Balanced);
    }

    #[test]
    fn ratio_of_amounts() {
        let ratio = seat_ratio(1_000, 900).unwrap();
        assert!((ratio - 1.111).abs() < 0.001);
        assert_eq!(classify(ratio, DEFAULT_RATIO_TOLERANCE), SeatDecision::Unstake);
        assert_eq!(seat_ratio(1_000, 0), None);
    }

    #[test]
    fn targets_keep_margin() {
        assert_eq!(unstake_target(1_000, 900, 10), 90);
        assert_eq!(unstake_target(1_000, 900, 100), 0);
        assert_eq!(stake_target(800, 900, 100), 200);
        assert_eq!(stake_target(1_000, 900, 0), 0);
    }
}
