//! Splitting a stake or unstake target across delegators.
//!
//! Both directions fill the target greedily from the largest available
//! balance down, with the delegator id as a deterministic tie-break. The
//! functions are pure: the same balances and target always produce the
//! same partition.

use warchest_core::{Amount, Delegator};

/// Amount one delegator should stake or unstake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub delegator_id: String,
    pub amount: Amount,
}

/// Split `target` across delegators' staked balances.
pub fn allocate_unstake(delegators: &[Delegator], target: Amount) -> Vec<Allocation> {
    fill_largest_first(
        delegators.iter().map(|d| (d.id.as_str(), d.staked_balance)),
        target,
    )
}

/// Split `target` across delegators' unstaked balances.
///
/// When liquidity is short the partition covers as much as possible.
pub fn allocate_stake(delegators: &[Delegator], target: Amount) -> Vec<Allocation> {
    fill_largest_first(
        delegators.iter().map(|d| (d.id.as_str(), d.unstaked_balance)),
        target,
    )
}

fn fill_largest_first<'a>(
    balances: impl Iterator<Item = (&'a str, Amount)>,
    target: Amount,
) -> Vec<Allocation> {
    let mut sorted: Vec<(&str, Amount)> = balances.filter(|(_, b)| *b > 0).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut remaining = target;
    let mut out = Vec::new();
    for (id, balance) in sorted {
        if remaining == 0 {
            break;
        }
        let amount = remaining.min(balance);
        out.push(Allocation {
            delegator_id: id.to_string(),
            amount,
        });
        remaining -= amount;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delegator(id: &str, staked: Amount, unstaked: Amount) -> Delegator {
        Delegator {
            id: id.to_string(),
            staked_balance: staked,
            unstaked_balance: unstaked,
        }
    }

    fn alloc(id: &str, amount: Amount) -> Allocation {
        Allocation {
            delegator_id: id.to_string(),
            amount,
        }
    }

    #[test]
    fn unstake_takes_from_largest_first() {
        let ds = vec![
            delegator("a", 100, 0),
            delegator("b", 500, 0),
            delegator("c", 300, 0),
        ];
        assert_eq!(allocate_unstake(&ds, 200), vec![alloc("b", 200)]);
    }

    #[test]
    fn unstake_carries_remainder_to_next() {
        let ds = vec![
            delegator("a", 100, 0),
            delegator("b", 500, 0),
            delegator("c", 300, 0),
        ];
        assert_eq!(
            allocate_unstake(&ds, 700),
            vec![alloc("b", 500), alloc("c", 200)]
        );
    }

    #[test]
    fn unstake_exhausts_delegators() {
        let ds = vec![delegator("a", 100, 0), delegator("b", 50, 0)];
        assert_eq!(
            allocate_unstake(&ds, 1_000),
            vec![alloc("a", 100), alloc("b", 50)]
        );
    }

    #[test]
    fn stake_uses_unstaked_balances() {
        let ds = vec![delegator("a", 10_000, 40), delegator("b", 0, 90)];
        assert_eq!(allocate_stake(&ds, 60), vec![alloc("b", 60)]);
    }

    #[test]
    fn stake_accumulates_until_target() {
        let ds = vec![
            delegator("a", 0, 40),
            delegator("b", 0, 90),
            delegator("c", 0, 70),
        ];
        assert_eq!(
            allocate_stake(&ds, 150),
            vec![alloc("b", 90), alloc("c", 60)]
        );
    }

    #[test]
    fn ties_break_on_id() {
        let ds = vec![delegator("zed", 0, 50), delegator("amy", 0, 50)];
        assert_eq!(
            allocate_stake(&ds, 70),
            vec![alloc("amy", 50), alloc("zed", 20)]
        );
    }

    #[test]
    fn never_proposes_zero_amounts() {
        let ds = vec![delegator("a", 0, 0), delegator("b", 0, 10)];
        assert!(allocate_stake(&ds, 0).is_empty());
        assert_eq!(allocate_stake(&ds, 5), vec![alloc("b", 5)]);
        assert!(allocate_unstake(&ds, 5).is_empty());
    }

    #[test]
    fn empty_delegators_is_insufficient_liquidity() {
        assert!(allocate_stake(&[], 100).is_empty());
        assert!(allocate_unstake(&[], 100).is_empty());
    }

    #[test]
    fn allocation_is_order_independent() {
        let ds = vec![
            delegator("a", 300, 0),
            delegator("b", 300, 0),
            delegator("c", 200, 0),
        ];
        let mut reversed = ds.clone();
        reversed.reverse();
        assert_eq!(allocate_unstake(&ds, 450), allocate_unstake(&reversed, 450));
        assert_eq!(
            allocate_unstake(&ds, 450),
            vec![alloc("a", 300), alloc("b", 150)]
        );
    }
}
