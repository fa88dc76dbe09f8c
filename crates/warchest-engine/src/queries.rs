//! Chain queries and actions that go through external commands.

use std::sync::Arc;

use tracing::debug;
use warchest_core::units::{decode_balance, encode_balance, parse_amount, parse_proposal_stake};
use warchest_core::{Amount, CommandTemplates, SeatPriceKind, StakeMethod};
use warchest_exec::{render, CommandRunner};

use crate::error::QueryError;

/// Renders command templates for one pool and interprets their output.
pub struct Queries {
    runner: Arc<dyn CommandRunner>,
    commands: CommandTemplates,
    pool_id: String,
}

impl Queries {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        commands: CommandTemplates,
        pool_id: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            commands,
            pool_id: pool_id.into(),
        }
    }

    async fn run(&self, template: &str, args: &[&str]) -> Result<String, QueryError> {
        let command = render(template, args);
        debug!(%command, "running command");
        Ok(self.runner.run(&command).await?)
    }

    /// Fetch one seat price. Zero or unparsable output is an error.
    pub async fn seat_price(&self, kind: SeatPriceKind) -> Result<Amount, QueryError> {
        let template = match kind {
            SeatPriceKind::Current => &self.commands.current_seat_price,
            SeatPriceKind::Next => &self.commands.next_seat_price,
            SeatPriceKind::Expected => &self.commands.expected_seat_price,
        };
        let output = self.run(template, &[]).await?;
        match parse_amount(last_line(&output)) {
            0 => Err(QueryError::Unparsable {
                what: "seat price",
                output,
            }),
            price => Ok(price),
        }
    }

    /// The pool's stake in the current proposals. Zero when not proposed.
    pub async fn expected_stake(&self) -> Result<Amount, QueryError> {
        let output = self.run(&self.commands.proposals, &[&self.pool_id]).await?;
        let record = output.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        Ok(parse_proposal_stake(record))
    }

    pub async fn staked_balance(&self, delegator: &str) -> Result<Amount, QueryError> {
        let output = self
            .run(&self.commands.staked_balance, &[&self.pool_id, delegator])
            .await?;
        Ok(decode_balance(&output))
    }

    pub async fn unstaked_balance(&self, delegator: &str) -> Result<Amount, QueryError> {
        let output = self
            .run(&self.commands.unstaked_balance, &[&self.pool_id, delegator])
            .await?;
        Ok(decode_balance(&output))
    }

    /// Move `amount` whole tokens of `delegator`'s funds.
    pub async fn stake(
        &self,
        method: StakeMethod,
        amount: Amount,
        delegator: &str,
    ) -> Result<(), QueryError> {
        let encoded = encode_balance(amount);
        self.run(
            &self.commands.stake,
            &[&self.pool_id, method.as_str(), &encoded, delegator],
        )
        .await?;
        Ok(())
    }

    pub async fn ping(&self, delegator: &str) -> Result<(), QueryError> {
        self.run(&self.commands.ping, &[&self.pool_id, delegator])
            .await?;
        Ok(())
    }
}

fn last_line(output: &str) -> &str {
    output
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
}
