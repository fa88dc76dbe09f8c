//! Fixed-point amount helpers.
//!
//! The chain denominates stake in 10^-24 units. The controller works in
//! whole tokens, so decoding truncates the fractional digits and encoding
//! appends zeros again. The round trip is lossy: `encode_balance(
//! decode_balance(s))` only equals `s` when the fraction was all zeros.
//!
//! Every parser here fails closed and returns `0` on malformed input.

use crate::types::Amount;

/// Number of fractional digits in an on-chain amount.
pub const FRACTION_DIGITS: usize = 24;

/// Decode a fixed-point balance string into whole tokens.
///
/// Accepts raw digit strings (`"1500000000000000000000000"`) as well as
/// command output that wraps them in quotes, prefixes log lines, or trails
/// a suffix after the digits. Only the last line is considered.
pub fn decode_balance(raw: &str) -> Amount {
    let s = raw.trim();
    if s.chars().count() <= 1 {
        return 0;
    }

    let line = s
        .lines()
        .last()
        .unwrap_or_default()
        .trim()
        .trim_start_matches(['\'', '"']);
    let end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    let digits = &line[..end];

    if digits.len() <= FRACTION_DIGITS {
        return 0;
    }
    digits[..digits.len() - FRACTION_DIGITS]
        .parse::<Amount>()
        .unwrap_or(0)
}

/// Encode whole tokens as a fixed-point string.
pub fn encode_balance(amount: Amount) -> String {
    if amount == 0 {
        return "0".to_string();
    }
    format!("{amount}{}", "0".repeat(FRACTION_DIGITS))
}

/// Parse a plain integer amount such as `"1,234,567"`.
pub fn parse_amount(raw: &str) -> Amount {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<Amount>().unwrap_or(0)
}

/// Extract the proposed stake from one proposal-listing record.
///
/// Records are pipe delimited. The amount lives in the fourth field: a
/// lone token is the amount itself, otherwise the field reads
/// `<old> => <new>` and the third token is taken.
pub fn parse_proposal_stake(record: &str) -> Amount {
    let Some(field) = record.split('|').nth(3) else {
        return 0;
    };
    let tokens: Vec<&str> = field.split_whitespace().collect();
    let token = if tokens.len() > 1 {
        tokens.get(2)
    } else {
        tokens.first()
    };
    token.map(|t| parse_amount(t)).unwrap_or(0)
}
