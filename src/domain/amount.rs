//! Human decimal amounts and their fixed-point smallest-unit representation
//!
//! Amounts typed by the user are parsed with [`rust_decimal`] so nothing ever
//! passes through binary floating point. Conversion to smallest units truncates,
//! never rounds up, so a request never exceeds what the user typed.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Largest number of decimals a token may declare here
pub const MAX_DECIMALS: u32 = 18;

/// Outcome of filtering one edit of the amount field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountInput {
    /// Field cleared
    Empty,
    /// Parsed, non-negative amount
    Value(Decimal),
    /// Not a finite non-negative number; the edit is dropped
    Rejected,
}

impl AmountInput {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, AmountInput::Rejected)
    }

    /// Amount if present and strictly positive
    pub fn positive(&self) -> Option<Decimal> {
        match self {
            AmountInput::Value(v) if !v.is_zero() => Some(*v),
            _ => None,
        }
    }
}

/// Classify a raw edit of the amount field.
pub fn check_input(raw: &str) -> AmountInput {
    if raw.trim().is_empty() {
        return AmountInput::Empty;
    }
    match parse_amount(raw) {
        Some(value) => AmountInput::Value(value),
        None => AmountInput::Rejected,
    }
}

/// Parse a human decimal amount.
///
/// Accepts the partial forms a number field produces while typing (`"1."`,
/// `".5"`) and scientific notation. Returns `None` for anything negative or
/// not a finite number.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = trimmed.strip_suffix('.').unwrap_or(trimmed);
    let candidate = match candidate.strip_prefix('.') {
        Some(fraction) => format!("0.{}", fraction),
        None => candidate.to_string(),
    };
    if candidate.is_empty() || candidate.starts_with('+') {
        return None;
    }

    let value = if candidate.contains(['e', 'E']) {
        Decimal::from_scientific(&candidate).ok()?
    } else {
        Decimal::from_str(&candidate).ok()?
    };

    if value.is_sign_negative() && !value.is_zero() {
        return None;
    }
    Some(value.abs())
}

fn scale_factor(decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(10i128.pow(decimals.min(MAX_DECIMALS)), 0)
}

/// Convert a human amount to smallest units, truncating extra precision.
///
/// Returns `None` when the scaled value does not fit.
pub fn to_smallest_unit(amount: Decimal, decimals: u32) -> Option<u128> {
    amount
        .checked_mul(scale_factor(decimals))?
        .trunc()
        .to_u128()
}

/// Convert smallest units back to a human amount
pub fn from_smallest_unit(value: u128, decimals: u32) -> Option<Decimal> {
    let mantissa = i128::try_from(value).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, decimals.min(MAX_DECIMALS)).ok()
}

/// Render a smallest-unit integer as a fixed-point string with exactly
/// `display_dp` decimals, truncated.
pub fn format_units(value: u128, decimals: u32, display_dp: u32) -> Option<String> {
    let mut amount = from_smallest_unit(value, decimals)?
        .round_dp_with_strategy(display_dp, RoundingStrategy::ToZero);
    amount.rescale(display_dp);
    Some(amount.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_plain_and_partial_forms() {
        assert_eq!(parse_amount("1.5"), Some(dec!(1.5)));
        assert_eq!(parse_amount("10"), Some(dec!(10)));
        assert_eq!(parse_amount("1."), Some(dec!(1)));
        assert_eq!(parse_amount(".5"), Some(dec!(0.5)));
        assert_eq!(parse_amount(" 2 "), Some(dec!(2)));
        assert_eq!(parse_amount("1e3"), Some(dec!(1000)));
        assert_eq!(parse_amount("0"), Some(dec!(0)));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for raw in ["-1", "-0.5", "abc", "NaN", "Infinity", "inf", ".", "1.2.3", "+1", "1,5"] {
            assert_eq!(parse_amount(raw), None, "{raw} should be rejected");
        }
    }

    #[test]
    fn test_check_input() {
        assert_eq!(check_input(""), AmountInput::Empty);
        assert_eq!(check_input("   "), AmountInput::Empty);
        assert_eq!(check_input("0.25"), AmountInput::Value(dec!(0.25)));
        assert_eq!(check_input("-3"), AmountInput::Rejected);
        assert!(!check_input("x").is_accepted());
        assert_eq!(check_input("0").positive(), None);
        assert_eq!(check_input("4").positive(), Some(dec!(4)));
    }

    #[test]
    fn test_to_smallest_unit_truncates() {
        assert_eq!(to_smallest_unit(dec!(1.5), 6), Some(1_500_000));
        assert_eq!(to_smallest_unit(dec!(0.0000019), 6), Some(1));
        assert_eq!(to_smallest_unit(dec!(0.0000009), 6), Some(0));
        assert_eq!(to_smallest_unit(dec!(10), 6), Some(10_000_000));
        assert_eq!(to_smallest_unit(dec!(3), 18), Some(3_000_000_000_000_000_000));
    }

    #[test]
    fn test_to_smallest_unit_overflow() {
        assert_eq!(to_smallest_unit(Decimal::MAX, 6), None);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(
            format_units(3_000_000_000_000_000_000, 18, 6).as_deref(),
            Some("3.000000")
        );
        assert_eq!(
            format_units(1_234_567_891_000_000_000, 18, 6).as_deref(),
            Some("1.234567")
        );
        assert_eq!(format_units(1_500_000, 6, 2).as_deref(), Some("1.50"));
        assert_eq!(format_units(0, 18, 6).as_deref(), Some("0.000000"));
        assert_eq!(format_units(u128::MAX, 18, 6), None);
    }
}
