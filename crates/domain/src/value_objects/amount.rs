//! Fixed-point token amounts.
//!
//! An [`Amount`] is an unsigned 256-bit integer scaled by `10^decimals`, the
//! same representation ERC-20 contracts return from balance and lock reads.

use crate::error::DomainError;
use primitive_types::{U256, U512};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown while a value is loading or unavailable.
pub const PLACEHOLDER: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount {
    pub raw: U256,
    pub decimals: u8,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::new(U256::zero(), decimals)
    }

    /// Creates an amount of `whole` full tokens.
    ///
    /// # Errors
    /// Returns [`DomainError::AmountOverflow`] if the scaled value does not fit.
    pub fn from_whole(whole: u64, decimals: u8) -> Result<Self, DomainError> {
        let raw = U256::from(whole)
            .checked_mul(Self::scale(decimals)?)
            .ok_or(DomainError::AmountOverflow)?;
        Ok(Self::new(raw, decimals))
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Parses user input such as `"1000"`, `"0.25"` or `".5"`.
    ///
    /// # Errors
    /// Rejects empty or non-numeric text, more fractional digits than the
    /// token supports, and values that overflow 256 bits.
    pub fn parse_units(input: &str, decimals: u8) -> Result<Self, DomainError> {
        let text = input.trim().replace(',', "");
        let invalid = || DomainError::InvalidAmount(input.to_string());

        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text.as_str(), ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }
        if frac_part.len() > decimals as usize {
            return Err(DomainError::TooManyDecimals {
                found: frac_part.len(),
                max: decimals,
            });
        }

        let scale = Self::scale(decimals)?;
        let whole = if int_part.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(int_part).map_err(|_| DomainError::AmountOverflow)?
        };
        let mut raw = whole
            .checked_mul(scale)
            .ok_or(DomainError::AmountOverflow)?;

        if !frac_part.is_empty() {
            let padded = format!("{frac_part:0<width$}", width = decimals as usize);
            let frac = U256::from_dec_str(&padded).map_err(|_| invalid())?;
            raw = raw.checked_add(frac).ok_or(DomainError::AmountOverflow)?;
        }

        Ok(Self::new(raw, decimals))
    }

    /// Full-precision decimal string with trailing fractional zeros removed.
    pub fn format_units(&self) -> String {
        let (whole, frac) = self.split();
        if frac.is_empty() {
            whole
        } else {
            format!("{whole}.{frac}")
        }
    }

    /// Human display: thousands separators and at most `precision`
    /// fractional digits (truncated, never rounded up).
    pub fn format_display(&self, precision: usize) -> String {
        let (whole, frac) = self.split();
        let grouped = group_thousands(&whole);
        let frac: String = frac.chars().take(precision).collect();
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            grouped
        } else {
            format!("{grouped}.{frac}")
        }
    }

    /// Converts to a [`Decimal`], or `None` if the value exceeds its range.
    pub fn to_decimal(&self) -> Option<Decimal> {
        if self.raw.bits() > 96 {
            return None;
        }
        let raw = i128::try_from(self.raw.low_u128()).ok()?;
        Decimal::try_from_i128_with_scale(raw, u32::from(self.decimals)).ok()
    }

    /// Converts from a [`Decimal`], truncating digits beyond `decimals`.
    /// Negative inputs clamp to zero.
    pub fn from_decimal(d: Decimal, decimals: u8) -> Self {
        if d.is_sign_negative() {
            return Self::zero(decimals);
        }
        // Decimal::to_string keeps every significant digit, so the parse
        // only fails on excess precision, which we truncate first.
        let truncated = d.trunc_with_scale(u32::from(decimals).min(28));
        Self::parse_units(&truncated.normalize().to_string(), decimals)
            .unwrap_or_else(|_| Self::zero(decimals))
    }

    /// `self * numerator / denominator`, truncating. A zero denominator
    /// yields zero.
    pub fn mul_div(&self, numerator: U256, denominator: U256) -> Self {
        if denominator.is_zero() {
            return Self::zero(self.decimals);
        }
        let product = self.raw.full_mul(numerator) / U512::from(denominator);
        let raw = U256::try_from(product).unwrap_or(U256::MAX);
        Self::new(raw, self.decimals)
    }

    /// # Errors
    /// Fails on mismatched decimals or overflow.
    pub fn checked_add(&self, other: &Self) -> Result<Self, DomainError> {
        if self.decimals != other.decimals {
            return Err(DomainError::DecimalsMismatch {
                left: self.decimals,
                right: other.decimals,
            });
        }
        let raw = self
            .raw
            .checked_add(other.raw)
            .ok_or(DomainError::AmountOverflow)?;
        Ok(Self::new(raw, self.decimals))
    }

    fn scale(decimals: u8) -> Result<U256, DomainError> {
        // 10^77 is the largest power of ten below 2^256.
        if decimals > 77 {
            return Err(DomainError::AmountOverflow);
        }
        Ok(U256::exp10(decimals as usize))
    }

    fn split(&self) -> (String, String) {
        let digits = self.raw.to_string();
        let decimals = self.decimals as usize;
        if decimals == 0 {
            return (digits, String::new());
        }
        let padded = format!("{digits:0>width$}", width = decimals + 1);
        let (whole, frac) = padded.split_at(padded.len() - decimals);
        (whole.to_string(), frac.trim_end_matches('0').to_string())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_units())
    }
}

/// Formats an optional amount, falling back to [`PLACEHOLDER`].
pub fn format_or_placeholder(amount: Option<&Amount>, precision: usize) -> String {
    amount.map_or_else(|| PLACEHOLDER.to_string(), |a| a.format_display(precision))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_whole_and_fractional() {
        let a = Amount::parse_units("1000", 18).unwrap();
        assert_eq!(a.raw, U256::exp10(21));

        let b = Amount::parse_units("0.25", 6).unwrap();
        assert_eq!(b.raw, U256::from(250_000u64));

        let c = Amount::parse_units(".5", 8).unwrap();
        assert_eq!(c.raw, U256::from(50_000_000u64));

        let d = Amount::parse_units("1,234.5", 2).unwrap();
        assert_eq!(d.raw, U256::from(123_450u64));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            Amount::parse_units("", 18),
            Err(DomainError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::parse_units(".", 18),
            Err(DomainError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::parse_units("1.2.3", 18),
            Err(DomainError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::parse_units("-5", 18),
            Err(DomainError::InvalidAmount(_))
        ));
        assert_eq!(
            Amount::parse_units("0.1234567", 6),
            Err(DomainError::TooManyDecimals { found: 7, max: 6 })
        );
    }

    #[test]
    fn test_format_units() {
        let a = Amount::new(U256::from(1_500_000u64), 6);
        assert_eq!(a.format_units(), "1.5");
        assert_eq!(Amount::zero(18).format_units(), "0");
        assert_eq!(Amount::new(U256::from(5u64), 3).format_units(), "0.005");
        assert_eq!(Amount::new(U256::from(42u64), 0).to_string(), "42");
    }

    #[test]
    fn test_format_display_groups_and_truncates() {
        let a = Amount::parse_units("1234567.98765", 18).unwrap();
        assert_eq!(a.format_display(2), "1,234,567.98");
        assert_eq!(a.format_display(0), "1,234,567");
        let b = Amount::parse_units("100.10", 18).unwrap();
        assert_eq!(b.format_display(4), "100.1");
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(format_or_placeholder(None, 2), "---");
        let a = Amount::parse_units("12.5", 18).unwrap();
        assert_eq!(format_or_placeholder(Some(&a), 2), "12.5");
    }

    #[test]
    fn test_decimal_conversion() {
        let a = Amount::parse_units("1000.5", 18).unwrap();
        assert_eq!(a.to_decimal(), Some(dec!(1000.5)));

        let b = Amount::from_decimal(dec!(2.123456789), 6);
        assert_eq!(b.format_units(), "2.123456");

        assert!(Amount::from_decimal(dec!(-1), 18).is_zero());
        assert_eq!(Amount::new(U256::MAX, 18).to_decimal(), None);
    }

    #[test]
    fn test_mul_div() {
        let a = Amount::from_whole(1000, 18).unwrap();
        let half = a.mul_div(U256::from(1u64), U256::from(2u64));
        assert_eq!(half.format_units(), "500");
        assert!(a.mul_div(U256::one(), U256::zero()).is_zero());

        let huge = Amount::new(U256::MAX, 0);
        assert_eq!(huge.mul_div(U256::from(3u64), U256::from(3u64)).raw, U256::MAX);
    }

    #[test]
    fn test_checked_add() {
        let a = Amount::from_whole(1, 18).unwrap();
        let b = Amount::from_whole(2, 18).unwrap();
        assert_eq!(a.checked_add(&b).unwrap().format_units(), "3");

        let c = Amount::from_whole(1, 6).unwrap();
        assert!(matches!(
            a.checked_add(&c),
            Err(DomainError::DecimalsMismatch { .. })
        ));
    }
}
