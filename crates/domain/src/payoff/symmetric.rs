//! Symmetric barrier payoff.
//!
//! Inside the barriers, yield grows linearly with distance from the
//! barrier midpoint and reaches `max_yield` at either barrier. Outside the
//! barriers the note knocks out to `base_yield`.

use super::{PayoffProfile, PayoffTerms};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, Default)]
pub struct SymmetricBarrier;

impl PayoffProfile for SymmetricBarrier {
    fn yield_at(&self, terms: &PayoffTerms, performance: Decimal) -> Decimal {
        if !terms.contains(performance) {
            return terms.base_yield;
        }
        let two = Decimal::TWO;
        let midpoint = (terms.lower_barrier + terms.upper_barrier) / two;
        let half_width = (terms.upper_barrier - terms.lower_barrier) / two;
        if half_width.is_zero() {
            return terms.base_yield;
        }
        let deviation = (performance - midpoint).abs() / half_width;
        terms.base_yield + (terms.max_yield - terms.base_yield) * deviation
    }

    fn peak_yield(&self, terms: &PayoffTerms) -> Decimal {
        terms.max_yield
    }

    fn name(&self) -> &'static str {
        "Symmetric Barrier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn terms() -> PayoffTerms {
        PayoffTerms {
            base_yield: dec!(4),
            max_yield: dec!(12),
            lower_barrier: dec!(-10),
            upper_barrier: dec!(10),
            participation_rate: Decimal::ZERO,
        }
    }

    #[test]
    fn test_base_outside_barriers() {
        let t = terms();
        assert_eq!(SymmetricBarrier.yield_at(&t, dec!(-10.01)), dec!(4));
        assert_eq!(SymmetricBarrier.yield_at(&t, dec!(25)), dec!(4));
    }

    #[test]
    fn test_max_at_barriers_and_base_at_midpoint() {
        let t = terms();
        assert_eq!(SymmetricBarrier.yield_at(&t, dec!(-10)), dec!(12));
        assert_eq!(SymmetricBarrier.yield_at(&t, dec!(10)), dec!(12));
        assert_eq!(SymmetricBarrier.yield_at(&t, dec!(0)), dec!(4));
    }

    #[test]
    fn test_linear_between() {
        let t = terms();
        assert_eq!(SymmetricBarrier.yield_at(&t, dec!(5)), dec!(8));
        assert_eq!(SymmetricBarrier.yield_at(&t, dec!(-5)), dec!(8));
    }

    #[test]
    fn test_offset_range() {
        let t = PayoffTerms {
            lower_barrier: dec!(0),
            upper_barrier: dec!(20),
            ..terms()
        };
        assert_eq!(SymmetricBarrier.yield_at(&t, dec!(10)), dec!(4));
        assert_eq!(SymmetricBarrier.yield_at(&t, dec!(15)), dec!(8));
        assert_eq!(SymmetricBarrier.yield_at(&t, dec!(20)), dec!(12));
    }
}
