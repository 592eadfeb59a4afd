//! Participation-weighted payoff.
//!
//! Upside-only shape: from the lower barrier, yield grows by
//! `participation_rate` per point of performance, capped at `max_yield`,
//! and knocks out to `base_yield` past the upper barrier.

use super::{PayoffProfile, PayoffTerms};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, Default)]
pub struct ParticipationWeighted;

impl PayoffProfile for ParticipationWeighted {
    fn yield_at(&self, terms: &PayoffTerms, performance: Decimal) -> Decimal {
        if !terms.contains(performance) {
            return terms.base_yield;
        }
        let earned = terms.participation_rate * (performance - terms.lower_barrier);
        (terms.base_yield + earned).min(terms.max_yield)
    }

    fn peak_yield(&self, terms: &PayoffTerms) -> Decimal {
        self.yield_at(terms, terms.upper_barrier)
    }

    fn name(&self) -> &'static str {
        "Participation Weighted"
    }
}
