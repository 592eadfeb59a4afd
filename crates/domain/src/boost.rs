//! Gauge reward boost from voting power.
//!
//! A depositor's working balance starts at 40% of their deposit and grows
//! with their share of total voting power, up to the full deposit. The
//! boost is the working balance relative to the unboosted 40%, so it ranges
//! from 1.0x to 2.5x.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Share of a deposit that earns rewards without any voting power.
pub const TOKENLESS_PRODUCTION: Decimal = Decimal::from_parts(4, 0, 0, false, 1);

/// Upper bound of the boost multiplier (`1 / TOKENLESS_PRODUCTION`).
pub const MAX_BOOST: Decimal = Decimal::from_parts(25, 0, 0, false, 1);

/// Inputs in whole-token units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostInputs {
    /// The user's gauge deposit.
    pub deposit: Decimal,
    /// Total gauge deposits, including the user's.
    pub total_liquidity: Decimal,
    /// The user's voting power.
    pub voting_power: Decimal,
    /// Total voting power supply.
    pub voting_power_supply: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostResult {
    pub working_balance: Decimal,
    pub boost: Decimal,
}

pub fn compute_boost(inputs: &BoostInputs) -> BoostResult {
    let deposit = inputs.deposit.max(Decimal::ZERO);
    if deposit.is_zero() {
        return BoostResult {
            working_balance: Decimal::ZERO,
            boost: Decimal::ONE,
        };
    }

    let base = deposit * TOKENLESS_PRODUCTION;
    let mut working = base;
    if inputs.voting_power_supply > Decimal::ZERO && inputs.voting_power > Decimal::ZERO {
        // A share above 1 only happens with inconsistent inputs.
        let share = inputs
            .voting_power
            .checked_div(inputs.voting_power_supply)
            .unwrap_or(Decimal::ONE)
            .min(Decimal::ONE);
        // Overflow means the boosted term dwarfs the deposit cap.
        working = inputs
            .total_liquidity
            .max(Decimal::ZERO)
            .checked_mul(share)
            .and_then(|v| v.checked_mul(Decimal::ONE - TOKENLESS_PRODUCTION))
            .and_then(|v| v.checked_add(base))
            .unwrap_or(deposit);
    }
    let working = working.min(deposit);

    BoostResult {
        working_balance: working,
        boost: working
            .checked_div(base)
            .unwrap_or(Decimal::ONE)
            .clamp(Decimal::ONE, MAX_BOOST),
    }
}

/// Voting power needed for `deposit` to reach [`MAX_BOOST`].
///
/// Saturates at [`Decimal::MAX`].
pub fn required_voting_power_for_max_boost(
    deposit: Decimal,
    total_liquidity: Decimal,
    voting_power_supply: Decimal,
) -> Decimal {
    if total_liquidity <= Decimal::ZERO || deposit <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    deposit
        .checked_mul(voting_power_supply)
        .and_then(|v| v.checked_div(total_liquidity))
        .or_else(|| {
            deposit
                .checked_div(total_liquidity)
                .and_then(|ratio| ratio.checked_mul(voting_power_supply))
        })
        .unwrap_or(Decimal::MAX)
}
