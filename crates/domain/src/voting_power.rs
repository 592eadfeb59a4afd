//! Vote-escrow voting power.
//!
//! Locking the governance token for `t` hours grants voting power equal to
//! `amount * t / MAX_LOCK_HOURS`, decaying linearly to zero at expiry.

use crate::value_objects::amount::Amount;
use chrono::TimeDelta;
use primitive_types::U256;

pub const HOURS_PER_YEAR: i64 = 365 * 24;

/// Maximum lock period: two years.
pub const MAX_LOCK_HOURS: i64 = 2 * HOURS_PER_YEAR;

/// Minimum lock period accepted for a new lock: one week.
pub const MIN_LOCK_HOURS: i64 = 7 * 24;

const SECONDS_PER_HOUR: i64 = 3_600;

/// Rounds a duration to whole hours, half away from zero.
pub fn rounded_hours(duration: TimeDelta) -> i64 {
    let secs = duration.num_seconds();
    let whole = secs / SECONDS_PER_HOUR;
    let rem = secs % SECONDS_PER_HOUR;
    if rem.abs() * 2 >= SECONDS_PER_HOUR {
        whole + rem.signum()
    } else {
        whole
    }
}

/// Voting power granted by `locked_amount` with `time_to_expiry` remaining.
///
/// Expired locks (zero or negative time) carry no voting power. Time beyond
/// the maximum lock period is capped, so the result never exceeds the
/// locked amount. The result keeps the locked token's decimals.
pub fn compute_voting_power(locked_amount: Amount, time_to_expiry: TimeDelta) -> Amount {
    let hours = rounded_hours(time_to_expiry).clamp(0, MAX_LOCK_HOURS);
    if hours == 0 {
        return Amount::zero(locked_amount.decimals);
    }
    locked_amount.mul_div(
        U256::from(hours.unsigned_abs()),
        U256::from(MAX_LOCK_HOURS.unsigned_abs()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rbn(whole: u64) -> Amount {
        Amount::from_whole(whole, 18).unwrap()
    }

    #[test]
    fn test_full_lock_gives_full_power() {
        let vp = compute_voting_power(rbn(1000), TimeDelta::hours(MAX_LOCK_HOURS));
        assert_eq!(vp, rbn(1000));
    }

    #[test]
    fn test_one_year_gives_half_power() {
        let vp = compute_voting_power(rbn(1000), TimeDelta::hours(8_760));
        assert_eq!(vp, rbn(500));
    }

    #[test]
    fn test_expired_lock_has_no_power() {
        assert!(compute_voting_power(rbn(1000), TimeDelta::zero()).is_zero());
        assert!(compute_voting_power(rbn(1000), TimeDelta::hours(-5)).is_zero());
        // Rounds to zero hours.
        assert!(compute_voting_power(rbn(1000), TimeDelta::minutes(29)).is_zero());
    }

    #[test]
    fn test_longer_than_max_is_capped() {
        let vp = compute_voting_power(rbn(10), TimeDelta::hours(MAX_LOCK_HOURS * 3));
        assert_eq!(vp, rbn(10));
    }

    #[test]
    fn test_rounded_hours() {
        assert_eq!(rounded_hours(TimeDelta::minutes(90)), 2);
        assert_eq!(rounded_hours(TimeDelta::minutes(89)), 1);
        assert_eq!(rounded_hours(TimeDelta::minutes(-90)), -2);
        assert_eq!(rounded_hours(TimeDelta::seconds(1_799)), 0);
    }

    #[test]
    fn test_keeps_decimals() {
        let usdc = Amount::from_whole(100, 6).unwrap();
        let vp = compute_voting_power(usdc, TimeDelta::hours(HOURS_PER_YEAR / 2));
        assert_eq!(vp.decimals, 6);
        assert_eq!(vp.format_units(), "25");
    }
}
