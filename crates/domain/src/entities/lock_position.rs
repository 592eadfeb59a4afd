use crate::error::DomainError;
use crate::value_objects::amount::Amount;
use crate::voting_power::{MAX_LOCK_HOURS, MIN_LOCK_HOURS, compute_voting_power, rounded_hours};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A locked governance-token position as read from the escrow contract.
///
/// Positions only change through on-chain transactions; the helpers here
/// return previews and never mutate `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockPosition {
    pub amount: Amount,
    pub lock_expiry: DateTime<Utc>,
}

impl LockPosition {
    pub fn new(amount: Amount, lock_expiry: DateTime<Utc>) -> Self {
        Self {
            amount,
            lock_expiry,
        }
    }

    /// Validates a proposed new lock of `amount` for `duration` from `now`.
    ///
    /// # Errors
    /// Rejects zero amounts and durations outside one week to two years.
    pub fn new_lock(
        amount: Amount,
        duration: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if amount.is_zero() {
            return Err(DomainError::ZeroLockAmount);
        }
        check_lock_hours(rounded_hours(duration))?;
        Ok(Self::new(amount, now + duration))
    }

    pub fn time_to_expiry(&self, now: DateTime<Utc>) -> TimeDelta {
        self.lock_expiry - now
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.lock_expiry <= now
    }

    pub fn voting_power_at(&self, now: DateTime<Utc>) -> Amount {
        compute_voting_power(self.amount, self.time_to_expiry(now))
    }

    /// Preview of the position after locking `extra` more tokens.
    pub fn increase_amount(&self, extra: &Amount) -> Result<Self, DomainError> {
        Ok(Self::new(self.amount.checked_add(extra)?, self.lock_expiry))
    }

    /// Preview of the position after moving expiry to `new_expiry`.
    ///
    /// # Errors
    /// The new expiry must be later than the current one and no further
    /// than the maximum lock period from `now`.
    pub fn extend_expiry(
        &self,
        new_expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if new_expiry <= self.lock_expiry {
            return Err(DomainError::ExpiryNotExtended);
        }
        let hours = rounded_hours(new_expiry - now);
        if hours > MAX_LOCK_HOURS {
            return Err(DomainError::LockTooLong {
                hours,
                max: MAX_LOCK_HOURS,
            });
        }
        Ok(Self::new(self.amount, new_expiry))
    }
}

fn check_lock_hours(hours: i64) -> Result<(), DomainError> {
    if hours < MIN_LOCK_HOURS {
        return Err(DomainError::LockTooShort {
            hours,
            min: MIN_LOCK_HOURS,
        });
    }
    if hours > MAX_LOCK_HOURS {
        return Err(DomainError::LockTooLong {
            hours,
            max: MAX_LOCK_HOURS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn rbn(whole: u64) -> Amount {
        Amount::from_whole(whole, 18).unwrap()
    }

    #[test]
    fn test_new_lock_validation() {
        let lock = LockPosition::new_lock(rbn(100), TimeDelta::days(365), now()).unwrap();
        assert_eq!(lock.lock_expiry, now() + TimeDelta::days(365));

        assert_eq!(
            LockPosition::new_lock(Amount::zero(18), TimeDelta::days(30), now()),
            Err(DomainError::ZeroLockAmount)
        );
        assert!(matches!(
            LockPosition::new_lock(rbn(1), TimeDelta::days(3), now()),
            Err(DomainError::LockTooShort { .. })
        ));
        assert!(matches!(
            LockPosition::new_lock(rbn(1), TimeDelta::days(800), now()),
            Err(DomainError::LockTooLong { .. })
        ));
    }

    #[test]
    fn test_voting_power_decays_to_zero() {
        let lock = LockPosition::new(rbn(1000), now() + TimeDelta::hours(MAX_LOCK_HOURS));
        assert_eq!(lock.voting_power_at(now()), rbn(1000));
        assert_eq!(
            lock.voting_power_at(now() + TimeDelta::hours(MAX_LOCK_HOURS / 2)),
            rbn(500)
        );
        let after = lock.lock_expiry + TimeDelta::days(1);
        assert!(lock.is_expired(after));
        assert!(lock.voting_power_at(after).is_zero());
    }

    #[test]
    fn test_previews() {
        let lock = LockPosition::new(rbn(100), now() + TimeDelta::days(30));

        let bigger = lock.increase_amount(&rbn(50)).unwrap();
        assert_eq!(bigger.amount, rbn(150));
        assert_eq!(bigger.lock_expiry, lock.lock_expiry);

        let later = lock
            .extend_expiry(now() + TimeDelta::days(60), now())
            .unwrap();
        assert_eq!(later.amount, lock.amount);
        assert!(later.voting_power_at(now()) > lock.voting_power_at(now()));

        assert_eq!(
            lock.extend_expiry(now() + TimeDelta::days(10), now()),
            Err(DomainError::ExpiryNotExtended)
        );
        assert!(matches!(
            lock.extend_expiry(now() + TimeDelta::days(900), now()),
            Err(DomainError::LockTooLong { .. })
        ));
    }
}
