use thiserror::Error;

/// Errors raised by domain constructors and validators.
///
/// The formulas themselves are total and clamp instead of failing; these
/// variants only cover malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("amount has {found} fractional digits but the token supports {max}")]
    TooManyDecimals { found: usize, max: u8 },

    #[error("amount does not fit in 256 bits")]
    AmountOverflow,

    #[error("cannot combine amounts with {left} and {right} decimals")]
    DecimalsMismatch { left: u8, right: u8 },

    #[error("lock amount must be greater than zero")]
    ZeroLockAmount,

    #[error("lock of {hours}h is shorter than the minimum of {min}h")]
    LockTooShort { hours: i64, min: i64 },

    #[error("lock of {hours}h is longer than the maximum of {max}h")]
    LockTooLong { hours: i64, max: i64 },

    #[error("new lock expiry must be later than the current one")]
    ExpiryNotExtended,

    #[error("invalid payoff terms: {0}")]
    InvalidPayoffTerms(String),

    #[error("unknown product: {0:?}")]
    UnknownProduct(String),
}
