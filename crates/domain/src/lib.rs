//! Domain model for vote-escrow governance and structured-note previews.
//!
//! Everything here is pure and synchronous:
//! - Fixed-point token amounts
//! - Lock positions and vote-escrow voting power
//! - Gauge reward boost
//! - Payoff profiles and yield curves for principal-protected notes

/// Gauge reward boost.
pub mod boost;
/// Entities read from chain.
pub mod entities;
/// Error types.
pub mod error;
/// Payoff profiles and curve generation.
pub mod payoff;
/// Value objects.
pub mod value_objects;
/// Voting power formula.
pub mod voting_power;

pub use error::DomainError;
