pub mod amount;

pub use amount::{Amount, PLACEHOLDER, format_or_placeholder};
