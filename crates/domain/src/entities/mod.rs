pub mod lock_position;
pub mod token;

// Re-export for easier access
pub use lock_position::LockPosition;
pub use token::Token;
