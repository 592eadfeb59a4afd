use crate::error::DomainError;
use crate::value_objects::amount::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    pub name: String,
}

impl Token {
    pub fn new(
        address: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        name: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            symbol: symbol.into(),
            decimals,
            name: name.into(),
        }
    }

    pub fn rbn() -> Self {
        Self::new(
            "0x6123B0049F904d730dB3C36a31167D9d4121fA6B",
            "RBN",
            18,
            "Ribbon",
        )
    }

    pub fn usdc() -> Self {
        Self::new(
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            "USDC",
            6,
            "USD Coin",
        )
    }

    pub fn steth() -> Self {
        Self::new(
            "0xae7ab96520DE3A18E5e111B5EaAb095312D7fE84",
            "stETH",
            18,
            "Lido Staked Ether",
        )
    }

    /// Parses a user-entered amount of this token.
    pub fn parse_amount(&self, input: &str) -> Result<Amount, DomainError> {
        Amount::parse_units(input, self.decimals)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.name)
    }
}
