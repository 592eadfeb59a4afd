//! Structured-note payoff profiles and yield curves.
//!
//! A note pays `base_yield` when the underlying finishes outside its
//! barrier range and up to `max_yield` inside it. How yield is interpolated
//! inside the range depends on the product, so each product maps to a
//! [`PayoffProfile`] through a [`PayoffRegistry`].

mod curve;
mod participation;
mod symmetric;

pub use curve::{
    CurveResolution, MAX_POINTS_PER_SEGMENT, PayoffCurvePoint, compute_yield_curve,
};
pub use participation::ParticipationWeighted;
pub use symmetric::SymmetricBarrier;

use crate::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Terms of a note, all expressed in percent (e.g. `4.5` for 4.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffTerms {
    pub base_yield: Decimal,
    pub max_yield: Decimal,
    /// Lower barrier as underlying performance.
    pub lower_barrier: Decimal,
    /// Upper barrier as underlying performance.
    pub upper_barrier: Decimal,
    /// Yield points earned per point of performance.
    pub participation_rate: Decimal,
}

impl PayoffTerms {
    /// # Errors
    /// Rejects inverted or empty barrier ranges, `max_yield < base_yield`
    /// and negative participation.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.lower_barrier >= self.upper_barrier {
            return Err(DomainError::InvalidPayoffTerms(format!(
                "lower barrier {} must be below upper barrier {}",
                self.lower_barrier, self.upper_barrier
            )));
        }
        if self.max_yield < self.base_yield {
            return Err(DomainError::InvalidPayoffTerms(format!(
                "max yield {} is below base yield {}",
                self.max_yield, self.base_yield
            )));
        }
        if self.participation_rate.is_sign_negative() {
            return Err(DomainError::InvalidPayoffTerms(format!(
                "participation rate {} is negative",
                self.participation_rate
            )));
        }
        Ok(())
    }

    pub fn contains(&self, performance: Decimal) -> bool {
        performance >= self.lower_barrier && performance <= self.upper_barrier
    }

    /// Maximum yield implied by participating across the whole barrier range.
    pub fn max_yield_from_participation(
        base_yield: Decimal,
        participation_rate: Decimal,
        lower_barrier: Decimal,
        upper_barrier: Decimal,
    ) -> Decimal {
        base_yield + participation_rate * (upper_barrier - lower_barrier)
    }
}

/// Yield as a function of underlying performance for one product shape.
pub trait PayoffProfile: Send + Sync {
    /// Yield in percent when the underlying finishes at `performance`.
    fn yield_at(&self, terms: &PayoffTerms, performance: Decimal) -> Decimal;

    /// Highest yield this profile can pay under `terms`.
    fn peak_yield(&self, terms: &PayoffTerms) -> Decimal;

    fn name(&self) -> &'static str;
}

/// Product identifiers with a registered payoff shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductId {
    /// USDC principal-protected note.
    UsdcEarn,
    /// stETH principal-protected note.
    StEthEarn,
}

impl ProductId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductId::UsdcEarn => "rEARN",
            ProductId::StEthEarn => "rEARN-stETH",
        }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rearn" | "r-earn" | "usdc" | "usdc-earn" => Ok(ProductId::UsdcEarn),
            "rearn-steth" | "r-earn-steth" | "steth" | "steth-earn" => Ok(ProductId::StEthEarn),
            _ => Err(DomainError::UnknownProduct(s.to_string())),
        }
    }
}

/// Strategy table from product to payoff profile.
pub struct PayoffRegistry {
    profiles: HashMap<ProductId, Box<dyn PayoffProfile>>,
}

impl PayoffRegistry {
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Registers or replaces the profile for `product`.
    pub fn register(&mut self, product: ProductId, profile: Box<dyn PayoffProfile>) {
        self.profiles.insert(product, profile);
    }

    pub fn get(&self, product: ProductId) -> Result<&dyn PayoffProfile, DomainError> {
        self.profiles
            .get(&product)
            .map(|p| p.as_ref())
            .ok_or_else(|| DomainError::UnknownProduct(product.to_string()))
    }

    /// Curve for `product`; see [`compute_yield_curve`].
    pub fn curve(
        &self,
        product: ProductId,
        terms: &PayoffTerms,
        resolution: &CurveResolution,
    ) -> Result<Vec<PayoffCurvePoint>, DomainError> {
        compute_yield_curve(terms, self.get(product)?, resolution)
    }
}

impl Default for PayoffRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(ProductId::UsdcEarn, Box::new(SymmetricBarrier));
        registry.register(ProductId::StEthEarn, Box::new(ParticipationWeighted));
        registry
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
            participation_rate: dec!(0.5),
        }
    }

    #[test]
    fn test_validate() {
        assert!(terms().validate().is_ok());

        let inverted = PayoffTerms {
            lower_barrier: dec!(10),
            upper_barrier: dec!(-10),
            ..terms()
        };
        assert!(matches!(
            inverted.validate(),
            Err(DomainError::InvalidPayoffTerms(_))
        ));

        let low_max = PayoffTerms {
            max_yield: dec!(1),
            ..terms()
        };
        assert!(low_max.validate().is_err());

        let negative = PayoffTerms {
            participation_rate: dec!(-1),
            ..terms()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_product_id_parsing() {
        assert_eq!("rEARN".parse::<ProductId>(), Ok(ProductId::UsdcEarn));
        assert_eq!("stETH".parse::<ProductId>(), Ok(ProductId::StEthEarn));
        assert_eq!(
            "T-ETH-C".parse::<ProductId>(),
            Err(DomainError::UnknownProduct("T-ETH-C".to_string()))
        );
    }

    #[test]
    fn test_registry_dispatch() {
        let registry = PayoffRegistry::default();
        assert_eq!(
            registry.get(ProductId::UsdcEarn).unwrap().name(),
            "Symmetric Barrier"
        );
        assert_eq!(
            registry.get(ProductId::StEthEarn).unwrap().name(),
            "Participation Weighted"
        );

        let empty = PayoffRegistry::empty();
        assert!(empty.get(ProductId::UsdcEarn).is_err());
    }

    #[test]
    fn test_max_yield_from_participation() {
        let max = PayoffTerms::max_yield_from_participation(dec!(4), dec!(0.5), dec!(0), dec!(16));
        assert_eq!(max, dec!(12));
    }
}
