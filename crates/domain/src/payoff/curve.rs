use super::{PayoffProfile, PayoffTerms};
use crate::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffCurvePoint {
    pub performance_percent: Decimal,
    pub yield_percent: Decimal,
}

/// Largest accepted [`CurveResolution::points_per_segment`].
pub const MAX_POINTS_PER_SEGMENT: usize = 100_000;

/// Sampling density of a generated curve.
///
/// The curve has three segments: a flat segment of width `padding` left of
/// the lower barrier, the barrier range itself, and a flat segment of width
/// `padding` right of the upper barrier. Each segment gets
/// `points_per_segment` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveResolution {
    pub points_per_segment: usize,
    pub padding: Decimal,
}

impl Default for CurveResolution {
    fn default() -> Self {
        Self {
            points_per_segment: 100,
            padding: Decimal::TEN,
        }
    }
}

/// Samples `profile` under `terms`, ordered by increasing performance.
///
/// Both barriers are sampled exactly. Segments get at least two points.
///
/// # Errors
/// Returns [`DomainError::InvalidPayoffTerms`] if the terms do not validate,
/// `padding` is negative, or `points_per_segment` exceeds
/// [`MAX_POINTS_PER_SEGMENT`].
pub fn compute_yield_curve(
    terms: &PayoffTerms,
    profile: &dyn PayoffProfile,
    resolution: &CurveResolution,
) -> Result<Vec<PayoffCurvePoint>, DomainError> {
    terms.validate()?;
    if resolution.padding.is_sign_negative() {
        return Err(DomainError::InvalidPayoffTerms(format!(
            "curve padding {} is negative",
            resolution.padding
        )));
    }
    if resolution.points_per_segment > MAX_POINTS_PER_SEGMENT {
        return Err(DomainError::InvalidPayoffTerms(format!(
            "{} points per segment exceeds the maximum of {MAX_POINTS_PER_SEGMENT}",
            resolution.points_per_segment
        )));
    }

    let n = resolution.points_per_segment.max(2);
    let steps = Decimal::from(n);
    let width = terms.upper_barrier - terms.lower_barrier;
    let pad_step = resolution.padding / steps;
    let inner_step = width / Decimal::from(n - 1);

    let mut points = Vec::with_capacity(3 * n);
    let mut push = |performance: Decimal| {
        points.push(PayoffCurvePoint {
            performance_percent: performance,
            yield_percent: profile.yield_at(terms, performance),
        });
    };

    if !resolution.padding.is_zero() {
        let start = terms.lower_barrier - resolution.padding;
        for i in 0..n {
            push(start + pad_step * Decimal::from(i));
        }
    }

    for i in 0..n - 1 {
        push(terms.lower_barrier + inner_step * Decimal::from(i));
    }
    push(terms.upper_barrier);

    if !resolution.padding.is_zero() {
        for i in 1..=n {
            push(terms.upper_barrier + pad_step * Decimal::from(i));
        }
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payoff::{ParticipationWeighted, SymmetricBarrier};
    use rust_decimal_macros::dec;

    fn terms() -> PayoffTerms {
        PayoffTerms {
            base_yield: dec!(4),
            max_yield: dec!(12),
            lower_barrier: dec!(-10),
            upper_barrier: dec!(10),
            participation_rate: dec!(0.4),
        }
    }

    #[test]
    fn test_curve_shape_and_size() {
        let resolution = CurveResolution {
            points_per_segment: 5,
            padding: dec!(5),
        };
        let curve = compute_yield_curve(&terms(), &SymmetricBarrier, &resolution).unwrap();
        assert_eq!(curve.len(), 15);
        assert_eq!(curve[0].performance_percent, dec!(-15));
        assert_eq!(curve[14].performance_percent, dec!(15));

        let increasing = curve
            .windows(2)
            .all(|w| w[0].performance_percent < w[1].performance_percent);
        assert!(increasing);
    }

    #[test]
    fn test_base_outside_and_max_at_barriers() {
        let t = terms();
        let curve =
            compute_yield_curve(&t, &SymmetricBarrier, &CurveResolution::default()).unwrap();

        for p in &curve {
            if !t.contains(p.performance_percent) {
                assert_eq!(p.yield_percent, t.base_yield);
            }
        }
        let at = |x: Decimal| {
            curve
                .iter()
                .find(|p| p.performance_percent == x)
                .map(|p| p.yield_percent)
        };
        assert_eq!(at(dec!(-10)), Some(dec!(12)));
        assert_eq!(at(dec!(10)), Some(dec!(12)));
    }

    #[test]
    fn test_deterministic() {
        let r = CurveResolution::default();
        let a = compute_yield_curve(&terms(), &ParticipationWeighted, &r).unwrap();
        let b = compute_yield_curve(&terms(), &ParticipationWeighted, &r).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_padding_covers_only_barrier_range() {
        let r = CurveResolution {
            points_per_segment: 3,
            padding: Decimal::ZERO,
        };
        let curve = compute_yield_curve(&terms(), &SymmetricBarrier, &r).unwrap();
        let xs: Vec<_> = curve.iter().map(|p| p.performance_percent).collect();
        assert_eq!(xs, vec![dec!(-10), dec!(0), dec!(10)]);
    }

    #[test]
    fn test_rejects_invalid_input() {
        let bad = PayoffTerms {
            upper_barrier: dec!(-20),
            ..terms()
        };
        assert!(compute_yield_curve(&bad, &SymmetricBarrier, &CurveResolution::default()).is_err());

        let r = CurveResolution {
            points_per_segment: 10,
            padding: dec!(-1),
        };
        assert!(compute_yield_curve(&terms(), &SymmetricBarrier, &r).is_err());
    }

    #[test]
    fn test_rejects_oversized_resolution() {
        for points in [MAX_POINTS_PER_SEGMENT + 1, usize::MAX / 2, usize::MAX] {
            let r = CurveResolution {
                points_per_segment: points,
                padding: dec!(5),
            };
            assert!(matches!(
                compute_yield_curve(&terms(), &SymmetricBarrier, &r),
                Err(DomainError::InvalidPayoffTerms(_))
            ));
        }

        let r = CurveResolution {
            points_per_segment: MAX_POINTS_PER_SEGMENT,
            padding: Decimal::ZERO,
        };
        let curve = compute_yield_curve(&terms(), &SymmetricBarrier, &r).unwrap();
        assert_eq!(curve.len(), MAX_POINTS_PER_SEGMENT);
    }
}
