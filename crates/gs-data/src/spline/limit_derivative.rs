//! Cubic Hermite spline with limited derivatives

use rust_decimal::Decimal;

use super::{SplineError, SplineStrategy};

/// Upper bound on a tangent, as a multiple of the smaller neighbouring secant
const SECANT_BOUND_FACTOR: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

/// Like [`super::BasicSpline`], but each interior tangent is limited by the
/// neighbouring secants: it is flat at local extrema and plateaus, and its
/// magnitude never exceeds three times the smaller secant. The curve
/// therefore cannot overshoot the data between knots.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitDerivativeSpline;

impl SplineStrategy for LimitDerivativeSpline {
    fn name(&self) -> &'static str {
        "limitderivative"
    }
    
    fn interior_tangent(&self, left_secant: Decimal, right_secant: Decimal) -> Result<Decimal, SplineError> {
        if left_secant.is_zero()
            || right_secant.is_zero()
            || left_secant.is_sign_negative() != right_secant.is_sign_negative()
        {
            return Ok(Decimal::ZERO);
        }
        
        let mean = left_secant.checked_add(right_secant).ok_or(SplineError::Overflow)? / Decimal::TWO;
        let bound = SECANT_BOUND_FACTOR
            .checked_mul(left_secant.abs().min(right_secant.abs()))
            .ok_or(SplineError::Overflow)?;
        
        if mean.abs() > bound {
            Ok(if mean.is_sign_negative() { -bound } else { bound })
        } else {
            Ok(mean)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_core::Sample;
    use rust_decimal_macros::dec;
    
    #[test]
    fn test_extremum_has_flat_tangent() {
        let strategy = LimitDerivativeSpline;
        assert_eq!(strategy.interior_tangent(dec!(1), dec!(-1)).unwrap(), dec!(0));
        assert_eq!(strategy.interior_tangent(dec!(0), dec!(2)).unwrap(), dec!(0));
    }
    
    #[test]
    fn test_tangent_is_clamped_by_smaller_secant() {
        let strategy = LimitDerivativeSpline;
        assert_eq!(strategy.interior_tangent(dec!(0.1), dec!(0.9)).unwrap(), dec!(0.3));
        assert_eq!(strategy.interior_tangent(dec!(-0.1), dec!(-0.9)).unwrap(), dec!(-0.3));
        assert_eq!(strategy.interior_tangent(dec!(0.4), dec!(0.6)).unwrap(), dec!(0.5));
    }
    
    #[test]
    fn test_fitted_tangents() {
        let window = [
            Sample::new(0, dec!(0)),
            Sample::new(10, dec!(1)),
            Sample::new(20, dec!(10)),
            Sample::new(30, dec!(12)),
        ];
        let curve = LimitDerivativeSpline.fit(&window).unwrap();
        assert_eq!(curve.tangent(1), Some(dec!(0.3)));
        assert_eq!(curve.tangent(2), Some(dec!(0.55)));
    }
    
    #[test]
    fn test_plateau_does_not_overshoot() {
        let window = [
            Sample::new(0, dec!(0)),
            Sample::new(10, dec!(10)),
            Sample::new(20, dec!(10)),
            Sample::new(30, dec!(0)),
        ];
        let curve = LimitDerivativeSpline.fit(&window).unwrap();
        for t in 10..=20 {
            assert_eq!(curve.evaluate(t).unwrap(), dec!(10));
        }
    }
    
    #[test]
    fn test_monotone_data_stays_in_range() {
        let window = [
            Sample::new(0, dec!(0)),
            Sample::new(10, dec!(0.5)),
            Sample::new(20, dec!(9.5)),
            Sample::new(30, dec!(10)),
        ];
        let curve = LimitDerivativeSpline.fit(&window).unwrap();
        let mut previous = dec!(0.5);
        for t in 10..=20 {
            let value = curve.evaluate(t).unwrap();
            assert!(value >= previous);
            assert!(value <= dec!(9.5));
            previous = value;
        }
    }
}
