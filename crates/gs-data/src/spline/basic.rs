//! Unconstrained cubic Hermite spline

use rust_decimal::Decimal;

use super::{SplineError, SplineStrategy};

/// Interior tangents are the mean of the neighbouring secants.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSpline;

impl SplineStrategy for BasicSpline {
    fn name(&self) -> &'static str {
        "basic"
    }
    
    fn interior_tangent(&self, left_secant: Decimal, right_secant: Decimal) -> Result<Decimal, SplineError> {
        let sum = left_secant.checked_add(right_secant).ok_or(SplineError::Overflow)?;
        Ok(sum / Decimal::TWO)
    }
}
