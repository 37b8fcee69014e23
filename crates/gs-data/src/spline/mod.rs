//! Curve fitting strategies
//!
//! Both strategies fit a piecewise cubic Hermite curve through a window of
//! samples and differ only in how the tangent at each interior knot is
//! chosen. Everything is computed in [`Decimal`] so a curve passes through
//! its knots exactly.

mod basic;
mod limit_derivative;

pub use basic::BasicSpline;
pub use limit_derivative::LimitDerivativeSpline;

use std::fmt;
use std::str::FromStr;

use gs_core::{ConfigError, Sample};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest window a curve can be fitted through
pub const MIN_WINDOW: usize = 4;

/// Errors raised while fitting or evaluating a curve
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplineError {
    #[error("insufficient data: at least {required} samples required, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    
    #[error("sample times must be strictly increasing (at {0})")]
    UnorderedKnots(i64),
    
    #[error("time {time} lies outside the fitted range [{from}, {to}]")]
    OutOfRange { time: i64, from: i64, to: i64 },
    
    #[error("decimal overflow while evaluating curve")]
    Overflow,
}

/// A curve fitted through a window of knots
#[derive(Debug, Clone, PartialEq)]
pub struct FittedCurve {
    knots: Vec<Sample>,
    /// Tangent (value per millisecond) at each knot; the first and last are unused
    tangents: Vec<Decimal>,
}

impl FittedCurve {
    /// The knots the curve passes through
    pub fn knots(&self) -> &[Sample] {
        &self.knots
    }
    
    /// Tangent at knot `index`
    pub fn tangent(&self, index: usize) -> Option<Decimal> {
        self.tangents.get(index).copied()
    }
    
    /// First time at which the curve may be evaluated (the 2nd knot)
    pub fn domain_start(&self) -> i64 {
        self.knots[1].time
    }
    
    /// Last time at which the curve may be evaluated (the (N-1)th knot)
    pub fn domain_end(&self) -> i64 {
        self.knots[self.knots.len() - 2].time
    }
    
    /// Evaluate the curve at `time`.
    ///
    /// Only the span between the 2nd and (N-1)th knot is covered: the outer
    /// knots exist to shape the tangents of their neighbours.
    pub fn evaluate(&self, time: i64) -> Result<Decimal, SplineError> {
        let (from, to) = (self.domain_start(), self.domain_end());
        if time < from || time > to {
            return Err(SplineError::OutOfRange { time, from, to });
        }
        
        // Segment k spans knots[k]..=knots[k + 1], with 1 <= k <= N - 3
        let last_segment = self.knots.len() - 3;
        let k = self
            .knots
            .partition_point(|s| s.time <= time)
            .saturating_sub(1)
            .clamp(1, last_segment);
        let (left, right) = (self.knots[k], self.knots[k + 1]);
        
        let h = Decimal::from(time_span(left.time, right.time)?);
        let s = checked(Decimal::from(time_span(left.time, time)?).checked_div(h))?;
        let s2 = checked(s.checked_mul(s))?;
        let s3 = checked(s2.checked_mul(s))?;
        let two = Decimal::TWO;
        let three = Decimal::from(3);
        
        // Cubic Hermite basis
        let h00 = two * s3 - three * s2 + Decimal::ONE;
        let h10 = s3 - two * s2 + s;
        let h01 = three * s2 - two * s3;
        let h11 = s3 - s2;
        
        let m_left = checked(h.checked_mul(self.tangents[k]))?;
        let m_right = checked(h.checked_mul(self.tangents[k + 1]))?;
        
        let terms = [
            h00.checked_mul(left.value),
            h10.checked_mul(m_left),
            h01.checked_mul(right.value),
            h11.checked_mul(m_right),
        ];
        terms
            .into_iter()
            .try_fold(Decimal::ZERO, |acc, term| acc.checked_add(checked(term)?).ok_or(SplineError::Overflow))
    }
}

/// A curve-fitting strategy selected at setup time
pub trait SplineStrategy: fmt::Debug + Send {
    /// Short identifier used in configuration and logs
    fn name(&self) -> &'static str;
    
    /// Tangent at an interior knot given the secants on either side
    fn interior_tangent(&self, left_secant: Decimal, right_secant: Decimal) -> Result<Decimal, SplineError>;
    
    /// Fit a curve through `window` (at least [`MIN_WINDOW`] samples, strictly increasing in time)
    fn fit(&self, window: &[Sample]) -> Result<FittedCurve, SplineError> {
        if window.len() < MIN_WINDOW {
            return Err(SplineError::InsufficientData {
                required: MIN_WINDOW,
                actual: window.len(),
            });
        }
        
        let secants = window
            .windows(2)
            .map(|pair| secant(pair[0], pair[1]))
            .collect::<Result<Vec<_>, _>>()?;
        
        let mut tangents = Vec::with_capacity(window.len());
        tangents.push(secants[0]);
        for pair in secants.windows(2) {
            tangents.push(self.interior_tangent(pair[0], pair[1])?);
        }
        tangents.push(secants[secants.len() - 1]);
        
        Ok(FittedCurve {
            knots: window.to_vec(),
            tangents,
        })
    }
    
    /// Evaluate a curve previously produced by [`SplineStrategy::fit`]
    fn evaluate(&self, curve: &FittedCurve, time: i64) -> Result<Decimal, SplineError> {
        curve.evaluate(time)
    }
}

/// Spline variant named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplineType {
    #[default]
    Basic,
    LimitDerivative,
}

impl SplineType {
    /// Configuration name of the variant
    pub fn as_str(&self) -> &'static str {
        match self {
            SplineType::Basic => "basic",
            SplineType::LimitDerivative => "limitderivative",
        }
    }
    
    /// Build a fresh strategy instance for one column
    pub fn build(&self) -> Box<dyn SplineStrategy> {
        match self {
            SplineType::Basic => Box::new(BasicSpline),
            SplineType::LimitDerivative => Box::new(LimitDerivativeSpline),
        }
    }
}

impl FromStr for SplineType {
    type Err = ConfigError;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(SplineType::Basic),
            "limitderivative" => Ok(SplineType::LimitDerivative),
            other => Err(ConfigError::new(format!(
                "splineType '{}' is unknown; must be basic or limitderivative",
                other
            ))),
        }
    }
}

impl fmt::Display for SplineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slope of the chord between two consecutive knots
fn secant(left: Sample, right: Sample) -> Result<Decimal, SplineError> {
    if right.time <= left.time {
        return Err(SplineError::UnorderedKnots(right.time));
    }
    let dt = Decimal::from(time_span(left.time, right.time)?);
    let dy = checked(right.value.checked_sub(left.value))?;
    checked(dy.checked_div(dt))
}

/// `to - from`, or `Overflow` when the distance does not fit in an `i64`
fn time_span(from: i64, to: i64) -> Result<i64, SplineError> {
    to.checked_sub(from).ok_or(SplineError::Overflow)
}

fn checked(value: Option<Decimal>) -> Result<Decimal, SplineError> {
    value.ok_or(SplineError::Overflow)
}
