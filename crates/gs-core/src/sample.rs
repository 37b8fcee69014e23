//! Raw observations

use rust_decimal::Decimal;

/// One raw `(time, value)` observation for a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sample {
    /// Timestamp in milliseconds
    pub time: i64,
    /// Observed value
    pub value: Decimal,
}

impl Sample {
    pub fn new(time: i64, value: Decimal) -> Self {
        Self { time, value }
    }
}

impl From<(i64, Decimal)> for Sample {
    fn from((time, value): (i64, Decimal)) -> Self {
        Self { time, value }
    }
}
