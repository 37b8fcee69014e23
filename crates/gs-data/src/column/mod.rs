//! Per-column interpolation state

use gs_core::{Row, Sample};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::buffer::ColumnBuffer;
use crate::config::UninterpolatedValueMethod;
use crate::spline::{SplineStrategy, MIN_WINDOW};

/// One resampled column: its buffer, its curve strategy and its gap policy.
///
/// Owned exclusively by the synchronizer; never shared between columns.
#[derive(Debug)]
pub struct ColumnState {
    name: String,
    time_column: String,
    buffer: ColumnBuffer,
    strategy: Box<dyn SplineStrategy>,
    method: UninterpolatedValueMethod,
    /// Widest gap between bracketing samples that is still splined across
    max_gap: i64,
}

impl ColumnState {
    pub fn new(
        name: impl Into<String>,
        time_column: impl Into<String>,
        strategy: Box<dyn SplineStrategy>,
        method: UninterpolatedValueMethod,
        buffer_size: usize,
        max_gap: i64,
    ) -> Self {
        Self {
            name: name.into(),
            time_column: time_column.into(),
            buffer: ColumnBuffer::new(buffer_size),
            strategy,
            method,
            max_gap,
        }
    }
    
    pub fn name(&self) -> &str {
        &self.name
    }
    
    pub fn buffer(&self) -> &ColumnBuffer {
        &self.buffer
    }
    
    pub fn is_full(&self) -> bool {
        self.buffer.is_full()
    }
    
    pub fn is_leftover_full(&self) -> bool {
        self.buffer.is_leftover_full()
    }
    
    /// Whether the window still lacks the trailing knots needed to bracket `current`
    pub fn need_more_data(&self, current: i64) -> bool {
        self.buffer.samples_after(current) < self.buffer.trailing_required()
    }
    
    /// Route this column's value from an upstream row into the buffer.
    ///
    /// Rows without this column, with an absent value or without a usable
    /// time are ignored for this column.
    pub fn transfer_row(&mut self, row: &Row) {
        let Some(value) = row.get(&self.name) else {
            return;
        };
        let Some(time) = row.time(&self.time_column) else {
            trace!("column '{}': row has no usable '{}' field", self.name, self.time_column);
            return;
        };
        
        if self.buffer.push(Sample::new(time, value)) {
            trace!("column '{}': buffered sample at {}", self.name, time);
        }
    }
    
    /// Recenter the interpolation window on `current`
    pub fn prepare_buffer(&mut self, current: i64) {
        self.buffer.advance_window(current);
    }
    
    /// Value of this column at `current`: splined when possible, otherwise the fallback
    pub fn calculate(&self, current: i64) -> Option<Decimal> {
        self.interpolate(current).or_else(|| self.fallback(current))
    }
    
    /// Spline through the four knots around `current`, if they exist and the gap is small enough
    fn interpolate(&self, current: i64) -> Option<Decimal> {
        let window = self.buffer.primary();
        
        // `i` is the latest knot at or before `current`
        let i = window.partition_point(|s| s.time <= current).checked_sub(1)?;
        if i == 0 || i + 2 >= window.len() {
            trace!("column '{}': too few knots around {} to spline", self.name, current);
            return None;
        }
        
        // A gap too wide for an i64 certainly exceeds `max_gap`
        let gap = window[i + 1].time.checked_sub(window[i].time);
        if gap.map_or(true, |gap| gap > self.max_gap) {
            debug!(
                "column '{}': gap after {} at {} exceeds {}, using {}",
                self.name, window[i].time, current, self.max_gap, self.method
            );
            return None;
        }
        
        let knots: Vec<Sample> = window.range(i - 1..i - 1 + MIN_WINDOW).copied().collect();
        let result = self
            .strategy
            .fit(&knots)
            .and_then(|curve| self.strategy.evaluate(&curve, current));
        
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("column '{}': {} spline failed at {}: {}", self.name, self.strategy.name(), current, e);
                None
            }
        }
    }
    
    /// Value used when the column cannot be splined at `current`
    fn fallback(&self, current: i64) -> Option<Decimal> {
        let previous = self.buffer.iter().take_while(|s| s.time <= current).last();
        
        match self.method {
            UninterpolatedValueMethod::PreviousRow => previous.map(|s| s.value),
            UninterpolatedValueMethod::NearestRow => {
                let next = self.buffer.iter().find(|s| s.time > current);
                match (previous, next) {
                    (Some(p), Some(n)) if current.abs_diff(p.time) <= n.time.abs_diff(current) => Some(p.value),
                    (_, Some(n)) => Some(n.value),
                    (Some(p), None) => Some(p.value),
                    (None, None) => None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::SplineType;
    use rust_decimal_macros::dec;
    
    fn column(method: UninterpolatedValueMethod, buffer_size: usize, max_gap: i64) -> ColumnState {
        ColumnState::new("v", "time", SplineType::Basic.build(), method, buffer_size, max_gap)
    }
    
    fn feed(state: &mut ColumnState, samples: &[(i64, Decimal)], current: i64) {
        for &(time, value) in samples {
            let row = Row::with_time("time", time).with("v", Some(value));
            state.transfer_row(&row);
            state.prepare_buffer(current);
        }
    }
    
    #[test]
    fn test_transfer_row_ignores_other_columns_and_nulls() {
        let mut state = column(UninterpolatedValueMethod::NearestRow, 4, 100);
        state.transfer_row(&Row::with_time("time", 0).with("other", Some(dec!(1))));
        state.transfer_row(&Row::with_time("time", 10).with("v", None));
        state.transfer_row(&Row::new().with("v", Some(dec!(2))));
        assert!(state.buffer().primary().is_empty());
        
        state.transfer_row(&Row::with_time("time", 20).with("v", Some(dec!(3))));
        assert_eq!(state.buffer().primary().len(), 1);
    }
    
    #[test]
    fn test_need_more_data_until_two_trailing_knots() {
        let mut state = column(UninterpolatedValueMethod::NearestRow, 10, 100);
        feed(&mut state, &[(0, dec!(1)), (10, dec!(2))], 10);
        assert!(state.need_more_data(10));
        feed(&mut state, &[(20, dec!(3))], 10);
        assert!(state.need_more_data(10));
        feed(&mut state, &[(30, dec!(4))], 10);
        assert!(!state.need_more_data(10));
        assert!(state.need_more_data(20));
    }
    
    #[test]
    fn test_calculate_splines_between_knots() {
        let mut state = column(UninterpolatedValueMethod::NearestRow, 10, 100);
        feed(&mut state, &[(0, dec!(0)), (10, dec!(10)), (20, dec!(10)), (30, dec!(0))], 0);
        assert_eq!(state.calculate(15), Some(dec!(11.25)));
        assert_eq!(state.calculate(10), Some(dec!(10)));
    }
    
    #[test]
    fn test_knot_values_are_exact_everywhere() {
        let mut state = column(UninterpolatedValueMethod::NearestRow, 10, 100);
        let samples = [(0, dec!(1.5)), (10, dec!(2.25)), (20, dec!(-3)), (30, dec!(4.125))];
        feed(&mut state, &samples, 0);
        for (time, value) in samples {
            assert_eq!(state.calculate(time), Some(value));
        }
    }
    
    #[test]
    fn test_gap_falls_back_to_previous_row() {
        let mut state = column(UninterpolatedValueMethod::PreviousRow, 10, 20);
        feed(
            &mut state,
            &[(0, dec!(0)), (10, dec!(1)), (20, dec!(2)), (100, dec!(10)), (110, dec!(11)), (120, dec!(12))],
            0,
        );
        assert_eq!(state.calculate(50), Some(dec!(2)));
        assert_eq!(state.calculate(90), Some(dec!(2)));
        // Inside the dense stretch the spline is used
        assert_eq!(state.calculate(15), Some(dec!(1.5)));
    }
    
    #[test]
    fn test_gap_falls_back_to_nearest_row() {
        let mut state = column(UninterpolatedValueMethod::NearestRow, 10, 20);
        feed(
            &mut state,
            &[(0, dec!(0)), (10, dec!(1)), (20, dec!(2)), (100, dec!(10)), (110, dec!(11)), (120, dec!(12))],
            0,
        );
        assert_eq!(state.calculate(50), Some(dec!(2)));
        assert_eq!(state.calculate(70), Some(dec!(10)));
        // Equidistant: the earlier sample wins
        assert_eq!(state.calculate(60), Some(dec!(2)));
    }
    
    #[test]
    fn test_fallback_without_samples_on_required_side() {
        let mut previous = column(UninterpolatedValueMethod::PreviousRow, 10, 100);
        feed(&mut previous, &[(50, dec!(5))], 0);
        assert_eq!(previous.calculate(40), None);
        assert_eq!(previous.calculate(60), Some(dec!(5)));
        
        let mut nearest = column(UninterpolatedValueMethod::NearestRow, 10, 100);
        feed(&mut nearest, &[(50, dec!(5))], 0);
        assert_eq!(nearest.calculate(40), Some(dec!(5)));
        
        let empty = column(UninterpolatedValueMethod::NearestRow, 10, 100);
        assert_eq!(empty.calculate(0), None);
    }
    
    #[test]
    fn test_fallback_reaches_into_leftover() {
        let mut state = column(UninterpolatedValueMethod::NearestRow, 1, 100);
        // Capacity 1: the window can never hold four knots
        state.transfer_row(&Row::with_time("time", 0).with("v", Some(dec!(1))));
        state.transfer_row(&Row::with_time("time", 100).with("v", Some(dec!(2))));
        assert_eq!(state.buffer().leftover().len(), 1);
        assert_eq!(state.calculate(80), Some(dec!(2)));
    }
    
    #[test]
    fn test_far_apart_samples_do_not_overflow() {
        let mut nearest = column(UninterpolatedValueMethod::NearestRow, 10, 100);
        feed(
            &mut nearest,
            &[(-6_000_000_000_000_000_000, dec!(1)), (5_000_000_000_000_000_000, dec!(2))],
            0,
        );
        assert_eq!(nearest.calculate(4_000_000_000_000_000_000), Some(dec!(2)));
        assert_eq!(nearest.calculate(-5_000_000_000_000_000_000), Some(dec!(1)));
        
        // The bracketing gap is wider than an i64; the column falls back instead of splining
        let mut previous = column(UninterpolatedValueMethod::PreviousRow, 10, i64::MAX);
        feed(
            &mut previous,
            &[
                (-7_000_000_000_000_000_000, dec!(0)),
                (-6_000_000_000_000_000_000, dec!(1)),
                (5_000_000_000_000_000_000, dec!(2)),
                (6_000_000_000_000_000_000, dec!(3)),
            ],
            -6_000_000_000_000_000_000,
        );
        assert_eq!(previous.calculate(0), Some(dec!(1)));
    }
}
