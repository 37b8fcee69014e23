//! The shared output clock

mod aligner;

pub use aligner::{align_start, default_epoch_offset};

use tracing::info;

use crate::ConfigError;

/// The single time pointer driving output rows.
///
/// `current` starts at the aligned start time and only ever moves forward,
/// by exactly one interval per emitted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedClock {
    current: i64,
    interval: i64,
    epoch_offset: Option<i64>,
    end: i64,
    /// Set once advancing would overflow `i64`; the clock is then past its end
    exhausted: bool,
}

impl AlignedClock {
    /// Create a clock whose pointer is aligned from `start`
    pub fn new(start: i64, end: i64, interval: i64, epoch_offset: Option<i64>) -> Result<Self, ConfigError> {
        let current = align_start(start, interval, epoch_offset)?;
        info!(
            "offset={:?} start={} interval={} aligned start={} end={}",
            epoch_offset, start, interval, current, end
        );
        
        Ok(Self {
            current,
            interval,
            epoch_offset,
            end,
            exhausted: false,
        })
    }
    
    /// Current time pointer
    pub fn current(&self) -> i64 {
        self.current
    }
    
    pub fn interval(&self) -> i64 {
        self.interval
    }
    
    pub fn epoch_offset(&self) -> Option<i64> {
        self.epoch_offset
    }
    
    pub fn end(&self) -> i64 {
        self.end
    }
    
    /// Whether the pointer has moved beyond the configured end time
    pub fn is_past_end(&self) -> bool {
        self.exhausted || self.current > self.end
    }
    
    /// Move the pointer forward by one interval
    pub fn advance(&mut self) {
        match self.current.checked_add(self.interval) {
            Some(next) => self.current = next,
            None => self.exhausted = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_advance_moves_by_interval() {
        let mut clock = AlignedClock::new(5, 40, 10, Some(0)).unwrap();
        assert_eq!(clock.current(), 10);
        
        clock.advance();
        clock.advance();
        assert_eq!(clock.current(), 30);
        assert!(!clock.is_past_end());
        
        clock.advance();
        clock.advance();
        assert_eq!(clock.current(), 50);
        assert!(clock.is_past_end());
    }
    
    #[test]
    fn test_end_is_inclusive() {
        let mut clock = AlignedClock::new(0, 20, 10, Some(0)).unwrap();
        clock.advance();
        clock.advance();
        assert_eq!(clock.current(), 20);
        assert!(!clock.is_past_end());
    }
    
    #[test]
    fn test_overflow_marks_clock_exhausted() {
        let mut clock = AlignedClock::new(i64::MAX - 5, i64::MAX, 10, None).unwrap();
        assert!(!clock.is_past_end());
        clock.advance();
        assert!(clock.is_past_end());
    }
}
