//! Per-column sample buffering
//!
//! Each column keeps a bounded `primary` window that curves are fitted
//! through, plus a `leftover` store for samples that were pulled ahead of the
//! current window. Both are bounded by the same capacity: `primary` by
//! construction, `leftover` through the synchronizer's backpressure rule.

use std::collections::VecDeque;

use gs_core::Sample;
use tracing::trace;

/// Samples required strictly after the pointer before a curve can bracket it
pub const TRAILING_KNOTS: usize = 2;

/// Largest accepted buffer capacity (exclusive)
pub const MAX_CAPACITY: usize = 1000;

/// Bounded primary window plus overflow store for one column
#[derive(Debug, Clone)]
pub struct ColumnBuffer {
    primary: VecDeque<Sample>,
    leftover: VecDeque<Sample>,
    capacity: usize,
    /// Time of the newest accepted sample
    newest: Option<i64>,
    /// Samples rejected because they were not newer than `newest`
    dropped: usize,
}

impl ColumnBuffer {
    /// Create an empty buffer holding at most `capacity` samples in each store
    pub fn new(capacity: usize) -> Self {
        Self {
            primary: VecDeque::with_capacity(capacity),
            leftover: VecDeque::with_capacity(capacity),
            capacity,
            newest: None,
            dropped: 0,
        }
    }
    
    /// Add a sample, to `primary` while it has room and to `leftover` otherwise.
    ///
    /// Samples that are not strictly newer than everything already buffered
    /// are dropped, so both stores stay strictly increasing in time.
    /// Returns whether the sample was accepted.
    pub fn push(&mut self, sample: Sample) -> bool {
        if self.newest.is_some_and(|newest| sample.time <= newest) {
            trace!("dropping out-of-order sample at {} (newest {:?})", sample.time, self.newest);
            self.dropped += 1;
            return false;
        }
        self.newest = Some(sample.time);
        
        if self.primary.len() < self.capacity {
            self.primary.push_back(sample);
        } else {
            self.leftover.push_back(sample);
        }
        true
    }
    
    /// Whether `primary` has reached capacity
    pub fn is_full(&self) -> bool {
        self.primary.len() >= self.capacity
    }
    
    /// Whether `leftover` has reached capacity
    pub fn is_leftover_full(&self) -> bool {
        self.leftover.len() >= self.capacity
    }
    
    /// Move leftover samples into the window until it can bracket `target`.
    ///
    /// Samples are taken from the front of `leftover` and appended to
    /// `primary`, evicting the oldest window sample when full, until either
    /// `leftover` is empty or `primary` holds enough samples after `target`.
    pub fn advance_window(&mut self, target: i64) {
        if self.capacity == 0 {
            return;
        }
        
        while self.samples_after(target) < self.trailing_required() {
            let Some(sample) = self.leftover.pop_front() else {
                break;
            };
            if self.primary.len() >= self.capacity {
                self.primary.pop_front();
            }
            self.primary.push_back(sample);
        }
    }
    
    /// Number of window samples strictly after `time`
    pub fn samples_after(&self, time: i64) -> usize {
        self.primary.len() - self.primary.partition_point(|s| s.time <= time)
    }
    
    /// Trailing samples the window needs after the pointer, bounded by what it can hold
    pub fn trailing_required(&self) -> usize {
        TRAILING_KNOTS.min(self.capacity)
    }
    
    /// The interpolation window, oldest first
    pub fn primary(&self) -> &VecDeque<Sample> {
        &self.primary
    }
    
    /// Samples pulled ahead of the window, oldest first
    pub fn leftover(&self) -> &VecDeque<Sample> {
        &self.leftover
    }
    
    /// All buffered samples in time order (window first, then leftover)
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.primary.iter().chain(self.leftover.iter())
    }
    
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    
    /// Number of samples dropped for arriving out of order
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
