//! The synchronizer: pulls raw rows, routes them to columns and emits one
//! aligned row per grid tick.
//!
//! `read()` runs a small state machine:
//!
//! - `Filling`: no column window is full yet, keep pulling.
//! - `Gathering`: pull only while the cross-column policy asks for more data,
//!   then compute the row at the current pointer.
//! - `Draining`: upstream has ended; rows up to the end time are computed
//!   from whatever is already buffered.
//! - `Done`: every further read reports end of stream.
//!
//! `Pending` and `MissingData` from upstream are handed straight back to the
//! caller with the internal state untouched, so the next `read()` resumes
//! exactly where this one stopped.

use gs_core::{AlignedClock, ConfigError, PullProcessor, ReadResult, Row};
use tracing::{debug, info, trace};

use crate::column::ColumnState;
use crate::config::SplinesConfig;

/// Where the synchronizer is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No column window is full yet
    Filling,
    /// Pulling until the cross-column policy says a row can be computed
    Gathering,
    /// Upstream ended; emitting the remaining rows from buffered data
    Draining,
    /// Past the end time
    Done,
}

/// Outcome of the cross-column need-more-data policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatherDecision {
    /// Every column can bracket the pointer
    Compute,
    /// Pull another row
    Pull,
    /// Some columns are behind, but pulling would overflow this column's leftover store
    Backpressure { column: String },
}

/// Counters describing a synchronizer run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Results pulled from upstream, of any kind
    pub pulls: u64,
    /// Upstream rows routed to the columns
    pub rows_in: u64,
    /// Aligned rows emitted
    pub rows_out: u64,
}

/// Why [`Synchronizer::collect_rows`] stopped
#[derive(Debug, Clone, PartialEq)]
pub enum DrainOutcome {
    /// The synchronizer reached end of stream
    Finished,
    /// Upstream had no data available; call again later
    Pending,
    /// Upstream reported missing data
    MissingData(String),
}

/// Resamples the configured columns of an upstream onto a fixed grid
pub struct Synchronizer {
    upstream: Box<dyn PullProcessor>,
    columns: Vec<ColumnState>,
    clock: AlignedClock,
    time_column: String,
    state: SyncState,
    stats: SyncStats,
    source_name: String,
}

impl Synchronizer {
    /// Build a synchronizer over `upstream`, validating `config` first
    pub fn new(config: &SplinesConfig, upstream: Box<dyn PullProcessor>) -> Result<Self, ConfigError> {
        config.validate()?;
        let max_gap = config.max_gap()?;
        let clock = AlignedClock::new(config.start_time, config.end_time, config.interval, config.epoch_offset)?;
        
        let columns = config
            .columns_to_interpolate
            .iter()
            .map(|name| {
                ColumnState::new(
                    name.clone(),
                    config.time_column.clone(),
                    config.spline_type.build(),
                    config.uninterpolated_value_method,
                    config.buffer_size,
                    max_gap,
                )
            })
            .collect::<Vec<_>>();
        
        info!(
            "synchronizing {} column(s) from '{}': spline={} fallback={} bufferSize={} maxGap={}",
            columns.len(),
            upstream.source_name(),
            config.spline_type,
            config.uninterpolated_value_method,
            config.buffer_size,
            max_gap
        );
        
        let source_name = format!("splines({})", upstream.source_name());
        Ok(Self {
            upstream,
            columns,
            clock,
            time_column: config.time_column.clone(),
            state: SyncState::Filling,
            stats: SyncStats::default(),
            source_name,
        })
    }
    
    pub fn state(&self) -> SyncState {
        self.state
    }
    
    pub fn stats(&self) -> SyncStats {
        self.stats
    }
    
    /// The shared output clock
    pub fn clock(&self) -> &AlignedClock {
        &self.clock
    }
    
    pub fn columns(&self) -> &[ColumnState] {
        &self.columns
    }
    
    /// Read until end of stream, returning every emitted row.
    ///
    /// Stops early when upstream reports `Pending` or `MissingData`; the rows
    /// gathered so far are returned alongside the reason and a later call
    /// resumes where this one stopped.
    pub fn collect_rows(&mut self) -> (Vec<Row>, DrainOutcome) {
        let mut rows = Vec::new();
        loop {
            match self.read() {
                ReadResult::Row(row) => rows.push(row),
                ReadResult::EndOfStream => return (rows, DrainOutcome::Finished),
                ReadResult::Pending => return (rows, DrainOutcome::Pending),
                ReadResult::MissingData(reason) => return (rows, DrainOutcome::MissingData(reason)),
            }
        }
    }
    
    /// Apply the cross-column policy at the current pointer
    pub fn gather_decision(&self) -> GatherDecision {
        let current = self.clock.current();
        let (behind, ready): (Vec<&ColumnState>, Vec<&ColumnState>) =
            self.columns.iter().partition(|c| c.need_more_data(current));
        
        if behind.is_empty() {
            return GatherDecision::Compute;
        }
        if ready.is_empty() {
            return GatherDecision::Pull;
        }
        
        // Pulling more only grows the ready columns' leftover stores; once one
        // is full the columns that are behind have to fall back instead.
        match ready.iter().find(|c| c.is_leftover_full()) {
            Some(column) => GatherDecision::Backpressure {
                column: column.name().to_string(),
            },
            None => GatherDecision::Pull,
        }
    }
    
    /// Pull one result from upstream.
    ///
    /// Returns `Some` when the result must be handed back to the caller.
    fn pull(&mut self) -> Option<ReadResult> {
        self.stats.pulls += 1;
        match self.upstream.read() {
            ReadResult::Row(row) => {
                self.transfer_row(&row);
                None
            }
            ReadResult::Pending => {
                trace!("upstream '{}' pending", self.upstream.source_name());
                Some(ReadResult::Pending)
            }
            ReadResult::MissingData(reason) => {
                debug!("upstream '{}' reported missing data: {}", self.upstream.source_name(), reason);
                Some(ReadResult::MissingData(reason))
            }
            ReadResult::EndOfStream => {
                info!(
                    "upstream '{}' ended after {} rows; draining from {}",
                    self.upstream.source_name(),
                    self.stats.rows_in,
                    self.clock.current()
                );
                self.state = SyncState::Draining;
                Some(self.drain())
            }
        }
    }
    
    fn transfer_row(&mut self, row: &Row) {
        self.stats.rows_in += 1;
        let current = self.clock.current();
        for column in &mut self.columns {
            column.transfer_row(row);
            column.prepare_buffer(current);
        }
    }
    
    fn any_window_full(&self) -> bool {
        self.columns.iter().any(ColumnState::is_full)
    }
    
    /// One row from already-buffered data, or the end marker
    fn drain(&mut self) -> ReadResult {
        if self.clock.is_past_end() {
            return self.finish();
        }
        let current = self.clock.current();
        for column in &mut self.columns {
            column.prepare_buffer(current);
        }
        self.compute()
    }
    
    /// Emit the row at the current pointer and advance the clock
    fn compute(&mut self) -> ReadResult {
        if self.clock.is_past_end() {
            return self.finish();
        }
        
        let current = self.clock.current();
        let mut row = Row::with_time(&self.time_column, current);
        for column in &self.columns {
            row.insert(column.name(), column.calculate(current));
        }
        
        self.clock.advance();
        self.stats.rows_out += 1;
        
        let next = self.clock.current();
        for column in &mut self.columns {
            column.prepare_buffer(next);
        }
        
        trace!("emitted row at {}", current);
        ReadResult::Row(row)
    }
    
    fn finish(&mut self) -> ReadResult {
        if self.state != SyncState::Done {
            info!(
                "synchronizer finished: {} rows emitted from {} upstream rows",
                self.stats.rows_out, self.stats.rows_in
            );
            self.state = SyncState::Done;
        }
        ReadResult::EndOfStream
    }
}

impl PullProcessor for Synchronizer {
    fn read(&mut self) -> ReadResult {
        loop {
            match self.state {
                SyncState::Done => return ReadResult::EndOfStream,
                SyncState::Draining => return self.drain(),
                SyncState::Filling => {
                    if self.any_window_full() {
                        debug!("a column window is full; gathering at {}", self.clock.current());
                        self.state = SyncState::Gathering;
                        continue;
                    }
                    if let Some(result) = self.pull() {
                        return result;
                    }
                }
                SyncState::Gathering => {
                    if self.clock.is_past_end() {
                        return self.finish();
                    }
                    match self.gather_decision() {
                        GatherDecision::Pull => {
                            if let Some(result) = self.pull() {
                                return result;
                            }
                        }
                        GatherDecision::Compute => return self.compute(),
                        GatherDecision::Backpressure { column } => {
                            debug!(
                                "leftover of '{}' is full; computing {} with lagging columns falling back",
                                column,
                                self.clock.current()
                            );
                            return self.compute();
                        }
                    }
                }
            }
        }
    }
    
    fn source_name(&self) -> &str {
        &self.source_name
    }
}
