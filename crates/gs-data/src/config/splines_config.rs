//! Resampling configuration

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ahash::AHashSet;
use gs_core::{default_epoch_offset, ConfigError};
use serde::{Deserialize, Serialize};

use crate::buffer::MAX_CAPACITY;
use crate::spline::SplineType;

/// Default grid interval (one minute)
pub const DEFAULT_INTERVAL: i64 = 60_000;
/// Default per-column buffer capacity
pub const DEFAULT_BUFFER_SIZE: usize = 20;
/// Default number of intervals a gap may span before splining gives up
pub const DEFAULT_MAX_INTERVALS: i64 = 5;
/// Default name of the shared time column
pub const DEFAULT_TIME_COLUMN: &str = "time";
/// Column interpolated when none are listed
pub const DEFAULT_VALUE_COLUMN: &str = "value";

/// How a column is filled when it cannot be splined at a grid point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UninterpolatedValueMethod {
    /// Latest sample at or before the grid point
    PreviousRow,
    /// Closest sample on either side; ties go to the earlier one
    #[default]
    NearestRow,
}

impl FromStr for UninterpolatedValueMethod {
    type Err = ConfigError;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "previous" | "previous_row" => Ok(UninterpolatedValueMethod::PreviousRow),
            "nearest" | "nearest_row" => Ok(UninterpolatedValueMethod::NearestRow),
            _ => Err(ConfigError::new(format!(
                "uninterpolatedValueMethod '{}' is unknown; must be previous or nearest",
                s
            ))),
        }
    }
}

impl fmt::Display for UninterpolatedValueMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UninterpolatedValueMethod::PreviousRow => f.write_str("PREVIOUS_ROW"),
            UninterpolatedValueMethod::NearestRow => f.write_str("NEAREST_ROW"),
        }
    }
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_max_intervals() -> i64 {
    DEFAULT_MAX_INTERVALS
}

fn default_time_column() -> String {
    DEFAULT_TIME_COLUMN.to_string()
}

/// Fully resolved settings for one synchronizer run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplinesConfig {
    /// Grid spacing in milliseconds
    pub interval: i64,
    
    /// Grid anchor; `None` leaves the start time unaligned
    #[serde(default)]
    pub epoch_offset: Option<i64>,
    
    /// Requested first output time
    pub start_time: i64,
    
    /// Last output time (inclusive)
    pub end_time: i64,
    
    /// Columns resampled onto the grid
    pub columns_to_interpolate: Vec<String>,
    
    /// Fallback when a column cannot be splined
    #[serde(default)]
    pub uninterpolated_value_method: UninterpolatedValueMethod,
    
    /// Curve family used for every column
    #[serde(default)]
    pub spline_type: SplineType,
    
    /// Capacity of each column's window and leftover store
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    
    /// Widest gap, in intervals, that is still splined across
    #[serde(default = "default_max_intervals")]
    pub max_intervals_before_give_up: i64,
    
    /// Name of the shared time field in input and output rows
    #[serde(default = "default_time_column")]
    pub time_column: String,
}

impl SplinesConfig {
    /// Create a configuration with defaults for everything but the bounds and columns
    pub fn new(start_time: i64, end_time: i64, columns: Vec<String>) -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            epoch_offset: None,
            start_time,
            end_time,
            columns_to_interpolate: columns,
            uninterpolated_value_method: UninterpolatedValueMethod::default(),
            spline_type: SplineType::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_intervals_before_give_up: DEFAULT_MAX_INTERVALS,
            time_column: DEFAULT_TIME_COLUMN.to_string(),
        }
    }
    
    /// Resolve a configuration from a string option map.
    ///
    /// Recognised keys: `interval`, `epochOffset`, `columnsToInterpolate`
    /// (`;`-separated), `uninterpolatedValueMethod`, `splineType`,
    /// `bufferSize`, `maxIntervalsBeforeGiveUp` (or `maxToStopSplining`) and
    /// `timeColumn`. A missing `epochOffset` defaults to `start mod interval`.
    pub fn from_options(
        options: &HashMap<String, String>,
        start_time: Option<i64>,
        end_time: Option<i64>,
    ) -> Result<Self, ConfigError> {
        let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
            return Err(ConfigError::new("a start and an end time are both required"));
        };
        
        let interval = match options.get("interval") {
            Some(raw) => parse_integer::<i64>("interval", raw)?,
            None => DEFAULT_INTERVAL,
        };
        if interval < 1 {
            return Err(ConfigError::new(format!("interval must be > 0 (got {})", interval)));
        }
        
        let epoch_offset = match options.get("epochOffset") {
            Some(raw) => parse_integer::<i64>("epochOffset", raw)?,
            None => default_epoch_offset(start_time, interval)?,
        };
        
        let columns_to_interpolate = match options.get("columnsToInterpolate") {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(';')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            _ => vec![DEFAULT_VALUE_COLUMN.to_string()],
        };
        
        let uninterpolated_value_method = match options.get("uninterpolatedValueMethod") {
            Some(raw) => raw.parse()?,
            None => UninterpolatedValueMethod::default(),
        };
        
        let spline_type = match options.get("splineType") {
            Some(raw) => raw.parse()?,
            None => SplineType::default(),
        };
        
        let buffer_size = match options.get("bufferSize") {
            Some(raw) => {
                let size = parse_integer::<i64>("bufferSize", raw)?;
                usize::try_from(size)
                    .map_err(|_| ConfigError::new(format!("bufferSize is too small; must be 0 or greater (got {})", size)))?
            }
            None => DEFAULT_BUFFER_SIZE,
        };
        
        let max_intervals_before_give_up = match options
            .get("maxIntervalsBeforeGiveUp")
            .or_else(|| options.get("maxToStopSplining"))
        {
            Some(raw) => parse_integer::<i64>("maxIntervalsBeforeGiveUp", raw)?,
            None => DEFAULT_MAX_INTERVALS,
        };
        
        let time_column = options
            .get("timeColumn")
            .cloned()
            .unwrap_or_else(default_time_column);
        
        let config = Self {
            interval,
            epoch_offset: Some(epoch_offset),
            start_time,
            end_time,
            columns_to_interpolate,
            uninterpolated_value_method,
            spline_type,
            buffer_size,
            max_intervals_before_give_up,
            time_column,
        };
        config.validate()?;
        Ok(config)
    }
    
    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::new(format!("malformed configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
    
    /// Check every constraint on the resolved values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval < 1 {
            return Err(ConfigError::new(format!("interval must be > 0 (got {})", self.interval)));
        }
        if self.buffer_size >= MAX_CAPACITY {
            return Err(ConfigError::new(format!(
                "bufferSize is too large; must be less than {} (got {})",
                MAX_CAPACITY, self.buffer_size
            )));
        }
        if self.max_intervals_before_give_up < 1 {
            return Err(ConfigError::new(format!(
                "maxIntervalsBeforeGiveUp must be at least 1 (got {})",
                self.max_intervals_before_give_up
            )));
        }
        self.max_gap()?;
        
        if self.time_column.is_empty() {
            return Err(ConfigError::new("timeColumn must not be empty"));
        }
        if self.columns_to_interpolate.is_empty() {
            return Err(ConfigError::new("columnsToInterpolate must name at least one column"));
        }
        
        let mut seen = AHashSet::new();
        for column in &self.columns_to_interpolate {
            if column.is_empty() {
                return Err(ConfigError::new("column names must not be empty"));
            }
            if *column == self.time_column {
                return Err(ConfigError::new(format!("'{}' is the time column and cannot be interpolated", column)));
            }
            if !seen.insert(column.as_str()) {
                return Err(ConfigError::new(format!("column '{}' is listed more than once", column)));
            }
        }
        Ok(())
    }
    
    /// Widest gap between bracketing samples that is still splined across
    pub fn max_gap(&self) -> Result<i64, ConfigError> {
        self.interval
            .checked_mul(self.max_intervals_before_give_up)
            .ok_or_else(|| ConfigError::new("interval x maxIntervalsBeforeGiveUp overflows"))
    }
}

fn parse_integer<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::new(format!("{}={} is not an integer", key, raw)))
}
