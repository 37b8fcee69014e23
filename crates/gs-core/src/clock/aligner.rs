//! Grid alignment of the output time axis

use tracing::debug;

use crate::ConfigError;

/// Align `start` onto the grid defined by `interval` and `epoch_offset`.
///
/// Returns the smallest `v >= start` with `(v - epoch_offset) mod interval == 0`.
/// With no offset configured the start time is returned unchanged and the
/// clock is not grid-aligned. All arithmetic is exact integer arithmetic and
/// correct for negative timestamps and offsets.
pub fn align_start(start: i64, interval: i64, epoch_offset: Option<i64>) -> Result<i64, ConfigError> {
    if interval <= 0 {
        return Err(ConfigError::new(format!("interval must be > 0 (got {})", interval)));
    }
    
    let Some(offset) = epoch_offset else {
        return Ok(start);
    };
    
    // i128 keeps `start - offset` from overflowing for extreme inputs
    let behind = (i128::from(start) - i128::from(offset)).rem_euclid(i128::from(interval));
    let shift = if behind == 0 { 0 } else { i128::from(interval) - behind };
    let aligned = i64::try_from(i128::from(start) + shift).map_err(|_| {
        ConfigError::new(format!(
            "start {} cannot be aligned to interval {} with offset {} without overflow",
            start, interval, offset
        ))
    })?;
    
    debug!(
        "aligned start: offset={} start={} interval={} shift={} result={}",
        offset, start, interval, shift, aligned
    );
    Ok(aligned)
}

/// Offset used when none is supplied: the requested start is itself a grid point.
pub fn default_epoch_offset(start: i64, interval: i64) -> Result<i64, ConfigError> {
    if interval <= 0 {
        return Err(ConfigError::new(format!("interval must be > 0 (got {})", interval)));
    }
    Ok(start.rem_euclid(interval))
}
