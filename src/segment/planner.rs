//! Segment boundary planning.
//!
//! Cuts a stream into ranges whose estimated size, at a constant bit rate,
//! stays at or under a byte ceiling.

use super::TimeRange;
use crate::error::{RelayError, Result};

/// Upper bound on the number of ranges a single plan may contain.
pub const MAX_SEGMENTS: usize = 10_000;

/// Plans time ranges for a stream of `duration_seconds` at `bit_rate_bps`
/// so that each range is estimated to fit in `size_ceiling_bytes`.
///
/// The estimate assumes a constant bit rate; callers must still measure the
/// files they produce.
pub fn plan(
    duration_seconds: f64,
    bit_rate_bps: f64,
    size_ceiling_bytes: f64,
) -> Result<Vec<TimeRange>> {
    require_positive("duration", duration_seconds)?;
    require_positive("bit rate", bit_rate_bps)?;
    require_positive("size ceiling", size_ceiling_bytes)?;

    let max_duration = size_ceiling_bytes / (bit_rate_bps / 8.0);
    if !max_duration.is_finite() || max_duration <= 0.0 {
        return Err(RelayError::InvalidInput(format!(
            "Segment length for {} bytes at {} bit/s is not representable",
            size_ceiling_bytes, bit_rate_bps
        )));
    }

    if max_duration >= duration_seconds {
        return Ok(vec![TimeRange::new(0.0, duration_seconds)]);
    }

    let count = (duration_seconds / max_duration).ceil();
    if !count.is_finite() || count > MAX_SEGMENTS as f64 {
        return Err(RelayError::InvalidInput(format!(
            "Splitting {:.1}s into {:.1}s segments exceeds {} parts",
            duration_seconds, max_duration, MAX_SEGMENTS
        )));
    }

    let mut ranges = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        // Offsets come from the index, not a running sum, so float drift
        // cannot leave a zero-length tail.
        let start = i as f64 * max_duration;
        if start >= duration_seconds {
            break;
        }
        let length = max_duration.min(duration_seconds - start);
        ranges.push(TimeRange::new(start, length));
    }

    Ok(ranges)
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RelayError::InvalidInput(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}
