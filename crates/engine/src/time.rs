use std::time::Duration;

use crate::error::{EngineError, Result};

/// Milliseconds on the document timeline.
///
/// Signed so that wrap math over scrub inputs cannot underflow; all stored
/// values are normalized into `[0, total)`.
pub type TimelineMs = i64;

/// Normalizes `t_ms` into `[0, total_duration_ms)`.
///
/// The timeline is a cycle: values at or past the total wrap to the start,
/// negative values wrap backwards from the end.
///
/// # Example
/// ```
/// use engine::time::wrap_time;
///
/// assert_eq!(wrap_time(3_500, 3_500).expect("non-empty"), 0);
/// assert_eq!(wrap_time(3_600, 3_500).expect("non-empty"), 100);
/// assert_eq!(wrap_time(-100, 3_500).expect("non-empty"), 3_400);
/// ```
pub fn wrap_time(t_ms: TimelineMs, total_duration_ms: TimelineMs) -> Result<TimelineMs> {
    if total_duration_ms <= 0 {
        return Err(EngineError::EmptyTimeline);
    }
    Ok(t_ms.rem_euclid(total_duration_ms))
}

/// Converts a wall-clock duration into timeline milliseconds, saturating.
pub fn delta_ms(elapsed: Duration) -> TimelineMs {
    elapsed.as_millis().min(i64::MAX as u128) as TimelineMs
}
