use crate::doc::Document;
use crate::error::Result;
use crate::time::{TimelineMs, wrap_time};

/// Active snapshot resolved for one timeline instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSnapshot {
    pub index: usize,
    /// Offset into the active snapshot, `0 <= offset < duration`.
    ///
    /// Exposed for renderers that want intra-snapshot progress; the engine
    /// itself only consumes the index.
    pub offset_ms: TimelineMs,
}

/// Maps a timeline instant to the snapshot that owns it.
///
/// `t_ms` is normalized into `[0, total)` first, so any value resolves,
/// including the total itself (wraps to the first snapshot) and negatives.
/// Each snapshot owns a left-closed, right-open slice of the cycle: an exact
/// boundary instant belongs to the later snapshot, never to both.
///
/// Fails with `EmptyTimeline` when the document has zero total duration.
///
/// # Example
/// ```
/// use engine::doc::{Document, Language, Snapshot};
/// use engine::timeline::active_snapshot_at;
///
/// let mut doc = Document::new(Language::Rust);
/// for duration_ms in [1_000, 2_000, 500] {
///     doc.insert_snapshot(doc.snapshots.len(), Snapshot::new("", None, duration_ms).expect("valid"))
///         .expect("in range");
/// }
///
/// let active = active_snapshot_at(&doc, 1_000).expect("playable");
/// assert_eq!(active.index, 1);
/// assert_eq!(active.offset_ms, 0);
/// ```
pub fn active_snapshot_at(doc: &Document, t_ms: TimelineMs) -> Result<ActiveSnapshot> {
    let t = wrap_time(t_ms, doc.total_duration_ms())?;

    let mut index = 0;
    let mut start = 0;
    while index + 1 < doc.snapshots.len() && t >= start + doc.snapshots[index].duration_ms {
        start += doc.snapshots[index].duration_ms;
        index += 1;
    }
    debug_assert!(t - start < doc.snapshots[index].duration_ms);

    Ok(ActiveSnapshot {
        index,
        offset_ms: t - start,
    })
}
