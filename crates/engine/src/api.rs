use crate::doc::{Document, Language, Snapshot};
use crate::error::{EngineError, Result};
use crate::time::{TimelineMs, wrap_time};
use crate::timeline::active_snapshot_at;
use tracing::{debug, info, trace};

/// Commands accepted by the engine.
///
/// All playback-state mutation funnels through here so that ticks, scrubs,
/// and edits are applied strictly in arrival order to one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Starts or stops playback. Never resets the current time.
    SetPlaying {
        playing: bool,
    },
    /// Scrubs to `t_ms`, stored modulo the total duration.
    ///
    /// Fails with `EmptyTimeline` on a document with no playable snapshots.
    SetCurrentTime {
        t_ms: TimelineMs,
    },
    /// Replaces `snapshots[index]` wholesale.
    ///
    /// The current time is not renormalized: an edit that moves a timeline
    /// boundary across the playhead changes which snapshot the next lookup
    /// returns, nothing else.
    UpdateSnapshot {
        index: usize,
        snapshot: Snapshot,
    },
    /// Replaces the sequence with a permutation; `order[i]` is the old index
    /// of the snapshot that ends up at position `i`.
    Reorder {
        order: Vec<usize>,
    },
    /// Inserts a snapshot at `index` (may equal the current length).
    AddSnapshot {
        index: usize,
        snapshot: Snapshot,
    },
    /// Removes the snapshot at `index`. The document may become empty and
    /// therefore unplayable.
    RemoveSnapshot {
        index: usize,
    },
    /// Removes every snapshot and resets playback to paused at time zero.
    Clear,
    /// Advances playback by one clock delta.
    ///
    /// Normally produced by the frame clock; tests and headless drivers may
    /// feed deltas directly. A no-op while paused, a skipped tick on an
    /// empty timeline.
    Tick {
        delta_ms: TimelineMs,
    },
}

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DocChanged(DocView),
    TimeChanged { t_ms: TimelineMs },
    PlayingChanged { playing: bool },
    Error(EngineErrorEvent),
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    EmptyTimeline,
    InvalidIndex,
    InvalidDuration,
    InvalidOrder,
    Other,
}

impl From<&EngineError> for EngineErrorKind {
    fn from(value: &EngineError) -> Self {
        match value {
            EngineError::EmptyTimeline => Self::EmptyTimeline,
            EngineError::InvalidIndex { .. } => Self::InvalidIndex,
            EngineError::InvalidDuration { .. } => Self::InvalidDuration,
            EngineError::InvalidOrder { .. } => Self::InvalidOrder,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Immutable document view consumed by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocView {
    pub snapshots: Vec<Snapshot>,
    pub language: Language,
    pub total_duration_ms: TimelineMs,
}

/// Snapshot currently under the playhead, with its resolved language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveView {
    pub index: usize,
    pub offset_ms: TimelineMs,
    pub snapshot: Snapshot,
    pub language: Language,
}

/// Read-only playback projection recomputed on demand.
///
/// `active` is `None` exactly when the document has no playable snapshots;
/// `current_time_ms` is always normalized for display even when a shrinking
/// edit left the stored time past the new total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackView {
    pub active: Option<ActiveView>,
    pub total_duration_ms: TimelineMs,
    pub current_time_ms: TimelineMs,
    pub playing: bool,
}

/// Single owner of the live document and its playback state.
///
/// Commands mutate; `view` projects. Failed commands leave all state
/// untouched and never stop subsequent commands from applying.
#[derive(Debug)]
pub struct Engine {
    doc: Document,
    current_time_ms: TimelineMs,
    playing: bool,
}

impl Engine {
    /// Creates an engine paused at time zero over `doc`.
    ///
    /// # Example
    /// ```
    /// use engine::{Document, Engine, Language};
    ///
    /// let engine = Engine::new(Document::new(Language::Rust));
    /// assert!(!engine.playing());
    /// assert_eq!(engine.current_time_ms(), 0);
    /// ```
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            current_time_ms: 0,
            playing: false,
        }
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::SetPlaying { playing } => Ok(self.set_playing(playing)),
            Command::SetCurrentTime { t_ms } => self.set_current_time(t_ms),
            Command::UpdateSnapshot { index, snapshot } => self.update_snapshot(index, snapshot),
            Command::Reorder { order } => self.reorder(&order),
            Command::AddSnapshot { index, snapshot } => self.add_snapshot(index, snapshot),
            Command::RemoveSnapshot { index } => self.remove_snapshot(index),
            Command::Clear => Ok(self.clear()),
            Command::Tick { delta_ms } => Ok(self.tick(delta_ms)),
        }
    }

    /// Returns the live document.
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// Returns the stored playback time.
    ///
    /// May sit past the total after a shrinking edit until the next tick or
    /// scrub renormalizes it; `view` normalizes for display.
    pub fn current_time_ms(&self) -> TimelineMs {
        self.current_time_ms
    }

    /// Returns whether playback is running.
    pub fn playing(&self) -> bool {
        self.playing
    }

    /// Projects the current playback state.
    pub fn view(&self) -> PlaybackView {
        let total_duration_ms = self.doc.total_duration_ms();
        let current_time_ms = wrap_time(self.current_time_ms, total_duration_ms).unwrap_or(0);
        let active = active_snapshot_at(&self.doc, self.current_time_ms)
            .ok()
            .map(|active| {
                let snapshot = &self.doc.snapshots[active.index];
                ActiveView {
                    index: active.index,
                    offset_ms: active.offset_ms,
                    snapshot: snapshot.clone(),
                    language: self.doc.effective_language(snapshot),
                }
            });

        PlaybackView {
            active,
            total_duration_ms,
            current_time_ms,
            playing: self.playing,
        }
    }

    fn set_playing(&mut self, playing: bool) -> Vec<Event> {
        self.playing = playing;
        debug!(playing, "playing toggled");
        vec![Event::PlayingChanged { playing }]
    }

    fn set_current_time(&mut self, t_ms: TimelineMs) -> Result<Vec<Event>> {
        let wrapped = wrap_time(t_ms, self.doc.total_duration_ms())?;
        self.current_time_ms = wrapped;
        debug!(t_ms, wrapped, "scrub applied");
        Ok(vec![Event::TimeChanged { t_ms: wrapped }])
    }

    fn update_snapshot(&mut self, index: usize, snapshot: Snapshot) -> Result<Vec<Event>> {
        self.doc.replace_snapshot(index, snapshot)?;
        info!(index, "snapshot replaced");
        Ok(vec![Event::DocChanged(self.doc_view())])
    }

    fn reorder(&mut self, order: &[usize]) -> Result<Vec<Event>> {
        self.doc.reorder(order)?;
        info!(?order, "snapshots reordered");
        Ok(vec![Event::DocChanged(self.doc_view())])
    }

    fn add_snapshot(&mut self, index: usize, snapshot: Snapshot) -> Result<Vec<Event>> {
        self.doc.insert_snapshot(index, snapshot)?;
        info!(index, snapshot_count = self.doc.snapshots.len(), "snapshot added");
        Ok(vec![Event::DocChanged(self.doc_view())])
    }

    fn remove_snapshot(&mut self, index: usize) -> Result<Vec<Event>> {
        self.doc.remove_snapshot(index)?;
        info!(index, snapshot_count = self.doc.snapshots.len(), "snapshot removed");
        Ok(vec![Event::DocChanged(self.doc_view())])
    }

    fn clear(&mut self) -> Vec<Event> {
        self.doc.clear();
        info!("document cleared");
        let mut events = vec![Event::DocChanged(self.doc_view())];

        // A cleared document restarts its playback lifecycle.
        if self.current_time_ms != 0 {
            self.current_time_ms = 0;
            events.push(Event::TimeChanged { t_ms: 0 });
        }
        if self.playing {
            self.playing = false;
            events.push(Event::PlayingChanged { playing: false });
        }
        events
    }

    fn tick(&mut self, delta_ms: TimelineMs) -> Vec<Event> {
        if !self.playing {
            return Vec::new();
        }

        let total_duration_ms = self.doc.total_duration_ms();
        let Ok(new_time) = wrap_time(self.current_time_ms + delta_ms, total_duration_ms) else {
            // Degenerate timeline: a failed tick is a skipped tick.
            trace!(delta_ms, "tick skipped: empty timeline");
            return Vec::new();
        };

        self.current_time_ms = new_time;
        trace!(delta_ms, t_ms = new_time, "tick applied");
        vec![Event::TimeChanged { t_ms: new_time }]
    }

    fn doc_view(&self) -> DocView {
        DocView {
            snapshots: self.doc.snapshots.clone(),
            language: self.doc.language,
            total_duration_ms: self.doc.total_duration_ms(),
        }
    }
}
