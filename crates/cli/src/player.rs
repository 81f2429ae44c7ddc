use engine::doc::Document;
use engine::time::TimelineMs;
use engine::timeline::active_snapshot_at;
use engine::{Event, Language};

/// Active-snapshot change derived from a time event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub index: usize,
    pub t_ms: TimelineMs,
    pub language: Language,
}

/// Event consumer that re-derives the active snapshot on every time change.
///
/// The engine only reports positions; which snapshot is visible is always
/// recomputed here from the latest document copy, so edits applied mid-
/// playback take effect on the next event.
pub struct PlayerState {
    doc: Document,
    last_index: Option<usize>,
    last_time_ms: TimelineMs,
    cycles_completed: u32,
}

impl PlayerState {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            last_index: None,
            last_time_ms: 0,
            cycles_completed: 0,
        }
    }

    /// Number of full timeline cycles observed so far.
    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    /// Applies one engine event; returns the transition when the active
    /// snapshot changed.
    pub fn apply(&mut self, event: &Event) -> Option<Transition> {
        match event {
            Event::DocChanged(view) => {
                self.doc = Document {
                    snapshots: view.snapshots.clone(),
                    language: view.language,
                };
                None
            }
            Event::TimeChanged { t_ms } => self.apply_time(*t_ms),
            Event::PlayingChanged { .. } | Event::Error(_) => None,
        }
    }

    fn apply_time(&mut self, t_ms: TimelineMs) -> Option<Transition> {
        if t_ms < self.last_time_ms {
            self.cycles_completed += 1;
        }
        self.last_time_ms = t_ms;

        let active = active_snapshot_at(&self.doc, t_ms).ok()?;
        if self.last_index == Some(active.index) {
            return None;
        }
        self.last_index = Some(active.index);

        let snapshot = &self.doc.snapshots[active.index];
        Some(Transition {
            index: active.index,
            t_ms,
            language: self.doc.effective_language(snapshot),
        })
    }
}
