//! UI-agnostic timeline engine for the Codereel MVP.
//!
//! Models an ordered sequence of code snapshots as one cyclic timeline and
//! drives a playhead through it: frame clock in, commands serialized through
//! a single owner, read-only projections out.

pub mod api;
pub mod clock;
pub mod doc;
pub mod error;
pub mod playback;
pub mod time;
pub mod timeline;

pub use api::{
    ActiveView, Command, DocView, Engine, EngineErrorEvent, EngineErrorKind, Event, PlaybackView,
};
pub use clock::{DEFAULT_FRAME_INTERVAL, FrameClock};
pub use doc::{Document, Language, Snapshot};
pub use error::{EngineError, Result};
pub use playback::{CommandSender, EventReceiver, PlaybackRuntime, spawn_engine_loop};
pub use time::{TimelineMs, wrap_time};
pub use timeline::{ActiveSnapshot, active_snapshot_at};
