use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::time::{TimelineMs, delta_ms};
use tracing::debug;

/// Nominal frame interval, about 60 ticks per second.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Repeating, frame-paced delta-time source.
///
/// Each tick reports the actual elapsed time since the previous tick,
/// derived from cumulative elapsed wall time, so scheduling jitter and
/// whole-millisecond truncation never accumulate as drift. The clock knows
/// nothing about documents, the playing flag, or wrap-around.
#[derive(Debug)]
pub struct FrameClock {
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FrameClock {
    /// Creates a stopped clock with the given nominal interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Starts the tick thread, replacing any previous run.
    ///
    /// `on_tick` receives a positive delta in timeline milliseconds; wakeups
    /// that land inside the same millisecond are suppressed and their time
    /// is reported by the next tick.
    pub fn start<F>(&mut self, mut on_tick: F)
    where
        F: FnMut(TimelineMs) + Send + 'static,
    {
        self.stop();
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let interval = self.interval;
        self.handle = Some(thread::spawn(move || {
            let started = Instant::now();
            let mut last_reported: TimelineMs = 0;
            while running.load(Ordering::SeqCst) {
                thread::sleep(interval);
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let elapsed = delta_ms(started.elapsed());
                let delta = elapsed - last_reported;
                if delta == 0 {
                    continue;
                }
                last_reported = elapsed;
                on_tick(delta);
            }
            debug!(total_ms = last_reported, "frame clock stopped");
        }));
    }

    /// Stops the tick thread and waits for it to exit.
    ///
    /// Safe to call on a stopped clock; `start` may be called again after.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl Drop for FrameClock {
    fn drop(&mut self) {
        self.stop();
    }
}
