use std::sync::mpsc::{self, TrySendError};
use std::thread;
use std::time::Duration;

use crate::api::{Command, Engine, EngineErrorEvent, Event};
use crate::clock::FrameClock;
use crate::time::TimelineMs;

const COMMAND_CHANNEL_CAPACITY: usize = 64;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Sender used to dispatch commands to the engine thread.
pub type CommandSender = mpsc::SyncSender<Command>;

/// Receiver used to read events emitted by the engine thread.
pub type EventReceiver = mpsc::Receiver<Event>;

/// Spawns the engine command loop on a worker thread.
///
/// All commands — user mutations and clock ticks alike — are applied in
/// arrival order by the single engine owner, so the read-modify-write of a
/// tick can never interleave with a concurrent scrub or edit, and a pause
/// enqueued before a tick is observed by it. A failed command becomes
/// `Event::Error` and the loop continues; the loop exits when every command
/// sender is dropped or the event receiver goes away.
pub fn spawn_engine_loop(mut engine: Engine) -> (CommandSender, EventReceiver) {
    let (command_tx, command_rx) = mpsc::sync_channel::<Command>(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::sync_channel::<Event>(EVENT_CHANNEL_CAPACITY);

    thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            match engine.handle_command(command) {
                Ok(events) => {
                    for event in events {
                        if event_tx.send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(error) => {
                    if event_tx
                        .send(Event::Error(EngineErrorEvent::from_error(&error)))
                        .is_err()
                    {
                        return;
                    }
                }
            }
        }
    });

    (command_tx, event_rx)
}

/// Running playback wiring: the engine loop plus a frame clock feeding it.
///
/// Dropping the runtime stops the clock and closes the command channel,
/// letting the engine thread exit.
pub struct PlaybackRuntime {
    command_tx: CommandSender,
    clock: FrameClock,
}

impl PlaybackRuntime {
    /// Spawns the engine loop and starts a frame clock whose deltas arrive
    /// as `Command::Tick` on the same queue as user commands.
    pub fn spawn(engine: Engine, frame_interval: Duration) -> (Self, EventReceiver) {
        let (command_tx, event_rx) = spawn_engine_loop(engine);

        let mut clock = FrameClock::new(frame_interval);
        let tick_tx = command_tx.clone();
        // Deltas carried across a full queue keep the applied total equal to
        // the elapsed wall time.
        let mut carried: TimelineMs = 0;
        clock.start(move |delta_ms| {
            let delta_ms = delta_ms + carried;
            match tick_tx.try_send(Command::Tick { delta_ms }) {
                Ok(()) => carried = 0,
                Err(TrySendError::Full(_)) => carried = delta_ms,
                Err(TrySendError::Disconnected(_)) => carried = 0,
            }
        });

        (Self { command_tx, clock }, event_rx)
    }

    /// Sender for user commands; ticks share the same queue.
    pub fn commands(&self) -> &CommandSender {
        &self.command_tx
    }

    /// Stops the clock and closes the command channel.
    pub fn shutdown(mut self) {
        self.clock.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Duration;

    use super::{PlaybackRuntime, spawn_engine_loop};
    use crate::api::{Command, Engine, EngineErrorKind, Event};
    use crate::doc::{Document, Language, Snapshot};

    fn sample_engine() -> Engine {
        let mut doc = Document::new(Language::Rust);
        for (code, duration_ms) in [("one", 1_000), ("two", 2_000), ("three", 500)] {
            doc.insert_snapshot(
                doc.snapshots.len(),
                Snapshot::new(code, None, duration_ms).expect("valid snapshot"),
            )
            .expect("in-range insert");
        }
        Engine::new(doc)
    }

    #[test]
    fn loop_forwards_events_for_commands() {
        let (command_tx, event_rx) = spawn_engine_loop(sample_engine());

        command_tx
            .send(Command::SetCurrentTime { t_ms: 1_500 })
            .expect("send scrub command");

        let event = event_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("time event");
        assert_eq!(event, Event::TimeChanged { t_ms: 1_500 });
    }

    #[test]
    fn loop_emits_error_event_and_keeps_running() {
        let (command_tx, event_rx) = spawn_engine_loop(Engine::new(Document::new(Language::Plain)));

        command_tx
            .send(Command::SetCurrentTime { t_ms: 10 })
            .expect("send scrub command");

        let event = event_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("error event");
        let Event::Error(error) = event else {
            panic!("expected Event::Error");
        };
        assert_eq!(error.kind, EngineErrorKind::EmptyTimeline);
        assert!(error.message.contains("zero total duration"));

        command_tx
            .send(Command::AddSnapshot {
                index: 0,
                snapshot: Snapshot::new("late", None, 100).expect("valid snapshot"),
            })
            .expect("send add command");
        let event = event_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("doc event after error");
        assert!(matches!(event, Event::DocChanged(_)));
    }

    #[test]
    fn pause_enqueued_before_a_tick_is_observed_by_it() {
        let (command_tx, event_rx) = spawn_engine_loop(sample_engine());

        command_tx
            .send(Command::SetPlaying { playing: true })
            .expect("send play command");
        command_tx
            .send(Command::Tick { delta_ms: 100 })
            .expect("send first tick");
        command_tx
            .send(Command::SetPlaying { playing: false })
            .expect("send pause command");
        command_tx
            .send(Command::Tick { delta_ms: 100 })
            .expect("send second tick");
        command_tx
            .send(Command::SetCurrentTime { t_ms: 42 })
            .expect("send marker scrub");

        let mut events = Vec::new();
        for _ in 0..4 {
            events.push(
                event_rx
                    .recv_timeout(Duration::from_secs(1))
                    .expect("event within timeout"),
            );
        }

        // The paused tick produced nothing: the marker scrub follows the
        // pause event directly.
        assert_eq!(
            events,
            vec![
                Event::PlayingChanged { playing: true },
                Event::TimeChanged { t_ms: 100 },
                Event::PlayingChanged { playing: false },
                Event::TimeChanged { t_ms: 42 },
            ]
        );
    }

    #[test]
    fn runtime_clock_advances_time_while_playing() {
        let (runtime, event_rx) = PlaybackRuntime::spawn(sample_engine(), Duration::from_millis(2));

        runtime
            .commands()
            .send(Command::SetPlaying { playing: true })
            .expect("send play command");

        let mut time_events = 0;
        while time_events < 3 {
            let event = event_rx
                .recv_timeout(Duration::from_secs(1))
                .expect("event within timeout");
            if let Event::TimeChanged { t_ms } = event {
                assert!((0..3_500).contains(&t_ms));
                time_events += 1;
            }
        }

        runtime.shutdown();
    }

    #[test]
    fn runtime_clock_produces_no_events_while_paused() {
        let (runtime, event_rx) = PlaybackRuntime::spawn(sample_engine(), Duration::from_millis(2));

        let result = event_rx.recv_timeout(Duration::from_millis(50));

        assert!(matches!(result, Err(RecvTimeoutError::Timeout)));
        runtime.shutdown();
    }

    #[test]
    fn shutdown_ends_the_event_stream() {
        let (runtime, event_rx) = PlaybackRuntime::spawn(sample_engine(), Duration::from_millis(2));

        runtime.shutdown();

        let result = event_rx.recv_timeout(Duration::from_secs(1));
        assert!(matches!(result, Err(RecvTimeoutError::Disconnected)));
    }
}
