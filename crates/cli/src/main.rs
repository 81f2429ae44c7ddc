mod player;

use std::process::ExitCode;
use std::time::Duration;

use engine::{Command, DEFAULT_FRAME_INTERVAL, Document, Engine, Language, PlaybackRuntime, Snapshot};
use tracing::{error, info};

use crate::player::PlayerState;

const PLAYBACK_CYCLES: u32 = 2;
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> ExitCode {
    init_tracing();

    let doc = match document_from_args() {
        Ok(doc) => doc,
        Err(err) => {
            error!(%err, "failed to load document");
            return ExitCode::FAILURE;
        }
    };

    run_player(doc);
    ExitCode::SUCCESS
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn document_from_args() -> engine::Result<Document> {
    match std::env::args().nth(1) {
        Some(path) => Document::load(path),
        None => Ok(demo_doc()),
    }
}

/// Three-step demo timeline shown when no document path is given.
fn demo_doc() -> Document {
    let steps = [
        ("fn main() {}\n", 900),
        ("fn main() {\n    let name = \"world\";\n}\n", 1_400),
        (
            "fn main() {\n    let name = \"world\";\n    println!(\"hello, {name}\");\n}\n",
            1_100,
        ),
    ];

    Document {
        snapshots: steps
            .into_iter()
            .map(|(code, duration_ms)| Snapshot {
                code: code.to_owned(),
                language: None,
                duration_ms,
            })
            .collect(),
        language: Language::Rust,
    }
}

fn run_player(doc: Document) {
    let total_duration_ms = doc.total_duration_ms();
    if total_duration_ms == 0 {
        info!("document has no playable snapshots; nothing to play");
        return;
    }
    info!(
        snapshot_count = doc.snapshots.len(),
        total_duration_ms, "starting playback"
    );

    let (runtime, event_rx) = PlaybackRuntime::spawn(Engine::new(doc.clone()), DEFAULT_FRAME_INTERVAL);
    let mut state = PlayerState::new(doc);

    if runtime
        .commands()
        .send(Command::SetPlaying { playing: true })
        .is_err()
    {
        error!("engine command channel closed before playback started");
        return;
    }

    while state.cycles_completed() < PLAYBACK_CYCLES {
        let event = match event_rx.recv_timeout(EVENT_TIMEOUT) {
            Ok(event) => event,
            Err(err) => {
                error!(%err, "playback event stream ended early");
                break;
            }
        };

        if let Some(transition) = state.apply(&event) {
            info!(
                index = transition.index,
                t_ms = transition.t_ms,
                language = transition.language.as_str(),
                "active snapshot changed"
            );
        }
    }

    runtime.shutdown();
    info!(cycles = state.cycles_completed(), "playback finished");
}
