use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by engine commands and timeline operations.
#[derive(Debug)]
pub enum EngineError {
    EmptyTimeline,
    InvalidIndex {
        index: usize,
        len: usize,
    },
    InvalidDuration {
        duration_ms: i64,
    },
    InvalidOrder {
        reason: String,
    },
    DocIo {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    DocSerialization {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidDocFile {
        reason: String,
    },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTimeline => write!(f, "timeline has zero total duration"),
            Self::InvalidIndex { index, len } => {
                write!(f, "snapshot index {index} out of range (len {len})")
            }
            Self::InvalidDuration { duration_ms } => {
                write!(f, "snapshot duration must be positive: {duration_ms}ms")
            }
            Self::InvalidOrder { reason } => write!(f, "invalid snapshot order: {reason}"),
            Self::DocIo {
                context,
                path,
                source,
            } => write!(f, "{context}: {} ({source})", path.display()),
            Self::DocSerialization { path, source } => {
                write!(
                    f,
                    "document serialization/deserialization failed at {} ({source})",
                    path.display()
                )
            }
            Self::InvalidDocFile { reason } => write!(f, "invalid document file: {reason}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DocIo { source, .. } => Some(source),
            Self::DocSerialization { source, .. } => Some(source),
            _ => None,
        }
    }
}
