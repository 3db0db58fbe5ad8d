use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by the player crate.
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Errors produced by trim-store persistence.
///
/// Playback-side failures are intentionally absent: adapter operations are
/// defensive no-ops when the engine instance is missing or not ready.
#[derive(Debug)]
pub enum PlayerError {
    StoreIo {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    StoreSerialization {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for PlayerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreIo {
                context,
                path,
                source,
            } => write!(f, "{context}: {} ({source})", path.display()),
            Self::StoreSerialization { path, source } => {
                write!(
                    f,
                    "trim store serialization failed at {} ({source})",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for PlayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StoreIo { source, .. } => Some(source),
            Self::StoreSerialization { source, .. } => Some(source),
        }
    }
}
