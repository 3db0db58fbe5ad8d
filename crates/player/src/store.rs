use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PlayerError, Result};
use crate::trim::TrimRange;

const STORE_DIR: &str = "trimdeck";
const STORE_FILE: &str = "trim_store.json";

/// Per-machine key-value store for trim ranges, keyed `trim-<videoId>`.
///
/// Values are kept as JSON-serialized `TrimRange` text so one corrupt entry
/// degrades to the default range without poisoning its neighbors. Writes are
/// unconditional, last-writer-wins.
#[derive(Debug)]
pub struct TrimStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl TrimStore {
    /// Opens the store backed by `path`. A missing or unreadable file starts
    /// the store empty; reads never fail the caller.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(error) => {
                    warn!(path = ?path, %error, "trim store file is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(error) => {
                warn!(path = ?path, %error, "trim store unreadable, starting empty");
                HashMap::new()
            }
        };

        Self { path, entries }
    }

    /// Opens the store at the platform-local data directory.
    pub fn open_default() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::open(base.join(STORE_DIR).join(STORE_FILE))
    }

    /// Returns the saved range for `video_id`, or `None` when nothing was
    /// saved or the stored value fails to parse or violates the gap
    /// invariant. Corruption is recovered locally, never propagated.
    pub fn load(&self, video_id: &str) -> Option<TrimRange> {
        let raw = self.entries.get(&key(video_id))?;
        match serde_json::from_str::<TrimRange>(raw) {
            Ok(range) if range.is_valid() => Some(range),
            Ok(range) => {
                warn!(video_id, ?range, "stored trim range violates invariant, ignoring");
                None
            }
            Err(error) => {
                warn!(video_id, %error, "stored trim range is corrupt, ignoring");
                None
            }
        }
    }

    /// Overwrites the range for `video_id` and rewrites the backing file.
    pub fn save(&mut self, video_id: &str, range: TrimRange) -> Result<()> {
        let raw = serde_json::to_string(&range).map_err(|source| {
            PlayerError::StoreSerialization {
                path: self.path.clone(),
                source,
            }
        })?;
        self.entries.insert(key(video_id), raw);
        debug!(video_id, ?range, "trim range saved");
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PlayerError::StoreIo {
                context: "creating trim store directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let raw = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            PlayerError::StoreSerialization {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, raw).map_err(|source| PlayerError::StoreIo {
            context: "writing trim store",
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn key(video_id: &str) -> String {
    format!("trim-{video_id}")
}
