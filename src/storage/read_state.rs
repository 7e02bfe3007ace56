use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feed::Feed;

/// Errors from the on-disk read-state store.
///
/// Callers treat every one of these as degraded-but-recoverable: a load
/// failure means "empty state", a save failure means "the next successful
/// save catches up". Nothing here is allowed to abort a fetch cycle.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode read state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One persisted item record: identity plus the user flags.
///
/// Item content (title, link, description) is deliberately not persisted —
/// content always comes from the freshest fetch, and a small file keyed by
/// id avoids stale text shadowing the upstream document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedItem {
    pub id: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// The on-disk record for one feed: its last-known title and every item
/// this installation has ever flagged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    #[serde(default)]
    pub feed_title: String,
    #[serde(default)]
    pub item_list: Vec<PersistedItem>,
}

impl PersistedState {
    pub fn get(&self, id: &str) -> Option<&PersistedItem> {
        self.item_list.iter().find(|i| i.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.item_list.is_empty()
    }
}

/// Maps a feed URL to a filesystem-safe relative file name: the scheme is
/// stripped and path separators become `--`.
///
/// Deterministic and collision-tolerant-enough; two URLs differing only in
/// scheme intentionally share a file, and exotic collisions are an accepted
/// limitation of the scheme.
pub fn sanitize_url(url: &str) -> String {
    let stripped = url.split_once("://").map_or(url, |(_, rest)| rest);
    let name = stripped.replace('/', "--");
    if name.is_empty() {
        "feed".to_string()
    } else {
        name
    }
}

/// File-per-feed JSON store for read/deleted flags.
///
/// Files live directly under the storage directory, named by
/// [`sanitize_url`]. Writes replace the whole file atomically (temp file +
/// rename), so a crash mid-save leaves the previous state intact rather
/// than a truncated document.
#[derive(Debug, Clone)]
pub struct ReadStateStore {
    dir: PathBuf,
}

impl ReadStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(sanitize_url(url))
    }

    /// Serializes the feed's title and per-item flags to its state file,
    /// creating the storage directory if needed.
    pub fn save(&self, feed: &Feed) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let state = PersistedState {
            feed_title: feed.display_title().to_string(),
            item_list: feed
                .items
                .iter()
                .map(|i| PersistedItem {
                    id: i.id.clone(),
                    read: i.read,
                    deleted: i.deleted,
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&state)?;
        let path = self.path_for(&feed.url);
        write_atomic(&path, json.as_bytes())?;
        tracing::debug!(feed = %feed.url, items = state.item_list.len(), "Saved read state");
        Ok(())
    }

    /// Reads the persisted state for a feed URL.
    ///
    /// A missing file is the expected case for a never-before-seen feed and
    /// yields empty state. A file that exists but fails to decode — garbage,
    /// or one of the incompatible historical formats — is logged and also
    /// yields empty state: corrupt local state costs the read-history for
    /// that feed, never a crash. Only unexpected I/O failures (permissions,
    /// hardware) surface as `Err`.
    pub fn load(&self, url: &str) -> Result<PersistedState, StoreError> {
        let path = self.path_for(url);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(feed = %url, "No persisted read state (new feed)");
                return Ok(PersistedState::default());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(
                    feed = %url,
                    path = %path.display(),
                    error = %e,
                    "Undecodable read-state file, treating as empty"
                );
                Ok(PersistedState::default())
            }
        }
    }
}

/// Writes `data` to `path` via a randomized temp file and rename, so the
/// destination is never observed in a partial state. `create_new` makes the
/// temp creation fail rather than follow a pre-planted symlink.
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), std::io::Error> {
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string());
    let temp_path = path.with_file_name(format!("{file_name}.tmp.{random_suffix:016x}"));

    let mut temp_file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;

    let result = temp_file
        .write_all(data)
        .and_then(|_| temp_file.sync_all());
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    drop(temp_file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}
