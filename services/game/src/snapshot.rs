//! Session Snapshot Persistence
//!
//! Persists the score/progress/detection counters across restarts as a
//! small JSON file; everything else in a session is ephemeral. A missing or
//! unreadable file must never keep a session from starting, so load
//! failures degrade to a fresh snapshot with a warning.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use traffic_core::store::SessionSnapshot;
use tracing::warn;

/// File-backed store for the persisted slice of session state.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the persisted snapshot, if a readable one exists.
    pub fn load(&self) -> Option<SessionSnapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "could not read session snapshot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "session snapshot is corrupt, starting fresh");
                None
            }
        }
    }

    /// Writes the snapshot, replacing any previous one.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let raw = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("writing session snapshot to {}", self.path.display()))
    }

    /// Deletes the snapshot at session end. Missing files are fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("removing session snapshot {}", self.path.display())),
        }
    }
}
