//! Named snapshots of an exploration's config, kept in
//! `<root>/<exploration-id>/snapshots.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::persistence::write_atomic;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshots file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid snapshot index {index} (have {len})")]
    InvalidIndex { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub name: String,
    pub state: Config,
    pub created_at: DateTime<Utc>,
}

fn numbered(n: usize) -> String {
    format!("Snapshot {n}")
}

/// The ordered snapshot list for one exploration. Mutations write through.
#[derive(Debug)]
pub struct SnapshotBook {
    path: PathBuf,
    entries: Vec<Snapshot>,
}

impl SnapshotBook {
    pub fn open(root: &Path, id: &str) -> Result<Self, SnapshotError> {
        let path = root.join(id).join("snapshots.json");
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(SnapshotError::Io { path, source }),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Result<&Snapshot, SnapshotError> {
        self.entries.get(index).ok_or(SnapshotError::InvalidIndex {
            index,
            len: self.entries.len(),
        })
    }

    /// Appends `state` as `Snapshot N` and returns its name.
    pub fn save(&mut self, state: &Config) -> Result<String, SnapshotError> {
        let name = numbered(self.entries.len() + 1);
        self.entries.push(Snapshot {
            name: name.clone(),
            state: state.clone(),
            created_at: Utc::now(),
        });
        self.flush()?;
        log::info!("saved {name} to {:?}", self.path);
        Ok(name)
    }

    /// Removes entry `index` and renumbers the rest from 1.
    pub fn delete(&mut self, index: usize) -> Result<Snapshot, SnapshotError> {
        self.get(index)?;
        let removed = self.entries.remove(index);
        for (i, snap) in self.entries.iter_mut().enumerate() {
            snap.name = numbered(i + 1);
        }
        self.flush()?;
        Ok(removed)
    }

    pub fn flush(&self) -> Result<(), SnapshotError> {
        let body = serde_json::to_vec_pretty(&self.entries)?;
        write_atomic(&self.path, &body).map_err(|source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Value;

    fn state(speed: f64) -> Config {
        let mut cfg = Config::new();
        cfg.set("speed", Value::Number(speed));
        cfg
    }

    #[test]
    fn save_numbers_sequentially_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = SnapshotBook::open(dir.path(), "exploration-05").unwrap();
        assert_eq!(book.save(&state(1.0)).unwrap(), "Snapshot 1");
        assert_eq!(book.save(&state(2.0)).unwrap(), "Snapshot 2");

        let reopened = SnapshotBook::open(dir.path(), "exploration-05").unwrap();
        assert_eq!(reopened.entries(), book.entries());
        assert!(reopened.path().ends_with("exploration-05/snapshots.json"));
    }

    #[test]
    fn delete_renumbers() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = SnapshotBook::open(dir.path(), "exploration-01").unwrap();
        for s in [1.0, 2.0, 3.0] {
            book.save(&state(s)).unwrap();
        }
        let removed = book.delete(0).unwrap();
        assert_eq!(removed.state, state(1.0));
        let names: Vec<_> = book.entries().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Snapshot 1", "Snapshot 2"]);
        assert_eq!(book.entries()[0].state, state(2.0));
    }

    #[test]
    fn out_of_range_delete_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = SnapshotBook::open(dir.path(), "exploration-01").unwrap();
        assert!(matches!(
            book.delete(0),
            Err(SnapshotError::InvalidIndex { index: 0, len: 0 })
        ));
    }

    #[test]
    fn wire_format_uses_created_at() {
        let snap = Snapshot {
            name: numbered(1),
            state: state(0.5),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["state"]["speed"], 0.5);
    }
}
