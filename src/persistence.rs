//! Per-exploration state on disk: one JSON object per exploration id.
//!
//! Failures here never interrupt rendering. Reads fall back to `None`,
//! writes are logged and dropped.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;

const APP_DIR: &str = "explorations";
const STATE_SUFFIX: &str = "-state";

/// `--state-dir`, else `$XDG_CONFIG_HOME/explorations`, else
/// `$HOME/.config/explorations`, else `./.explorations`.
pub fn storage_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return PathBuf::from(xdg).join(APP_DIR);
        }
    }
    match std::env::var("HOME") {
        Ok(home) if !home.trim().is_empty() => PathBuf::from(home).join(".config").join(APP_DIR),
        _ => PathBuf::from(format!(".{APP_DIR}")),
    }
}

/// Writes `body` next to `path` and renames it into place.
pub(crate) fn write_atomic(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(body)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}{STATE_SUFFIX}.json"))
    }

    /// Last saved config for `id`; `None` when absent or unreadable.
    pub fn load(&self, id: &str) -> Option<Config> {
        let path = self.path_for(id);
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("could not read {path:?}: {e}");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                log::warn!("ignoring corrupt state {path:?}: {e}");
                None
            }
        }
    }

    /// Best-effort write; returns whether it landed. NaN and infinite
    /// numbers are left out so the file always reads back.
    pub fn save(&self, id: &str, cfg: &Config) -> bool {
        let path = self.path_for(id);
        let mut cfg = cfg.clone();
        let bad: Vec<String> = cfg
            .iter()
            .filter(|(_, v)| !v.is_finite())
            .map(|(k, _)| k.to_string())
            .collect();
        for key in &bad {
            log::warn!("not persisting non-finite `{key}` for {id}");
            cfg.remove(key);
        }
        let body = match serde_json::to_vec_pretty(&cfg) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("could not serialise state for {id}: {e}");
                return false;
            }
        };
        match write_atomic(&path, &body) {
            Ok(()) => {
                log::debug!("saved {id} state to {path:?}");
                true
            }
            Err(e) => {
                log::warn!("could not save state to {path:?}: {e}");
                false
            }
        }
    }

    pub fn clear(&self, id: &str) {
        let path = self.path_for(id);
        match std::fs::remove_file(&path) {
            Ok(()) => log::info!("cleared {id} state"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("could not remove {path:?}: {e}"),
        }
    }

    /// Every stored state keyed `<id>-state`, skipping unreadable files.
    pub fn export_all(&self) -> BTreeMap<String, Config> {
        let mut out = BTreeMap::new();
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("could not list {:?}: {e}", self.root);
                }
                return out;
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(key) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            let Some(id) = key.strip_suffix(STATE_SUFFIX) else {
                continue;
            };
            if let Some(cfg) = self.load(id) {
                out.insert(key.to_string(), cfg);
            }
        }
        out
    }
}
