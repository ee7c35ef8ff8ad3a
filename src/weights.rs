//! Category weights with hot-reload from `config/weights.json`.
//!
//! JSON shape (missing categories default to 1):
//! {
//!   "Judicial": 2.0,
//!   "Elections": 1.5
//! }
//!
//! On each `current()` call we check the file's modified time and reload if changed.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::RwLock,
    time::SystemTime,
};

use crate::model::CategoryWeights;

/// Hot-reload wrapper: reloads when the config file mtime changes.
#[derive(Debug)]
pub struct HotReloadWeights {
    path: PathBuf,
    inner: RwLock<State>,
}

#[derive(Debug)]
struct State {
    weights: CategoryWeights,
    last_modified: Option<SystemTime>,
}

impl HotReloadWeights {
    /// Create with a path (defaults to "config/weights.json" if `None`).
    pub fn new(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(crate::ingest::config::DEFAULT_WEIGHTS_PATH));
        Self {
            path,
            inner: RwLock::new(State {
                weights: CategoryWeights::default(),
                last_modified: None,
            }),
        }
    }

    /// Get the latest weights, reloading if the config file changed.
    /// A missing or invalid file keeps the last good weights.
    pub fn current(&self) -> CategoryWeights {
        let mtime = fs::metadata(&self.path).and_then(|m| m.modified()).ok();

        let needs_reload = match (mtime, self.inner.read()) {
            (Some(m), Ok(guard)) => guard.last_modified != Some(m),
            _ => false,
        };

        if needs_reload {
            match read_weights(&self.path) {
                Ok(w) => {
                    if let Ok(mut guard) = self.inner.write() {
                        guard.weights = w;
                        guard.last_modified = mtime;
                        tracing::info!(target: "weights", path = %self.path.display(), "weights reloaded");
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "weights", error = %e, path = %self.path.display(), "weights reload failed");
                    if let Ok(mut guard) = self.inner.write() {
                        // Don't retry the same broken file on every call.
                        guard.last_modified = mtime;
                    }
                }
            }
        }

        self.inner
            .read()
            .map(|g| g.weights.clone())
            .unwrap_or_default()
    }
}

fn read_weights(path: &Path) -> io::Result<CategoryWeights> {
    let s = fs::read_to_string(path)?;
    serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
