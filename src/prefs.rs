//! Small persisted preferences: liked media and one-time acknowledgements.
//!
//! Stored as a flat JSON object. Storage failures are logged and the store
//! keeps working in memory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const LIKED_KEY: &str = "liked-media";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed preferences: {0}")]
    Json(#[from] serde_json::Error),
}

/// One-time prompts the user can dismiss for good.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    Pledge,
    InstallBanner,
}

impl Acknowledgement {
    fn key(self) -> &'static str {
        match self {
            Acknowledgement::Pledge => "pledge-agreed",
            Acknowledgement::InstallBanner => "install-banner-closed",
        }
    }
}

#[derive(Debug, Default)]
pub struct PrefsStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, Value>,
}

impl PrefsStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing file starts empty; an unreadable or
    /// malformed one is logged and ignored.
    pub fn open(path: &Path) -> Self {
        let values = match read_values(path) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring stored preferences");
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path.to_path_buf()),
            values,
        }
    }

    pub fn liked(&self) -> Vec<String> {
        self.values
            .get(LIKED_KEY)
            .and_then(|v| serde_json::from_value::<Vec<String>>(v.clone()).ok())
            .unwrap_or_default()
    }

    pub fn is_liked(&self, id: &str) -> bool {
        self.liked().iter().any(|l| l == id)
    }

    /// Flip the liked flag for `id`; returns the new value.
    pub fn toggle_like(&mut self, id: &str) -> bool {
        let mut liked = self.liked();
        let now_liked = match liked.iter().position(|l| l == id) {
            Some(i) => {
                liked.remove(i);
                false
            }
            None => {
                liked.push(id.to_string());
                true
            }
        };
        self.values.insert(LIKED_KEY.into(), Value::from(liked));
        self.persist();
        now_liked
    }

    pub fn acknowledged(&self, ack: Acknowledgement) -> bool {
        self.values
            .get(ack.key())
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn acknowledge(&mut self, ack: Acknowledgement) {
        self.values.insert(ack.key().into(), Value::Bool(true));
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "failed to save preferences");
        }
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(path, text).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "preferences saved");
        Ok(())
    }
}

fn read_values(path: &Path) -> Result<BTreeMap<String, Value>, StoreError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}
