//! Named buckets of cached responses, optionally mirrored to disk.
//!
//! On disk each bucket is a directory holding `index.json` plus one body file
//! per entry, named by the SHA-256 of the request key.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::CacheError;
use super::request::Response;

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EntryMeta {
    status: u16,
    headers: Vec<(String, String)>,
    body_file: String,
    stored_at: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    meta: EntryMeta,
    body: Vec<u8>,
}

type Buckets = BTreeMap<String, BTreeMap<String, Entry>>;

/// Cheap to clone; clones share the same buckets.
#[derive(Clone, Default)]
pub struct CacheStorage {
    buckets: Arc<Mutex<Buckets>>,
    dir: Option<PathBuf>,
}

impl CacheStorage {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (creating if needed) a disk-backed store rooted at `dir`.
    /// Unreadable buckets are skipped with a warning.
    pub fn open(dir: &Path) -> Result<Self, CacheError> {
        fs::create_dir_all(dir).map_err(|source| CacheError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut buckets = Buckets::new();
        let entries = fs::read_dir(dir).map_err(|source| CacheError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            match load_bucket(&path) {
                Ok(bucket) => {
                    debug!(bucket = %name, entries = bucket.len(), "loaded cache bucket");
                    buckets.insert(name, bucket);
                }
                Err(e) => warn!(bucket = %name, error = %e, "skipping unreadable cache bucket"),
            }
        }

        Ok(Self {
            buckets: Arc::new(Mutex::new(buckets)),
            dir: Some(dir.to_path_buf()),
        })
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets
            .lock()
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets
            .lock()
            .map(|b| b.contains_key(bucket))
            .unwrap_or(false)
    }

    /// Store `response` under `key`, replacing any previous entry.
    ///
    /// The body file is written before the bucket lock is taken; only the
    /// index rewrite happens under it.
    pub fn put(&self, bucket: &str, key: &str, response: &Response) -> Result<(), CacheError> {
        let body_file = body_file_name(key);
        if let Some(dir) = &self.dir {
            write_file(&dir.join(bucket).join(&body_file), &response.body)?;
        }
        let entry = Entry {
            meta: EntryMeta {
                status: response.status,
                headers: response.headers.clone(),
                body_file,
                stored_at: unix_now(),
            },
            body: response.body.clone(),
        };

        let mut buckets = self.buckets.lock().map_err(|_| CacheError::Poisoned)?;
        let entries = buckets.entry(bucket.to_string()).or_default();
        entries.insert(key.to_string(), entry);
        if let Some(dir) = &self.dir {
            write_index(&dir.join(bucket), entries)?;
        }
        Ok(())
    }

    pub fn match_in(&self, bucket: &str, key: &str) -> Option<Response> {
        let buckets = self.buckets.lock().ok()?;
        buckets.get(bucket)?.get(key).map(to_response)
    }

    #[cfg(test)]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .ok()
            .and_then(|b| b.get(bucket).map(|e| e.keys().cloned().collect()))
            .unwrap_or_default()
    }

    /// Drop a whole bucket. Returns whether it existed.
    pub fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError> {
        let mut buckets = self.buckets.lock().map_err(|_| CacheError::Poisoned)?;
        let existed = buckets.remove(bucket).is_some();
        if let Some(dir) = &self.dir {
            let path = dir.join(bucket);
            if path.exists() {
                fs::remove_dir_all(&path).map_err(|source| CacheError::Io { path, source })?;
            }
        }
        Ok(existed)
    }
}

fn to_response(entry: &Entry) -> Response {
    Response {
        status: entry.meta.status,
        headers: entry.meta.headers.clone(),
        body: entry.body.clone(),
    }
}

fn body_file_name(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn load_bucket(dir: &Path) -> Result<BTreeMap<String, Entry>, CacheError> {
    let index_path = dir.join(INDEX_FILE);
    if !index_path.exists() {
        return Ok(BTreeMap::new());
    }
    let text = fs::read_to_string(&index_path).map_err(|source| CacheError::Io {
        path: index_path.clone(),
        source,
    })?;
    let index: BTreeMap<String, EntryMeta> = serde_json::from_str(&text)?;

    let mut bucket = BTreeMap::new();
    for (key, meta) in index {
        let body_path = dir.join(&meta.body_file);
        match fs::read(&body_path) {
            Ok(body) => {
                bucket.insert(key, Entry { meta, body });
            }
            Err(e) => warn!(key = %key, error = %e, "cached body missing, dropping entry"),
        }
    }
    Ok(bucket)
}

fn write_index(dir: &Path, entries: &BTreeMap<String, Entry>) -> Result<(), CacheError> {
    let index: BTreeMap<&str, &EntryMeta> = entries
        .iter()
        .map(|(k, e)| (k.as_str(), &e.meta))
        .collect();
    let text = serde_json::to_string_pretty(&index)?;
    write_file(&dir.join(INDEX_FILE), text.as_bytes())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CacheError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })
}
