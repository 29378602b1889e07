//! Offline asset cache: a worker that intercepts asset requests and applies
//! a per-class caching policy over versioned buckets.
//!
//! The worker runs on its own thread (see [`spawn_cache_service`]); the rest
//! of the app only talks to it through a [`CacheClient`].

mod fetch;
mod request;
mod service;
mod storage;
mod worker;

use std::path::PathBuf;

use thiserror::Error;

pub use fetch::{FetchError, Fetcher, HttpFetcher, OnlineStatus};
pub use request::{AssetClass, Request, Response};
pub use service::{CacheClient, spawn_cache_service};
pub use storage::CacheStorage;
pub use worker::{
    BucketNames, CacheWorker, FetchOutcome, Lifecycle, WorkerMessage, WorkerOptions, resolve,
};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt cache index: {0}")]
    Index(#[from] serde_json::Error),
    #[error("failed to precache {path}: {reason}")]
    Precache { path: String, reason: String },
    #[error("invalid url {url}: {reason}")]
    BadUrl { url: String, reason: String },
    #[error("worker has not finished installing")]
    NotInstalled,
    #[error("cache storage lock poisoned")]
    Poisoned,
}

#[cfg(test)]
pub(crate) mod tests;
