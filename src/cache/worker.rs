use std::sync::Arc;
use std::thread::{self, JoinHandle};

use reqwest::Url;
use tracing::{debug, error, info, warn};

use super::CacheError;
use super::fetch::Fetcher;
use super::request::{AssetClass, Request, Response};
use super::storage::CacheStorage;

const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Where the worker is in its install/activate lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Parsed,
    Installing,
    /// Installed, waiting to take over.
    Installed,
    Activated,
    /// Install failed with nothing stored; the worker never serves.
    Redundant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    SkipWaiting,
}

/// What the caller should do with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Not ours; fetch it directly.
    Passthrough,
    Respond(Response),
}

/// Versioned bucket names for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketNames {
    pub general: String,
    pub audio: String,
    pub image: String,
}

impl BucketNames {
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            general: format!("{prefix}-cache-{version}"),
            audio: format!("{prefix}-audio-cache-{version}"),
            image: format!("{prefix}-image-cache-{version}"),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        [&self.general, &self.audio, &self.image]
            .iter()
            .any(|n| n.as_str() == name)
    }
}

#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub origin: Url,
    pub buckets: BucketNames,
    pub precache: Vec<String>,
    pub offline_page: String,
    pub skip_waiting: bool,
}

/// Request-interception policy per asset class, plus the bucket lifecycle.
pub struct CacheWorker {
    options: WorkerOptions,
    storage: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
    lifecycle: Lifecycle,
    skip_waiting: bool,
    background: Vec<JoinHandle<()>>,
}

impl CacheWorker {
    pub fn new(options: WorkerOptions, storage: CacheStorage, fetcher: Arc<dyn Fetcher>) -> Self {
        let skip_waiting = options.skip_waiting;
        Self {
            options,
            storage,
            fetcher,
            lifecycle: Lifecycle::Parsed,
            skip_waiting,
            background: Vec::new(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn buckets(&self) -> &BucketNames {
        &self.options.buckets
    }

    /// Pre-fetch the app shell into the general bucket. Nothing is stored
    /// unless every entry succeeds.
    ///
    /// A version whose general bucket survives from an earlier session is
    /// already the active one: it takes over without waiting, and when the
    /// shell cannot be refreshed (offline start) it keeps serving what it has.
    pub fn install(&mut self) -> Result<(), CacheError> {
        self.lifecycle = Lifecycle::Installing;
        let resumed = self.storage.has_bucket(&self.options.buckets.general);
        info!(entries = self.options.precache.len(), resumed, "installing cache worker");

        let fetched = match self.precache_all() {
            Ok(fetched) => fetched,
            Err(e) if resumed => {
                warn!(error = %e, "precache failed, serving the stored cache");
                self.lifecycle = Lifecycle::Installed;
                self.activate()?;
                return Ok(());
            }
            Err(e) => {
                error!(error = %e, "precache failed, install aborted");
                self.lifecycle = Lifecycle::Redundant;
                return Err(e);
            }
        };
        for (key, response) in &fetched {
            self.storage.put(&self.options.buckets.general, key, response)?;
        }

        self.lifecycle = Lifecycle::Installed;
        if self.skip_waiting || resumed {
            self.activate()?;
        }
        Ok(())
    }

    /// Fetch every precache entry, stopping at the first failure.
    fn precache_all(&self) -> Result<Vec<(String, Response)>, CacheError> {
        self.options
            .precache
            .iter()
            .map(|path| self.precache_one(path))
            .collect()
    }

    fn precache_one(&self, path: &str) -> Result<(String, Response), CacheError> {
        let url = resolve(&self.options.origin, path)?;
        let request = Request::get(url);
        let response = self
            .fetcher
            .fetch(&request)
            .map_err(|e| CacheError::Precache {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        if !response.ok() {
            return Err(CacheError::Precache {
                path: path.to_string(),
                reason: format!("status {}", response.status),
            });
        }
        Ok((request.key().to_string(), response))
    }

    /// Take over: delete every bucket not belonging to this version.
    /// Returns how many buckets were removed.
    pub fn activate(&mut self) -> Result<usize, CacheError> {
        if self.lifecycle != Lifecycle::Installed {
            return Err(CacheError::NotInstalled);
        }
        let mut removed = 0;
        for name in self.storage.bucket_names() {
            if !self.options.buckets.contains(&name) {
                info!(bucket = %name, "deleting stale cache bucket");
                if self.storage.delete_bucket(&name)? {
                    removed += 1;
                }
            }
        }
        self.lifecycle = Lifecycle::Activated;
        info!(removed, "cache worker activated");
        Ok(removed)
    }

    pub fn on_message(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::SkipWaiting => {
                self.skip_waiting = true;
                if self.lifecycle != Lifecycle::Installed {
                    return;
                }
                if let Err(e) = self.activate() {
                    warn!(error = %e, "skip-waiting activation failed");
                }
            }
        }
    }

    pub fn handle_fetch(&mut self, request: &Request) -> FetchOutcome {
        if self.lifecycle != Lifecycle::Activated
            || !request.is_get()
            || !request.same_origin(&self.options.origin)
        {
            return FetchOutcome::Passthrough;
        }
        self.background.retain(|h| !h.is_finished());

        let class = request.class();
        debug!(url = %request.url, ?class, "intercepted");
        let response = match class {
            AssetClass::Audio => self.network_first_audio(request),
            AssetClass::Image => {
                let bucket = self.options.buckets.image.clone();
                self.cache_first(request, &bucket)
            }
            AssetClass::Navigation => self.network_first_page(request),
            AssetClass::Other => {
                let bucket = self.options.buckets.general.clone();
                self.cache_first(request, &bucket)
            }
        };
        FetchOutcome::Respond(response)
    }

    fn network_first_audio(&self, request: &Request) -> Response {
        let bucket = &self.options.buckets.audio;
        match self.fetcher.fetch(request) {
            Ok(response) => {
                if response.ok() {
                    let stored = response.clone().with_header("Cache-Control", IMMUTABLE);
                    self.store(bucket, request.key(), &stored);
                }
                response
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "audio fetch failed, trying cache");
                self.storage
                    .match_in(bucket, request.key())
                    .unwrap_or_else(Response::network_error)
            }
        }
    }

    fn network_first_page(&self, request: &Request) -> Response {
        let bucket = &self.options.buckets.general;
        match self.fetcher.fetch(request) {
            Ok(response) => {
                if response.ok() {
                    self.store(bucket, request.key(), &response);
                }
                response
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "navigation failed, trying cache");
                self.storage
                    .match_in(bucket, request.key())
                    .or_else(|| {
                        let offline = resolve(&self.options.origin, &self.options.offline_page).ok()?;
                        self.storage.match_in(bucket, offline.as_str())
                    })
                    .unwrap_or_else(Response::network_error)
            }
        }
    }

    /// Serve a hit immediately and refresh it in the background; block on the
    /// network only for a miss.
    fn cache_first(&mut self, request: &Request, bucket: &str) -> Response {
        if let Some(hit) = self.storage.match_in(bucket, request.key()) {
            self.revalidate(request.clone(), bucket.to_string());
            return hit;
        }
        match self.fetcher.fetch(request) {
            Ok(response) => {
                if response.ok() {
                    self.store(bucket, request.key(), &response);
                }
                response
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "fetch failed with nothing cached");
                Response::network_error()
            }
        }
    }

    fn revalidate(&mut self, request: Request, bucket: String) {
        let fetcher = self.fetcher.clone();
        let storage = self.storage.clone();
        let spawned = thread::Builder::new()
            .name("cache-revalidate".into())
            .spawn(move || match fetcher.fetch(&request) {
                Ok(response) if response.ok() => {
                    if let Err(e) = storage.put(&bucket, request.key(), &response) {
                        warn!(url = %request.url, error = %e, "failed to store revalidated response");
                    }
                }
                Ok(response) => {
                    debug!(url = %request.url, status = response.status, "revalidation not stored");
                }
                Err(e) => debug!(url = %request.url, error = %e, "revalidation failed"),
            });
        match spawned {
            Ok(handle) => self.background.push(handle),
            Err(e) => warn!(error = %e, "could not spawn revalidation thread"),
        }
    }

    /// Block until every background refresh started so far has finished.
    pub fn wait_background(&mut self) {
        for handle in self.background.drain(..) {
            let _ = handle.join();
        }
    }

    fn store(&self, bucket: &str, key: &str, response: &Response) {
        if let Err(e) = self.storage.put(bucket, key, response) {
            warn!(bucket, key, error = %e, "failed to cache response");
        }
    }
}

pub fn resolve(origin: &Url, path: &str) -> Result<Url, CacheError> {
    origin.join(path).map_err(|e| CacheError::BadUrl {
        url: path.to_string(),
        reason: e.to_string(),
    })
}
