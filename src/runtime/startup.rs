use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use reqwest::Url;
use tracing::{info, warn};

use crate::audio::{CachedLoader, RodioElement, SourceLoader};
use crate::cache::{
    BucketNames, CacheClient, CacheStorage, CacheWorker, Fetcher, HttpFetcher, OnlineStatus, WorkerOptions,
    spawn_cache_service,
};
use crate::catalogue::{Catalogue, CatalogueError};
use crate::config::{self, Settings};
use crate::engine::{EngineOptions, MediaElement};
use crate::player::PlayerService;
use crate::prefs::PrefsStore;
use crate::publisher;

const PREFS_FILE: &str = "prefs.json";

/// Everything the event loop needs, started in dependency order.
pub struct Services {
    pub catalogue: Arc<Catalogue>,
    pub player: PlayerService,
    pub prefs: PrefsStore,
    pub cache: CacheClient,
    cache_thread: Option<JoinHandle<()>>,
}

impl Services {
    /// Stop the player first so no load is in flight, then the cache.
    pub fn shutdown(&mut self) {
        self.player.shutdown();
        self.cache.shutdown();
        if let Some(thread) = self.cache_thread.take() {
            let _ = thread.join();
        }
    }
}

pub fn start(settings: &Settings) -> Result<Services, Box<dyn Error>> {
    let catalogue = Arc::new(load_catalogue(settings)?);
    info!(tracks = catalogue.len(), videos = catalogue.videos().len(), "catalogue loaded");

    let origin = Url::parse(&settings.cache.origin)?;
    let online = OnlineStatus::default();
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(
        Duration::from_millis(settings.cache.request_timeout_ms),
        online.clone(),
    )?);

    let worker = CacheWorker::new(worker_options(settings, &origin), open_storage(settings), fetcher.clone());
    let (cache, cache_thread) = spawn_cache_service(worker, fetcher)?;

    let loader: Arc<dyn SourceLoader> = Arc::new(CachedLoader::new(cache.clone(), origin.clone()));
    let media = move || RodioElement::new(loader).map(|e| Box::new(e) as Box<dyn MediaElement>);
    let session = settings.media_session.clone();
    let player = PlayerService::spawn(catalogue.clone(), engine_options(settings), online, media, |handle| {
        publisher::negotiate(&session, &origin, handle)
    })?;

    Ok(Services {
        catalogue,
        player,
        prefs: open_prefs(settings),
        cache,
        cache_thread: Some(cache_thread),
    })
}

pub fn load_catalogue(settings: &Settings) -> Result<Catalogue, CatalogueError> {
    match &settings.catalogue.path {
        Some(path) => Catalogue::load(Path::new(path)),
        None => Catalogue::bundled(),
    }
}

pub fn engine_options(settings: &Settings) -> EngineOptions {
    let p = &settings.player;
    EngineOptions {
        volume: p.volume,
        shuffle: p.shuffle,
        repeat: p.repeat,
        default_track: p.default_track.clone(),
        retry_delay: Duration::from_millis(p.retry_delay_ms),
        seed: None,
    }
}

pub fn worker_options(settings: &Settings, origin: &Url) -> WorkerOptions {
    let c = &settings.cache;
    WorkerOptions {
        origin: origin.clone(),
        buckets: BucketNames::new(&c.bucket_prefix, &c.version),
        precache: c.precache.clone(),
        offline_page: c.offline_page.clone(),
        skip_waiting: c.skip_waiting,
    }
}

/// Disk-backed when a cache dir is configured; falls back to memory when it
/// cannot be opened.
fn open_storage(settings: &Settings) -> CacheStorage {
    let Some(dir) = &settings.cache.dir else {
        return CacheStorage::in_memory();
    };
    match CacheStorage::open(Path::new(dir)) {
        Ok(storage) => storage,
        Err(e) => {
            warn!(dir = %dir, error = %e, "cache dir unusable, caching in memory only");
            CacheStorage::in_memory()
        }
    }
}

pub fn prefs_path(settings: &Settings) -> Option<PathBuf> {
    match &settings.storage.path {
        Some(path) => Some(PathBuf::from(path)),
        None => config::default_data_dir().map(|d| d.join(PREFS_FILE)),
    }
}

fn open_prefs(settings: &Settings) -> PrefsStore {
    match prefs_path(settings) {
        Some(path) => PrefsStore::open(&path),
        None => {
            warn!("no data directory, preferences will not persist");
            PrefsStore::in_memory()
        }
    }
}
