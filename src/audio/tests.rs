use super::*;
use crate::cache::tests::FakeFetcher;
use crate::cache::{BucketNames, CacheStorage, CacheWorker, WorkerOptions, spawn_cache_service};
use crate::engine::MediaError;
use reqwest::Url;

fn loader(fetcher: std::sync::Arc<FakeFetcher>) -> CachedLoader {
    let origin = Url::parse("http://localhost:3000").unwrap();
    let options = WorkerOptions {
        origin: origin.clone(),
        buckets: BucketNames::new("lebronify", "test"),
        precache: Vec::new(),
        offline_page: "/offline.html".into(),
        skip_waiting: true,
    };
    let worker = CacheWorker::new(options, CacheStorage::in_memory(), fetcher.clone());
    let (client, _thread) = spawn_cache_service(worker, fetcher).unwrap();
    CachedLoader::new(client, origin)
}

#[test]
fn cached_loader_returns_body_and_survives_going_offline() {
    let fetcher = FakeFetcher::serving(&[("/audio/sunshine.mp3", "frames")]);
    let l = loader(fetcher.clone());

    assert_eq!(l.load("/audio/sunshine.mp3").unwrap(), b"frames");
    fetcher.go_offline();
    assert_eq!(l.load("/audio/sunshine.mp3").unwrap(), b"frames");
}

#[test]
fn cached_loader_maps_failures_to_media_errors() {
    let fetcher = FakeFetcher::serving(&[("/audio/silence.mp3", "")]);
    let l = loader(fetcher.clone());

    assert!(matches!(
        l.load("/audio/missing.mp3"),
        Err(MediaError::Network { reason, .. }) if reason == "status 404"
    ));
    assert!(matches!(l.load("/audio/silence.mp3"), Err(MediaError::Decode { .. })));

    fetcher.go_offline();
    assert!(matches!(
        l.load("/audio/never-cached.mp3"),
        Err(MediaError::Network { reason, .. }) if reason == "status 408"
    ));
}
