use super::*;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const ORIGIN: &str = "http://localhost:3000";

/// Serves canned bodies for known URLs; unknown URLs are 404s.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl FakeFetcher {
    pub(crate) fn serving(paths: &[(&str, &str)]) -> Arc<Self> {
        let f = Self::default();
        for (path, body) in paths {
            f.set(path, body);
        }
        Arc::new(f)
    }

    pub(crate) fn set(&self, path: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url(path).to_string(), body.as_bytes().to_vec());
    }

    pub(crate) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub(crate) fn calls_for(&self, path: &str) -> usize {
        let key = url(path).to_string();
        self.calls.lock().unwrap().iter().filter(|c| **c == key).count()
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.lock().unwrap().push(request.key().to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Unreachable("offline".into()));
        }
        Ok(match self.bodies.lock().unwrap().get(request.key()) {
            Some(body) => Response::new(200, body.clone()),
            None => Response::text(404, "not found"),
        })
    }
}

fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

fn shell() -> Vec<(&'static str, &'static str)> {
    vec![
        ("/", "<html>home</html>"),
        ("/index.html", "<html>home</html>"),
        ("/offline.html", "<html>offline</html>"),
        ("/manifest.json", "{}"),
        ("/app.webmanifest", "{}"),
    ]
}

fn options() -> WorkerOptions {
    WorkerOptions {
        origin: Url::parse(ORIGIN).unwrap(),
        buckets: BucketNames::new("lebronify", "v1"),
        precache: shell().into_iter().map(|(p, _)| p.to_string()).collect(),
        offline_page: "/offline.html".into(),
        skip_waiting: true,
    }
}

fn activated(fetcher: Arc<FakeFetcher>) -> CacheWorker {
    let mut worker = CacheWorker::new(options(), CacheStorage::in_memory(), fetcher);
    worker.install().unwrap();
    assert_eq!(worker.lifecycle(), Lifecycle::Activated);
    worker
}

fn respond(worker: &mut CacheWorker, request: &Request) -> Response {
    match worker.handle_fetch(request) {
        FetchOutcome::Respond(r) => r,
        FetchOutcome::Passthrough => panic!("expected the worker to respond to {}", request.url),
    }
}

#[test]
fn classifies_by_extension_then_accept_header() {
    assert_eq!(Request::get(url("/audio/a.MP3")).class(), AssetClass::Audio);
    assert_eq!(Request::get(url("/audio/a.opus?v=2")).class(), AssetClass::Audio);
    assert_eq!(Request::get(url("/img/cover.webp")).class(), AssetClass::Image);
    assert_eq!(Request::navigate(url("/album/lbj")).class(), AssetClass::Navigation);
    assert_eq!(Request::navigate(url("/cover.png")).class(), AssetClass::Image);
    assert_eq!(Request::get(url("/app.js")).class(), AssetClass::Other);
    assert_eq!(Request::get(url("/")).class(), AssetClass::Other);
}

#[test]
fn bucket_names_are_versioned() {
    let b = BucketNames::new("lebronify", "v1");
    assert_eq!(b.general, "lebronify-cache-v1");
    assert_eq!(b.audio, "lebronify-audio-cache-v1");
    assert_eq!(b.image, "lebronify-image-cache-v1");
    assert!(b.contains("lebronify-image-cache-v1"));
    assert!(!b.contains("lebronify-cache-v0"));
}

#[test]
fn install_precaches_shell_and_activation_drops_stale_buckets() {
    let storage = CacheStorage::in_memory();
    storage
        .put("lebronify-cache-v0", "http://localhost:3000/", &Response::new(200, "old"))
        .unwrap();
    storage
        .put("unrelated", "k", &Response::new(200, "x"))
        .unwrap();

    let mut worker = CacheWorker::new(options(), storage.clone(), FakeFetcher::serving(&shell()));
    worker.install().unwrap();

    assert_eq!(worker.lifecycle(), Lifecycle::Activated);
    assert_eq!(storage.bucket_names(), vec!["lebronify-cache-v1".to_string()]);
    assert_eq!(storage.keys("lebronify-cache-v1").len(), 5);
}

#[test]
fn install_is_all_or_nothing() {
    let mut paths = shell();
    paths.retain(|(p, _)| *p != "/manifest.json");
    let storage = CacheStorage::in_memory();
    let mut worker = CacheWorker::new(options(), storage.clone(), FakeFetcher::serving(&paths));

    let err = worker.install().unwrap_err();

    assert!(matches!(err, CacheError::Precache { ref path, .. } if path == "/manifest.json"));
    assert_eq!(worker.lifecycle(), Lifecycle::Redundant);
    assert!(storage.bucket_names().is_empty());
    assert_eq!(worker.handle_fetch(&Request::get(url("/app.js"))), FetchOutcome::Passthrough);
}

#[test]
fn waiting_worker_activates_on_skip_waiting_message() {
    let mut opts = options();
    opts.skip_waiting = false;
    let mut worker = CacheWorker::new(opts, CacheStorage::in_memory(), FakeFetcher::serving(&shell()));
    worker.install().unwrap();
    assert_eq!(worker.lifecycle(), Lifecycle::Installed);
    assert_eq!(worker.handle_fetch(&Request::get(url("/app.js"))), FetchOutcome::Passthrough);

    worker.on_message(WorkerMessage::SkipWaiting);
    assert_eq!(worker.lifecycle(), Lifecycle::Activated);
}

#[test]
fn stored_cache_keeps_serving_after_an_offline_restart() {
    let dir = tempfile::tempdir().unwrap();
    let song = Request::get(url("/audio/sunshine.mp3"));

    let online = FakeFetcher::serving(&shell());
    online.set("/audio/sunshine.mp3", "ID3-bytes");
    let mut first = CacheWorker::new(options(), CacheStorage::open(dir.path()).unwrap(), online);
    first.install().unwrap();
    assert_eq!(respond(&mut first, &song).body, b"ID3-bytes");
    drop(first);

    let offline = FakeFetcher::serving(&shell());
    offline.go_offline();
    let mut opts = options();
    opts.skip_waiting = false;
    let mut second = CacheWorker::new(opts, CacheStorage::open(dir.path()).unwrap(), offline);

    second.install().unwrap();
    assert_eq!(second.lifecycle(), Lifecycle::Activated);
    assert_eq!(respond(&mut second, &song).body, b"ID3-bytes");
    let page = respond(&mut second, &Request::navigate(url("/album/lbj")));
    assert_eq!(page.body, b"<html>offline</html>");
}

#[test]
fn non_get_and_cross_origin_requests_pass_through() {
    let mut worker = activated(FakeFetcher::serving(&shell()));
    let post = Request::get(url("/api/like")).with_method("post");
    let foreign = Request::get(Url::parse("https://cdn.example.com/a.mp3").unwrap());
    assert_eq!(worker.handle_fetch(&post), FetchOutcome::Passthrough);
    assert_eq!(worker.handle_fetch(&foreign), FetchOutcome::Passthrough);
}

#[test]
fn offline_audio_is_served_from_cache() {
    let fetcher = FakeFetcher::serving(&shell());
    fetcher.set("/audio/sunshine.mp3", "ID3-bytes");
    let mut worker = activated(fetcher.clone());
    let req = Request::get(url("/audio/sunshine.mp3"));

    let online = respond(&mut worker, &req);
    assert_eq!(online.body, b"ID3-bytes");
    let stored = worker
        .storage()
        .match_in("lebronify-audio-cache-v1", req.key())
        .unwrap();
    assert_eq!(stored.header("cache-control"), Some("public, max-age=31536000, immutable"));

    fetcher.go_offline();
    let offline = respond(&mut worker, &req);
    assert_eq!(offline.status, 200);
    assert_eq!(offline.body, b"ID3-bytes");
}

#[test]
fn offline_audio_without_cache_is_an_error_response() {
    let fetcher = FakeFetcher::serving(&shell());
    let mut worker = activated(fetcher.clone());
    fetcher.go_offline();

    let r = respond(&mut worker, &Request::get(url("/audio/never.mp3")));
    assert_eq!(r.status, 408);
    assert_eq!(r.body, b"Network error occurred");
}

#[test]
fn image_second_fetch_hits_cache_and_revalidates_once() {
    let fetcher = FakeFetcher::serving(&shell());
    fetcher.set("/covers/lbj.jpg", "jpeg-v1");
    let mut worker = activated(fetcher.clone());
    let req = Request::get(url("/covers/lbj.jpg"));

    let first = respond(&mut worker, &req);
    assert_eq!(first.body, b"jpeg-v1");
    assert_eq!(fetcher.calls_for("/covers/lbj.jpg"), 1);
    assert!(worker.storage().match_in("lebronify-image-cache-v1", req.key()).is_some());

    fetcher.set("/covers/lbj.jpg", "jpeg-v2");
    let second = respond(&mut worker, &req);
    assert_eq!(second.body, b"jpeg-v1");
    worker.wait_background();

    assert_eq!(fetcher.calls_for("/covers/lbj.jpg"), 2);
    let refreshed = worker
        .storage()
        .match_in("lebronify-image-cache-v1", req.key())
        .unwrap();
    assert_eq!(refreshed.body, b"jpeg-v2");
}

#[test]
fn failed_responses_are_not_cached() {
    let fetcher = FakeFetcher::serving(&shell());
    let mut worker = activated(fetcher.clone());
    let req = Request::get(url("/covers/missing.png"));

    assert_eq!(respond(&mut worker, &req).status, 404);
    assert!(worker.storage().match_in("lebronify-image-cache-v1", req.key()).is_none());
}

#[test]
fn navigation_falls_back_to_cache_then_offline_page() {
    let fetcher = FakeFetcher::serving(&shell());
    fetcher.set("/album/lbj", "<html>LBJ</html>");
    let mut worker = activated(fetcher.clone());

    assert_eq!(respond(&mut worker, &Request::navigate(url("/album/lbj"))).body, b"<html>LBJ</html>");

    fetcher.go_offline();
    let cached = respond(&mut worker, &Request::navigate(url("/album/lbj")));
    assert_eq!(cached.body, b"<html>LBJ</html>");
    let fallback = respond(&mut worker, &Request::navigate(url("/artist/nobody")));
    assert_eq!(fallback.body, b"<html>offline</html>");
}

#[test]
fn other_assets_are_stale_while_revalidate() {
    let fetcher = FakeFetcher::serving(&shell());
    fetcher.set("/app.js", "v1");
    let mut worker = activated(fetcher.clone());
    let req = Request::get(url("/app.js"));

    assert_eq!(respond(&mut worker, &req).body, b"v1");
    fetcher.set("/app.js", "v2");
    assert_eq!(respond(&mut worker, &req).body, b"v1");
    worker.wait_background();
    assert_eq!(respond(&mut worker, &req).body, b"v2");
    worker.wait_background();

    fetcher.go_offline();
    assert_eq!(respond(&mut worker, &req).body, b"v2");
    let miss = respond(&mut worker, &Request::get(url("/chunk-9.js")));
    assert_eq!(miss.status, 408);
    assert_eq!(miss.header("content-type"), Some("text/plain"));
}

#[test]
fn disk_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let storage = CacheStorage::open(dir.path()).unwrap();
    let response = Response::new(200, "bytes").with_header("Content-Type", "audio/mpeg");
    storage.put("lebronify-audio-cache-v1", "http://x/a.mp3", &response).unwrap();

    let reopened = CacheStorage::open(dir.path()).unwrap();
    assert_eq!(
        reopened.match_in("lebronify-audio-cache-v1", "http://x/a.mp3"),
        Some(response)
    );
    assert!(reopened.has_bucket("lebronify-audio-cache-v1"));

    assert!(reopened.delete_bucket("lebronify-audio-cache-v1").unwrap());
    assert!(!dir.path().join("lebronify-audio-cache-v1").exists());
    assert!(CacheStorage::open(dir.path()).unwrap().bucket_names().is_empty());
}

#[test]
fn client_routes_through_service_thread() {
    let fetcher = FakeFetcher::serving(&shell());
    fetcher.set("/covers/lbj.jpg", "jpeg");
    let worker = CacheWorker::new(options(), CacheStorage::in_memory(), fetcher.clone());
    let (client, handle) = spawn_cache_service(worker, fetcher.clone()).unwrap();

    let r = client.fetch(&Request::get(url("/covers/lbj.jpg"))).unwrap();
    assert_eq!(r.body, b"jpeg");

    let foreign = Request::get(Url::parse("https://cdn.example.com/x.js").unwrap());
    assert_eq!(client.fetch(&foreign).unwrap().status, 404);

    client.shutdown();
    handle.join().unwrap();
    fetcher.go_offline();
    assert!(client.fetch(&Request::get(url("/covers/lbj.jpg"))).is_err());
}

#[test]
fn skip_waiting_sent_through_client_activates_the_worker() {
    let fetcher = FakeFetcher::serving(&shell());
    fetcher.set("/covers/lbj.jpg", "jpeg");
    let storage = CacheStorage::in_memory();
    let mut opts = options();
    opts.skip_waiting = false;
    let worker = CacheWorker::new(opts, storage.clone(), fetcher.clone());
    let (client, handle) = spawn_cache_service(worker, fetcher.clone()).unwrap();
    let cover = Request::get(url("/covers/lbj.jpg"));

    // Waiting: served straight from the network and not stored.
    assert_eq!(client.fetch(&cover).unwrap().body, b"jpeg");
    assert!(storage.match_in("lebronify-image-cache-v1", cover.key()).is_none());

    client.post_message(WorkerMessage::SkipWaiting);
    assert_eq!(client.fetch(&cover).unwrap().body, b"jpeg");
    assert!(storage.match_in("lebronify-image-cache-v1", cover.key()).is_some());

    client.shutdown();
    handle.join().unwrap();
}

#[test]
fn online_status_is_shared_between_clones() {
    let a = OnlineStatus::new(true);
    let b = a.clone();
    b.set(false);
    assert!(!a.is_online());
}
