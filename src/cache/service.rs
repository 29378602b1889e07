use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, warn};

use super::fetch::{FetchError, Fetcher};
use super::request::{Request, Response};
use super::worker::{CacheWorker, FetchOutcome, WorkerMessage};

enum CacheCmd {
    Fetch {
        request: Request,
        reply: Sender<FetchOutcome>,
    },
    Message(WorkerMessage),
    Shutdown,
}

/// Handle to the cache service thread. Cloneable; every clone talks to the
/// same worker.
#[derive(Clone)]
pub struct CacheClient {
    tx: Sender<CacheCmd>,
    fetcher: Arc<dyn Fetcher>,
}

impl CacheClient {
    /// Fetch through the worker. Requests it declines, or any request once
    /// the service is gone, go straight to the network.
    pub fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let (reply, rx) = mpsc::channel();
        let sent = self.tx.send(CacheCmd::Fetch {
            request: request.clone(),
            reply,
        });
        let outcome = match sent {
            Ok(()) => rx.recv().unwrap_or(FetchOutcome::Passthrough),
            Err(_) => FetchOutcome::Passthrough,
        };
        match outcome {
            FetchOutcome::Respond(response) => Ok(response),
            FetchOutcome::Passthrough => {
                debug!(url = %request.url, "passthrough");
                self.fetcher.fetch(request)
            }
        }
    }

    pub fn post_message(&self, message: WorkerMessage) {
        if self.tx.send(CacheCmd::Message(message)).is_err() {
            warn!("cache service is not running");
        }
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(CacheCmd::Shutdown);
    }
}

impl fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheClient").finish_non_exhaustive()
    }
}

/// Run `worker` on its own thread: install, then serve requests until every
/// client is dropped or `shutdown` is called.
pub fn spawn_cache_service(
    worker: CacheWorker,
    fetcher: Arc<dyn Fetcher>,
) -> std::io::Result<(CacheClient, JoinHandle<()>)> {
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("cache-worker".into())
        .spawn(move || run(worker, rx))?;
    Ok((CacheClient { tx, fetcher }, handle))
}

fn run(mut worker: CacheWorker, rx: Receiver<CacheCmd>) {
    if let Err(e) = worker.install() {
        error!(error = %e, "cache worker failed to install; requests go to the network");
    }

    while let Ok(cmd) = rx.recv() {
        match cmd {
            CacheCmd::Fetch { request, reply } => {
                let outcome = worker.handle_fetch(&request);
                let _ = reply.send(outcome);
            }
            CacheCmd::Message(message) => worker.on_message(message),
            CacheCmd::Shutdown => break,
        }
    }
    worker.wait_background();
    debug!("cache service stopped");
}
