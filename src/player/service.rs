use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::cache::OnlineStatus;
use crate::catalogue::Catalogue;
use crate::engine::{Engine, EngineOptions, MediaElement, MediaError, NullElement, PlayerCmd};
use crate::publisher::{NowPlayingPublisher, NullPublisher};

use super::PlayerError;
use super::handle::PlayerHandle;

/// How often the player thread drains media events when no command arrives.
const TICK: Duration = Duration::from_millis(50);

pub struct PlayerService {
    handle: PlayerHandle,
    thread: Option<JoinHandle<()>>,
}

impl PlayerService {
    /// Start the player thread.
    ///
    /// `media` runs on the player thread, so the element never has to be
    /// `Send`; if it fails every play is rejected with its error. `publisher`
    /// runs on the caller's thread once the handle exists.
    pub fn spawn<F, P>(
        catalogue: Arc<Catalogue>,
        options: EngineOptions,
        online: OnlineStatus,
        media: F,
        publisher: P,
    ) -> Result<Self, PlayerError>
    where
        F: FnOnce() -> Result<Box<dyn MediaElement>, MediaError> + Send + 'static,
        P: FnOnce(PlayerHandle) -> Box<dyn NowPlayingPublisher>,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let (publisher_tx, publisher_rx) = mpsc::channel::<Box<dyn NowPlayingPublisher>>();

        let thread = thread::Builder::new().name("player".into()).spawn(move || {
            let media = media().unwrap_or_else(|e| {
                warn!(error = %e, "audio output unavailable");
                Box::new(NullElement::new(e.to_string()))
            });
            let mut engine = Engine::new(catalogue, media, Box::new(NullPublisher), online, options);
            if ready_tx
                .send((engine.snapshot_handle(), engine.broadcaster()))
                .is_err()
            {
                return;
            }
            if let Ok(p) = publisher_rx.recv() {
                engine.set_publisher(p);
            }
            run(engine, cmd_rx);
        })?;

        let (snapshot, broadcaster) = ready_rx.recv().map_err(|_| PlayerError::Startup)?;
        let handle = PlayerHandle::new(cmd_tx, snapshot, broadcaster);
        if publisher_tx.send(publisher(handle.clone())).is_err() {
            return Err(PlayerError::Startup);
        }
        info!("player service started");

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> PlayerHandle {
        self.handle.clone()
    }

    /// Stop playback and wait for the player thread to exit.
    pub fn shutdown(&mut self) {
        self.handle.send(PlayerCmd::Quit);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("player thread panicked");
            }
        }
    }
}

impl Drop for PlayerService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<M: MediaElement>(mut engine: Engine<M>, rx: Receiver<PlayerCmd>) {
    loop {
        match rx.recv_timeout(TICK) {
            Ok(cmd) => {
                debug!(?cmd, "player command");
                if !engine.handle(cmd) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        engine.pump(Instant::now());
    }
    debug!("player thread stopped");
}
