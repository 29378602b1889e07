use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use async_io::{Timer, block_on};
use reqwest::Url;
use tracing::{debug, warn};
use zbus::object_server::InterfaceRef;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::engine::Direction;
use crate::player::{PlayerControls, PlayerHandle};

use super::{NowPlaying, NowPlayingPublisher, PlaybackStatus};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const TRACK_PATH_PREFIX: &str = "/org/lebronify/track/";
/// How often pending property changes are flushed as D-Bus signals.
const FLUSH_EVERY: Duration = Duration::from_millis(250);

#[derive(Debug, Default)]
struct SharedState {
    status: PlaybackStatus,
    track_id: Option<OwnedObjectPath>,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    position_micros: i64,
    volume: f64,
}

/// Publishes now-playing state on the session bus as an MPRIS player.
pub struct MprisPublisher {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
    origin: Url,
}

impl MprisPublisher {
    /// Claim `org.mpris.MediaPlayer2.<bus_name>` and serve it from a
    /// background thread. Fails when no session bus is reachable.
    pub fn connect(bus_name: &str, origin: Url, controls: PlayerHandle) -> zbus::Result<Self> {
        let state = Arc::new(Mutex::new(SharedState::default()));
        let (notify_tx, notify_rx) = mpsc::channel();

        let well_known = format!("org.mpris.MediaPlayer2.{bus_name}");
        let connection = block_on(register(&well_known, controls, state.clone()))?;

        thread::Builder::new()
            .name("mpris".into())
            .spawn(move || block_on(flush_loop(connection, notify_rx)))?;

        Ok(Self {
            state,
            notify: notify_tx,
            origin,
        })
    }

    fn update(&self, f: impl FnOnce(&mut SharedState)) {
        if let Ok(mut s) = self.state.lock() {
            f(&mut s);
        }
    }
}

impl NowPlayingPublisher for MprisPublisher {
    fn set_metadata(&self, now: &NowPlaying) {
        let art_url = now
            .best_artwork()
            .and_then(|a| self.origin.join(&a.src).ok())
            .map(|u| u.to_string());
        self.update(|s| {
            s.track_id = track_object_path(&now.track_id);
            s.title = Some(now.title.clone());
            s.artist = now.artists.clone();
            s.album = Some(now.album.clone());
            s.art_url = art_url;
            s.length_micros = (now.duration > 0.0).then(|| (now.duration * 1_000_000.0) as i64);
            s.position_micros = 0;
        });
        let _ = self.notify.send(());
    }

    fn set_status(&self, status: PlaybackStatus) {
        self.update(|s| s.status = status);
        let _ = self.notify.send(());
    }

    // Position is polled by clients, never signalled.
    fn set_position(&self, position: f64) {
        self.update(|s| s.position_micros = (position.max(0.0) * 1_000_000.0) as i64);
    }

    fn set_volume(&self, volume: f32) {
        self.update(|s| s.volume = f64::from(volume));
    }
}

fn track_object_path(id: &str) -> Option<OwnedObjectPath> {
    let element: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    ObjectPath::try_from(format!("{TRACK_PATH_PREFIX}{element}"))
        .ok()
        .map(OwnedObjectPath::from)
}

async fn register(
    well_known: &str,
    controls: PlayerHandle,
    state: Arc<Mutex<SharedState>>,
) -> zbus::Result<Connection> {
    let connection = Connection::session().await?;
    connection.request_name(well_known).await?;

    let server = connection.object_server();
    server.at(OBJECT_PATH, RootIface).await?;
    server.at(OBJECT_PATH, PlayerIface { controls, state }).await?;
    debug!(name = well_known, "MPRIS interfaces registered");
    Ok(connection)
}

async fn flush_loop(connection: Connection, notify: Receiver<()>) {
    let iface: InterfaceRef<PlayerIface> = match connection
        .object_server()
        .interface(OBJECT_PATH)
        .await
    {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "MPRIS player interface missing");
            return;
        }
    };

    loop {
        Timer::after(FLUSH_EVERY).await;
        let mut dirty = false;
        loop {
            match notify.try_recv() {
                Ok(()) => dirty = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }
        if !dirty {
            continue;
        }

        let player = iface.get().await;
        let emitter = iface.signal_emitter();
        if let Err(e) = player.metadata_changed(emitter).await {
            debug!(error = %e, "failed to signal metadata change");
        }
        if let Err(e) = player.playback_status_changed(emitter).await {
            debug!(error = %e, "failed to signal status change");
        }
    }
}

struct RootIface;

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {}

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "Lebronify"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    controls: PlayerHandle,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.controls.change_track(Direction::Next);
    }

    fn previous(&self) {
        self.controls.change_track(Direction::Prev);
    }

    fn play(&self) {
        self.controls.play();
    }

    fn pause(&self) {
        self.controls.pause();
    }

    fn play_pause(&self) {
        self.controls.toggle_play();
    }

    fn stop(&self) {
        self.controls.pause();
        self.controls.seek(0.0);
    }

    /// Relative seek, `offset` in microseconds.
    fn seek(&self, offset: i64) {
        self.controls.seek_by(offset as f64 / 1_000_000.0);
    }

    /// Ignored unless `track_id` is still the current track.
    fn set_position(&self, track_id: OwnedObjectPath, position: i64) {
        let current = self.state.lock().ok().and_then(|s| s.track_id.clone());
        if current.as_ref() == Some(&track_id) && position >= 0 {
            self.controls.seek(position as f64 / 1_000_000.0);
        }
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.state
            .lock()
            .map(|s| s.status.as_str())
            .unwrap_or("Stopped")
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state.lock().map(|s| s.volume).unwrap_or(0.0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Value<'_>| {
            if let Ok(v) = OwnedValue::try_from(value) {
                map.insert(key.to_string(), v);
            }
        };
        if let Some(id) = &s.track_id {
            put("mpris:trackid", Value::from(id.clone().into_inner()));
        }
        if let Some(title) = &s.title {
            put("xesam:title", Value::from(title.as_str()));
        }
        if !s.artist.is_empty() {
            put("xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(album) = &s.album {
            put("xesam:album", Value::from(album.as_str()));
        }
        if let Some(url) = &s.art_url {
            put("mpris:artUrl", Value::from(url.as_str()));
        }
        if let Some(len) = s.length_micros {
            put("mpris:length", Value::from(len));
        }
        map
    }
}
