//! Media-session publishing: exposes now-playing metadata and transport
//! controls to the operating system.
//!
//! The implementation is chosen once at startup by [`negotiate`]; the engine
//! only ever talks to the [`NowPlayingPublisher`] trait.

mod mpris;

use reqwest::Url;
use tracing::{info, warn};

use crate::catalogue::Track;
use crate::config::MediaSessionSettings;
use crate::player::PlayerHandle;

pub use mpris::MprisPublisher;

/// Square artwork sizes offered for the current cover.
const ARTWORK_SIZES: [&str; 6] = ["96x96", "128x128", "192x192", "256x256", "384x384", "512x512"];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    pub src: String,
    pub sizes: &'static str,
    pub mime: &'static str,
}

/// Metadata describing the current track for OS-level media controls.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub track_id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub artwork: Vec<Artwork>,
    /// Seconds; zero while unknown.
    pub duration: f64,
}

impl NowPlaying {
    pub fn from_track(track: &Track, duration: f64) -> Self {
        let artwork = if track.cover_url.trim().is_empty() {
            vec![Artwork {
                src: track.cover_or_placeholder().to_string(),
                sizes: "512x512",
                mime: "image/svg+xml",
            }]
        } else {
            ARTWORK_SIZES
                .iter()
                .map(|&sizes| Artwork {
                    src: track.cover_url.clone(),
                    sizes,
                    mime: "image/jpeg",
                })
                .collect()
        };

        Self {
            track_id: track.id.clone(),
            title: track.title.clone(),
            artists: track.artists().map(str::to_string).collect(),
            album: track.album.clone(),
            artwork,
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
        }
    }

    /// Largest artwork entry, used by publishers that take a single image.
    pub fn best_artwork(&self) -> Option<&Artwork> {
        self.artwork.last()
    }
}

/// Receives now-playing updates from the engine.
pub trait NowPlayingPublisher: Send {
    fn set_metadata(&self, now: &NowPlaying);
    fn set_status(&self, status: PlaybackStatus);
    fn set_position(&self, position: f64);
    fn set_volume(&self, _volume: f32) {}
}

/// Used when no media session is available.
pub struct NullPublisher;

impl NowPlayingPublisher for NullPublisher {
    fn set_metadata(&self, _now: &NowPlaying) {}
    fn set_status(&self, _status: PlaybackStatus) {}
    fn set_position(&self, _position: f64) {}
}

/// Pick the media-session publisher for this process.
pub fn negotiate(
    settings: &MediaSessionSettings,
    origin: &Url,
    controls: PlayerHandle,
) -> Box<dyn NowPlayingPublisher> {
    if !settings.enabled {
        info!("media session disabled by config");
        return Box::new(NullPublisher);
    }
    match MprisPublisher::connect(&settings.bus_name, origin.clone(), controls) {
        Ok(p) => {
            info!(bus_name = %settings.bus_name, "media session published over MPRIS");
            Box::new(p)
        }
        Err(e) => {
            warn!(error = %e, "media session unavailable, continuing without it");
            Box::new(NullPublisher)
        }
    }
}
