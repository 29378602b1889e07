//! Engine-facing types: playback phases, commands, events and snapshots.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::catalogue::Track;

/// Lifecycle of the current playback session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// A track is selected but its source was never loaded.
    #[default]
    Idle,
    /// The media primitive is fetching/decoding the source.
    Loading,
    /// Metadata is known; nothing is playing yet.
    Ready,
    Playing,
    Paused,
    /// The track reached its natural end.
    Ended,
    /// Loading or decoding failed. Only a new user action leaves this state.
    Errored,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Playback state owned by the engine. Positions are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub track_id: String,
    pub playing: bool,
    pub position: f64,
    /// Authoritative duration from the loaded media; the catalogue value
    /// until metadata arrives.
    pub duration: f64,
    pub volume: f32,
    pub muted: bool,
    pub shuffle: bool,
    pub repeat: bool,
    pub buffering: bool,
}

/// What the media primitive reports back, mirroring the browser media events.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    LoadedMetadata { duration: f64 },
    TimeUpdate { position: f64 },
    Waiting,
    Playing,
    CanPlayThrough,
    Ended,
    Error(MediaError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MediaError {
    #[error("no audio output available: {0}")]
    NoOutput(String),
    #[error("playback was rejected: {0}")]
    Rejected(String),
    #[error("failed to fetch {src}: {reason}")]
    Network { src: String, reason: String },
    #[error("failed to decode {src}: {reason}")]
    Decode { src: String, reason: String },
    #[error("no source loaded")]
    NoSource,
}

/// Commands accepted by the player service thread.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCmd {
    PlayTrack(String),
    TogglePlay,
    Play,
    Pause,
    Change(Direction),
    ToggleShuffle,
    ToggleRepeat,
    AddToQueue(String),
    ShuffleAll,
    Seek(f64),
    SeekBy(f64),
    SetVolume(f32),
    ToggleMute,
    Quit,
}

/// Notifications broadcast to every subscribed surface.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The current track or its playing flag changed.
    TrackChanged { track_id: String, is_playing: bool },
    /// Any part of the snapshot changed.
    StateChanged,
    /// Transient user-facing message ("Added ... to queue", playback errors).
    Notice(String),
}

/// View-model read by display surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub track: Track,
    pub phase: Phase,
    pub state: PlaybackState,
    pub queue: Vec<Track>,
}

pub type SnapshotHandle = Arc<Mutex<PlaybackSnapshot>>;
