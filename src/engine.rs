//! The playback engine: one state machine owning one media primitive.

mod broadcast;
mod core;
mod media;
mod queue;
mod types;

pub use broadcast::Broadcaster;
pub use core::{Engine, EngineOptions};
pub use media::{MediaElement, NullElement};
pub use types::{
    Direction, MediaError, MediaEvent, Phase, PlaybackSnapshot, PlaybackState, PlayerCmd,
    PlayerEvent, SnapshotHandle,
};
