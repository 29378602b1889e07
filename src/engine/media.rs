//! The media primitive seam.
//!
//! The engine drives exactly one `MediaElement`. Implementations report
//! progress through `take_events`, which the engine drains on every turn.

use super::types::{MediaError, MediaEvent};

pub trait MediaElement {
    /// Point the element at a new source. Any pending load of the previous
    /// source is abandoned.
    fn load(&mut self, src: &str);

    /// Start (or resume) playback. An `Err` is the equivalent of a rejected
    /// play promise.
    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    /// Reposition to `position` seconds.
    fn seek(&mut self, position: f64);

    /// Effective output volume, already accounting for mute.
    fn set_volume(&mut self, volume: f32);

    /// Events produced since the last call, oldest first.
    fn take_events(&mut self) -> Vec<MediaEvent>;
}

impl<M: MediaElement + ?Sized> MediaElement for Box<M> {
    fn load(&mut self, src: &str) {
        (**self).load(src)
    }

    fn play(&mut self) -> Result<(), MediaError> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn seek(&mut self, position: f64) {
        (**self).seek(position)
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume)
    }

    fn take_events(&mut self) -> Vec<MediaEvent> {
        (**self).take_events()
    }
}

/// Stand-in used when no audio output can be opened: every play is rejected.
pub struct NullElement {
    reason: String,
}

impl NullElement {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl MediaElement for NullElement {
    fn load(&mut self, _src: &str) {}

    fn play(&mut self) -> Result<(), MediaError> {
        Err(MediaError::NoOutput(self.reason.clone()))
    }

    fn pause(&mut self) {}

    fn seek(&mut self, _position: f64) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn take_events(&mut self) -> Vec<MediaEvent> {
        Vec::new()
    }
}
