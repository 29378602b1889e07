use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::cache::OnlineStatus;
use crate::catalogue::{Catalogue, Track};
use crate::publisher::{NowPlaying, NowPlayingPublisher, PlaybackStatus};

use super::broadcast::Broadcaster;
use super::media::MediaElement;
use super::queue;
use super::types::{
    Direction, MediaEvent, Phase, PlaybackSnapshot, PlaybackState, PlayerCmd, PlayerEvent,
    SnapshotHandle,
};

/// Startup options for an [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub volume: f32,
    pub shuffle: bool,
    pub repeat: bool,
    pub default_track: Option<String>,
    pub retry_delay: Duration,
    /// Fixed RNG seed; random when `None`.
    pub seed: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            volume: 0.7,
            shuffle: false,
            repeat: false,
            default_track: None,
            retry_delay: Duration::from_millis(1000),
            seed: None,
        }
    }
}

#[derive(Debug, Default)]
struct Retry {
    attempted: bool,
    due: Option<Instant>,
    /// Playback was running when the source failed; restart it on reload.
    resume: bool,
}

/// Single source of truth for what is playing.
///
/// The engine owns the one media primitive and is driven by commands and
/// media events on a single thread. Every mutation ends in [`Engine::changed`],
/// which refreshes the shared snapshot, the media session and subscribers.
pub struct Engine<M: MediaElement> {
    catalogue: Arc<Catalogue>,
    media: M,
    publisher: Box<dyn NowPlayingPublisher>,
    online: OnlineStatus,
    broadcaster: Broadcaster,
    snapshot: SnapshotHandle,

    state: PlaybackState,
    phase: Phase,
    queue: VecDeque<String>,
    rng: StdRng,
    retry_delay: Duration,
    retry: Retry,

    announced: Option<(String, bool)>,
    published_track: Option<(String, f64)>,
    published_status: Option<PlaybackStatus>,
}

impl<M: MediaElement> Engine<M> {
    pub fn new(
        catalogue: Arc<Catalogue>,
        media: M,
        publisher: Box<dyn NowPlayingPublisher>,
        online: OnlineStatus,
        options: EngineOptions,
    ) -> Self {
        let track = options
            .default_track
            .as_deref()
            .and_then(|id| catalogue.track(id))
            .unwrap_or_else(|| catalogue.first())
            .clone();

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let queue = if options.shuffle {
            queue::shuffled(&catalogue, &track.id, &mut rng)
        } else {
            queue::sequential(&catalogue, &track.id)
        };

        let state = PlaybackState {
            track_id: track.id.clone(),
            playing: false,
            position: 0.0,
            duration: track.duration,
            volume: options.volume.clamp(0.0, 1.0),
            muted: false,
            shuffle: options.shuffle,
            repeat: options.repeat,
            buffering: false,
        };

        let snapshot = Arc::new(Mutex::new(PlaybackSnapshot {
            track,
            phase: Phase::Idle,
            state: state.clone(),
            queue: Vec::new(),
        }));

        let mut engine = Self {
            catalogue,
            media,
            publisher,
            online,
            broadcaster: Broadcaster::default(),
            snapshot,
            state,
            phase: Phase::Idle,
            queue,
            rng,
            retry_delay: options.retry_delay,
            retry: Retry::default(),
            announced: None,
            published_track: None,
            published_status: None,
        };
        engine.apply_volume();
        engine.changed();
        engine
    }

    /// Swap the media-session publisher and bring it up to date.
    pub fn set_publisher(&mut self, publisher: Box<dyn NowPlayingPublisher>) {
        self.publisher = publisher;
        self.published_track = None;
        self.published_status = None;
        self.apply_volume();
        self.changed();
    }

    pub fn broadcaster(&self) -> Broadcaster {
        self.broadcaster.clone()
    }

    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn queue(&self) -> &VecDeque<String> {
        &self.queue
    }

    pub fn current_track(&self) -> &Track {
        self.catalogue
            .track(&self.state.track_id)
            .unwrap_or_else(|| self.catalogue.first())
    }

    /// First credited artist of the current track.
    pub fn primary_artist(&self) -> &str {
        self.current_track().primary_artist()
    }

    /// The queue resolved to tracks; ids missing from the catalogue are dropped.
    pub fn queue_tracks(&self) -> Vec<Track> {
        self.queue
            .iter()
            .filter_map(|id| self.catalogue.track(id))
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn media(&mut self) -> &mut M {
        &mut self.media
    }

    /// Apply one command. Returns `false` once the engine should shut down.
    pub fn handle(&mut self, cmd: PlayerCmd) -> bool {
        match cmd {
            PlayerCmd::PlayTrack(id) => self.play_track_by_id(&id),
            PlayerCmd::TogglePlay => self.toggle_play(),
            PlayerCmd::Play => {
                if !self.state.playing {
                    self.toggle_play();
                }
            }
            PlayerCmd::Pause => {
                if self.state.playing {
                    self.toggle_play();
                }
            }
            PlayerCmd::Change(direction) => self.change_track(direction),
            PlayerCmd::ToggleShuffle => self.toggle_shuffle(),
            PlayerCmd::ToggleRepeat => self.toggle_repeat(),
            PlayerCmd::AddToQueue(id) => self.add_to_queue(&id),
            PlayerCmd::ShuffleAll => self.shuffle_all_tracks(),
            PlayerCmd::Seek(t) => self.seek(t),
            PlayerCmd::SeekBy(delta) => self.seek(self.state.position + delta),
            PlayerCmd::SetVolume(v) => self.set_volume(v),
            PlayerCmd::ToggleMute => self.toggle_mute(),
            PlayerCmd::Quit => {
                self.media.pause();
                self.state.playing = false;
                self.changed();
                return false;
            }
        }
        true
    }

    /// Play `id` from the start. Unknown ids leave the state untouched.
    pub fn play_track_by_id(&mut self, id: &str) {
        if self.catalogue.track(id).is_none() {
            debug!(track = id, "play requested for unknown track");
            return;
        }

        self.queue = if self.state.shuffle {
            queue::shuffled(&self.catalogue, id, &mut self.rng)
        } else {
            queue::album_scoped(&self.catalogue, id)
        };
        self.select(id.to_string());
        self.start_playback();
        self.changed();
    }

    pub fn toggle_play(&mut self) {
        if self.state.playing {
            self.media.pause();
            self.state.playing = false;
            if matches!(self.phase, Phase::Playing | Phase::Ready) {
                self.phase = Phase::Paused;
            }
        } else {
            // Idle has never loaded its source; Errored reloads it as a replay.
            if matches!(self.phase, Phase::Idle | Phase::Errored) {
                self.select(self.state.track_id.clone());
            }
            self.start_playback();
        }
        self.changed();
    }

    /// Skip forward through the queue or back through catalogue order.
    pub fn change_track(&mut self, direction: Direction) {
        let target = match direction {
            Direction::Next => self.next_from_queue().or_else(|| {
                self.catalogue
                    .successor(&self.state.track_id)
                    .map(|t| t.id.clone())
            }),
            Direction::Prev => self
                .catalogue
                .predecessor(&self.state.track_id)
                .map(|t| t.id.clone()),
        };
        let Some(target) = target else {
            return;
        };

        let was_playing = self.state.playing;
        self.select(target);
        if was_playing {
            self.start_playback();
        }
        self.changed();
    }

    fn next_from_queue(&mut self) -> Option<String> {
        while let Some(id) = self.queue.pop_front() {
            if self.catalogue.track(&id).is_some() {
                return Some(id);
            }
            debug!(track = %id, "dropping queued id missing from catalogue");
        }
        None
    }

    pub fn toggle_shuffle(&mut self) {
        self.state.shuffle = !self.state.shuffle;
        self.queue = if self.state.shuffle {
            queue::shuffled(&self.catalogue, &self.state.track_id, &mut self.rng)
        } else {
            queue::sequential(&self.catalogue, &self.state.track_id)
        };
        self.changed();
    }

    pub fn toggle_repeat(&mut self) {
        self.state.repeat = !self.state.repeat;
        self.changed();
    }

    /// Append `id` to the end of the queue.
    pub fn add_to_queue(&mut self, id: &str) {
        let Some(track) = self.catalogue.track(id) else {
            debug!(track = id, "add to queue for unknown track");
            return;
        };
        if id == self.state.track_id {
            let notice = format!("\"{}\" is already playing", track.title);
            self.broadcaster.send(PlayerEvent::Notice(notice));
            return;
        }
        let notice = format!("Added \"{}\" to queue", track.title);
        self.queue.push_back(id.to_string());
        self.broadcaster.send(PlayerEvent::Notice(notice));
        self.changed();
    }

    /// Shuffle the whole catalogue and start from its first entry.
    pub fn shuffle_all_tracks(&mut self) {
        let mut order = queue::shuffled_all(&self.catalogue, &mut self.rng);
        let Some(first) = order.pop_front() else {
            return;
        };
        self.queue = order;
        self.state.shuffle = true;
        self.select(first);
        self.start_playback();
        self.changed();
    }

    /// Seek to `time` seconds, clamped to the current duration.
    pub fn seek(&mut self, time: f64) {
        let duration = if self.state.duration.is_finite() {
            self.state.duration.max(0.0)
        } else {
            0.0
        };
        let time = if time.is_nan() { 0.0 } else { time.clamp(0.0, duration) };
        self.media.seek(time);
        self.state.position = time;
        self.changed();
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.state.volume = volume;
        self.state.muted = volume == 0.0;
        self.apply_volume();
        self.changed();
    }

    pub fn toggle_mute(&mut self) {
        self.state.muted = !self.state.muted;
        self.apply_volume();
        self.changed();
    }

    fn apply_volume(&mut self) {
        let effective = if self.state.muted { 0.0 } else { self.state.volume };
        self.media.set_volume(effective);
        self.publisher.set_volume(effective);
    }

    /// Drain and apply pending media events, then run due timers.
    pub fn pump(&mut self, now: Instant) {
        for event in self.media.take_events() {
            self.on_media_event(event, now);
        }
        self.tick(now);
    }

    pub fn on_media_event(&mut self, event: MediaEvent, now: Instant) {
        match event {
            MediaEvent::LoadedMetadata { duration } => {
                if duration.is_finite() && duration > 0.0 {
                    self.state.duration = duration;
                }
                self.state.buffering = false;
                if self.phase == Phase::Loading {
                    self.phase = Phase::Ready;
                }
            }
            MediaEvent::TimeUpdate { position } => {
                self.state.position = position;
            }
            MediaEvent::Waiting => {
                self.state.buffering = true;
            }
            MediaEvent::CanPlayThrough => {
                self.state.buffering = false;
            }
            MediaEvent::Playing => {
                self.state.buffering = false;
                if self.state.playing {
                    self.phase = Phase::Playing;
                }
            }
            MediaEvent::Ended => {
                self.phase = Phase::Ended;
                if self.state.repeat {
                    self.state.position = 0.0;
                    self.media.seek(0.0);
                    self.start_playback();
                } else {
                    self.change_track(Direction::Next);
                    return;
                }
            }
            MediaEvent::Error(err) => {
                warn!(track = %self.state.track_id, error = %err, "media error");
                self.state.buffering = false;
                self.phase = Phase::Errored;
                if self.online.is_online() && !self.retry.attempted {
                    self.retry.due = Some(now + self.retry_delay);
                    self.retry.resume = self.state.playing;
                    self.state.playing = false;
                    self.media.pause();
                } else {
                    self.state.playing = false;
                    self.media.pause();
                    let message = if self.online.is_online() {
                        format!("Could not play \"{}\"", self.current_track().title)
                    } else {
                        "Cannot play audio while offline. Please check your connection.".to_string()
                    };
                    self.broadcaster.send(PlayerEvent::Notice(message));
                }
            }
        }
        self.changed();
    }

    /// Run the pending automatic reload once its delay has passed.
    pub fn tick(&mut self, now: Instant) {
        let Some(due) = self.retry.due else {
            return;
        };
        if now < due {
            return;
        }
        self.retry.due = None;
        self.retry.attempted = true;
        let resume = std::mem::take(&mut self.retry.resume);
        info!(track = %self.state.track_id, "reloading source after media error");

        let src = self.current_track().audio_url.clone();
        self.phase = Phase::Loading;
        self.state.buffering = true;
        self.media.load(&src);
        if resume {
            self.start_playback();
        }
        self.changed();
    }

    /// Make `id` current and point the media primitive at its source.
    fn select(&mut self, id: String) {
        self.queue.retain(|q| q != &id);
        let (src, duration) = match self.catalogue.track(&id) {
            Some(t) => (t.audio_url.clone(), t.duration),
            None => return,
        };
        debug!(track = %id, src = %src, "loading track");
        self.state.track_id = id;
        self.state.position = 0.0;
        self.state.duration = duration;
        self.state.buffering = true;
        self.phase = Phase::Loading;
        self.retry = Retry::default();
        self.media.load(&src);
    }

    /// Issue play; a rejected play reverts to paused and tells the user.
    fn start_playback(&mut self) {
        match self.media.play() {
            Ok(()) => {
                self.state.playing = true;
                if matches!(self.phase, Phase::Ready | Phase::Paused | Phase::Ended) {
                    self.phase = Phase::Playing;
                }
            }
            Err(err) => {
                warn!(track = %self.state.track_id, error = %err, "play rejected");
                self.state.playing = false;
                self.broadcaster.send(PlayerEvent::Notice(format!(
                    "Playback did not start ({err}). Press play to try again."
                )));
            }
        }
    }

    /// Publish the post-mutation state to the snapshot, the media session
    /// and subscribers.
    fn changed(&mut self) {
        let track = self.current_track().clone();
        let queue = self.queue_tracks();

        if let Ok(mut snap) = self.snapshot.lock() {
            snap.track = track.clone();
            snap.phase = self.phase;
            snap.state = self.state.clone();
            snap.queue = queue;
        }

        let published = (track.id.clone(), self.state.duration);
        if self.published_track.as_ref() != Some(&published) {
            info!(track = %track.title, artist = self.primary_artist(), "now playing");
            self.publisher
                .set_metadata(&NowPlaying::from_track(&track, self.state.duration));
            self.published_track = Some(published);
        }
        let status = match (self.phase, self.state.playing) {
            (Phase::Idle, _) => PlaybackStatus::Stopped,
            (_, true) => PlaybackStatus::Playing,
            (_, false) => PlaybackStatus::Paused,
        };
        if self.published_status != Some(status) {
            self.publisher.set_status(status);
            self.published_status = Some(status);
        }
        self.publisher.set_position(self.state.position);

        let now = (track.id, self.state.playing);
        if self.announced.as_ref() != Some(&now) {
            self.broadcaster.send(PlayerEvent::TrackChanged {
                track_id: now.0.clone(),
                is_playing: now.1,
            });
            self.announced = Some(now);
        }
        self.broadcaster.send(PlayerEvent::StateChanged);
    }
}
