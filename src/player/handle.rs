use std::sync::mpsc::{Receiver, Sender};

use tracing::debug;

use crate::engine::{Broadcaster, Direction, PlaybackSnapshot, PlayerCmd, PlayerEvent, SnapshotHandle};

/// Everything a surface may ask of the player.
pub trait PlayerControls {
    fn play_track_by_id(&self, id: &str);
    fn toggle_play(&self);
    fn play(&self);
    fn pause(&self);
    fn change_track(&self, direction: Direction);
    fn toggle_shuffle(&self);
    fn toggle_repeat(&self);
    fn add_to_queue(&self, id: &str);
    fn shuffle_all_tracks(&self);
    fn seek(&self, time: f64);
    fn seek_by(&self, delta: f64);
    fn set_volume(&self, volume: f32);
    fn toggle_mute(&self);

    /// Latest published state.
    fn snapshot(&self) -> Option<PlaybackSnapshot>;
    fn subscribe(&self) -> Receiver<PlayerEvent>;
}

/// Cheap, cloneable entry point to the player thread.
#[derive(Clone)]
pub struct PlayerHandle {
    tx: Sender<PlayerCmd>,
    snapshot: SnapshotHandle,
    broadcaster: Broadcaster,
}

impl PlayerHandle {
    pub(super) fn new(tx: Sender<PlayerCmd>, snapshot: SnapshotHandle, broadcaster: Broadcaster) -> Self {
        Self {
            tx,
            snapshot,
            broadcaster,
        }
    }

    pub fn send(&self, cmd: PlayerCmd) {
        if self.tx.send(cmd).is_err() {
            debug!("player thread is gone, command dropped");
        }
    }

    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    /// A handle wired to a bare channel instead of a player thread.
    #[cfg(test)]
    pub(crate) fn detached(snapshot: PlaybackSnapshot) -> (Self, Receiver<PlayerCmd>) {
        use std::sync::{Arc, Mutex, mpsc};
        let (tx, rx) = mpsc::channel();
        let handle = Self::new(tx, Arc::new(Mutex::new(snapshot)), Broadcaster::default());
        (handle, rx)
    }

    #[cfg(test)]
    pub(crate) fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }
}

impl PlayerControls for PlayerHandle {
    fn play_track_by_id(&self, id: &str) {
        self.send(PlayerCmd::PlayTrack(id.to_string()));
    }

    fn toggle_play(&self) {
        self.send(PlayerCmd::TogglePlay);
    }

    fn play(&self) {
        self.send(PlayerCmd::Play);
    }

    fn pause(&self) {
        self.send(PlayerCmd::Pause);
    }

    fn change_track(&self, direction: Direction) {
        self.send(PlayerCmd::Change(direction));
    }

    fn toggle_shuffle(&self) {
        self.send(PlayerCmd::ToggleShuffle);
    }

    fn toggle_repeat(&self) {
        self.send(PlayerCmd::ToggleRepeat);
    }

    fn add_to_queue(&self, id: &str) {
        self.send(PlayerCmd::AddToQueue(id.to_string()));
    }

    fn shuffle_all_tracks(&self) {
        self.send(PlayerCmd::ShuffleAll);
    }

    fn seek(&self, time: f64) {
        self.send(PlayerCmd::Seek(time));
    }

    fn seek_by(&self, delta: f64) {
        self.send(PlayerCmd::SeekBy(delta));
    }

    fn set_volume(&self, volume: f32) {
        self.send(PlayerCmd::SetVolume(volume));
    }

    fn toggle_mute(&self) {
        self.send(PlayerCmd::ToggleMute);
    }

    fn snapshot(&self) -> Option<PlaybackSnapshot> {
        self.snapshot.lock().ok().map(|s| s.clone())
    }

    fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.broadcaster.subscribe()
    }
}
