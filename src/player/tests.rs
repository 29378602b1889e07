use super::*;
use crate::cache::OnlineStatus;
use crate::catalogue::Catalogue;
use crate::engine::{Direction, EngineOptions, MediaElement, MediaError, MediaEvent, PlayerEvent};
use crate::publisher::NullPublisher;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Accepts every play and reports metadata right after each load.
struct InstantMedia {
    pending: Vec<MediaEvent>,
}

impl MediaElement for InstantMedia {
    fn load(&mut self, _src: &str) {
        self.pending.push(MediaEvent::LoadedMetadata { duration: 120.0 });
    }

    fn play(&mut self) -> Result<(), MediaError> {
        self.pending.push(MediaEvent::Playing);
        Ok(())
    }

    fn pause(&mut self) {}

    fn seek(&mut self, _position: f64) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn take_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.pending)
    }
}

fn spawn_with<F>(media: F) -> PlayerService
where
    F: FnOnce() -> Result<Box<dyn MediaElement>, MediaError> + Send + 'static,
{
    let catalogue = Arc::new(Catalogue::bundled().unwrap());
    let options = EngineOptions {
        seed: Some(1),
        ..EngineOptions::default()
    };
    PlayerService::spawn(catalogue, options, OnlineStatus::new(true), media, |_| {
        Box::new(NullPublisher)
    })
    .unwrap()
}

fn wait_until(handle: &PlayerHandle, pred: impl Fn(&crate::engine::PlaybackSnapshot) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if handle.snapshot().is_some_and(|s| pred(&s)) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn commands_from_any_handle_reach_the_one_engine() {
    let mut service = spawn_with(|| Ok(Box::new(InstantMedia { pending: Vec::new() })));
    let a = service.handle();
    let b = service.handle();
    let events = a.subscribe();

    a.play_track_by_id("track-5");
    assert!(wait_until(&b, |s| s.track.id == "track-5" && s.state.playing));
    assert!(wait_until(&b, |s| s.state.duration == 120.0));

    b.change_track(Direction::Next);
    assert!(wait_until(&a, |s| s.track.id == "track-4"));

    b.add_to_queue("track-8");
    assert!(wait_until(&a, |s| s.queue.iter().any(|t| t.id == "track-8")));

    service.shutdown();
    let seen: Vec<_> = events.try_iter().collect();
    assert!(seen.contains(&PlayerEvent::TrackChanged {
        track_id: "track-5".into(),
        is_playing: true,
    }));
    assert!(seen.contains(&PlayerEvent::Notice("Added \"First Day Out\" to queue".into())));
}

#[test]
fn missing_audio_output_rejects_play_without_crashing() {
    let mut service = spawn_with(|| Err(MediaError::NoOutput("no device".into())));
    let handle = service.handle();
    let events = handle.subscribe();

    handle.play_track_by_id("track-2");
    assert!(wait_until(&handle, |s| s.track.id == "track-2"));
    assert!(!handle.snapshot().unwrap().state.playing);

    service.shutdown();
    assert!(events
        .try_iter()
        .any(|e| matches!(e, PlayerEvent::Notice(n) if n.contains("no device"))));
}

#[test]
fn detached_handle_forwards_commands() {
    let snapshot = {
        let mut service = spawn_with(|| Ok(Box::new(InstantMedia { pending: Vec::new() })));
        let s = service.handle().snapshot().unwrap();
        service.shutdown();
        s
    };
    let (handle, rx) = PlayerHandle::detached(snapshot);
    handle.seek_by(-5.0);
    handle.toggle_mute();
    assert_eq!(
        rx.try_iter().collect::<Vec<_>>(),
        vec![crate::engine::PlayerCmd::SeekBy(-5.0), crate::engine::PlayerCmd::ToggleMute]
    );
    assert_eq!(handle.broadcaster().subscriber_count(), 0);
}
