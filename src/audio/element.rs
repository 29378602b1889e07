use std::io::Cursor;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use crate::engine::{MediaElement, MediaError, MediaEvent};

use super::loader::SourceLoader;

/// Smallest position change worth reporting.
const TIME_UPDATE_STEP: f64 = 0.25;

struct Loaded {
    generation: u64,
    src: String,
    result: Result<Vec<u8>, MediaError>,
}

/// A [`MediaElement`] playing through the default output device.
///
/// Sources are fetched on a loader thread; a newer `load` bumps the
/// generation so late results for an abandoned source are dropped.
pub struct RodioElement {
    stream: OutputStream,
    loader: Arc<dyn SourceLoader>,
    loaded_tx: Sender<Loaded>,
    loaded_rx: Receiver<Loaded>,
    generation: u64,
    src: Option<String>,
    bytes: Option<Vec<u8>>,
    sink: Option<Sink>,
    want_play: bool,
    pending_seek: Option<f64>,
    volume: f32,
    reported_position: f64,
    ended: bool,
    events: Vec<MediaEvent>,
}

impl RodioElement {
    pub fn new(loader: Arc<dyn SourceLoader>) -> Result<Self, MediaError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| MediaError::NoOutput(e.to_string()))?;
        // rodio prints to stderr on drop, which would tear the TUI.
        stream.log_on_drop(false);

        let (loaded_tx, loaded_rx) = mpsc::channel();
        Ok(Self {
            stream,
            loader,
            loaded_tx,
            loaded_rx,
            generation: 0,
            src: None,
            bytes: None,
            sink: None,
            want_play: false,
            pending_seek: None,
            volume: 1.0,
            reported_position: 0.0,
            ended: false,
            events: Vec::new(),
        })
    }

    fn drop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// Decode the current bytes into a fresh, paused sink.
    fn build_sink(&mut self) -> Result<Option<Duration>, MediaError> {
        let (Some(src), Some(bytes)) = (self.src.as_deref(), self.bytes.as_ref()) else {
            return Err(MediaError::NoSource);
        };
        let decoder = Decoder::new(Cursor::new(bytes.clone())).map_err(|e| MediaError::Decode {
            src: src.to_string(),
            reason: e.to_string(),
        })?;
        let duration = decoder.total_duration();

        self.drop_sink();
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(decoder);
        self.sink = Some(sink);
        self.ended = false;
        self.reported_position = 0.0;
        Ok(duration)
    }

    fn on_loaded(&mut self, loaded: Loaded) {
        if loaded.generation != self.generation {
            debug!(src = %loaded.src, "discarding stale load");
            return;
        }
        let bytes = match loaded.result {
            Ok(b) => b,
            Err(e) => {
                self.events.push(MediaEvent::Error(e));
                return;
            }
        };
        self.bytes = Some(bytes);

        match self.build_sink() {
            Ok(duration) => {
                let duration = duration.map(|d| d.as_secs_f64()).unwrap_or(f64::NAN);
                self.events.push(MediaEvent::LoadedMetadata { duration });
                if let Some(at) = self.pending_seek.take() {
                    self.seek_sink(at);
                }
                self.events.push(MediaEvent::CanPlayThrough);
                if self.want_play {
                    if let Some(sink) = &self.sink {
                        sink.play();
                    }
                    self.events.push(MediaEvent::Playing);
                }
            }
            Err(e) => {
                self.bytes = None;
                self.events.push(MediaEvent::Error(e));
            }
        }
    }

    fn seek_sink(&mut self, position: f64) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.try_seek(Duration::from_secs_f64(position.max(0.0))) {
            warn!(error = %e, position, "seek failed");
        }
        self.reported_position = position;
    }
}

impl MediaElement for RodioElement {
    fn load(&mut self, src: &str) {
        self.drop_sink();
        self.generation += 1;
        self.src = Some(src.to_string());
        self.bytes = None;
        self.want_play = false;
        self.pending_seek = None;
        self.ended = false;

        let generation = self.generation;
        let loader = self.loader.clone();
        let tx = self.loaded_tx.clone();
        let src = src.to_string();
        let spawned = thread::Builder::new().name("audio-loader".into()).spawn(move || {
            let result = loader.load(&src);
            let _ = tx.send(Loaded {
                generation,
                src,
                result,
            });
        });
        if let Err(e) = spawned {
            self.events.push(MediaEvent::Error(MediaError::Rejected(e.to_string())));
        }
    }

    fn play(&mut self) -> Result<(), MediaError> {
        if self.src.is_none() {
            return Err(MediaError::NoSource);
        }
        self.want_play = true;
        if self.sink.is_none() {
            // Still loading; playback starts once the source is decoded.
            return Ok(());
        }
        if self.ended {
            self.build_sink()?;
        }
        if let Some(sink) = &self.sink {
            sink.play();
            self.events.push(MediaEvent::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.want_play = false;
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn seek(&mut self, position: f64) {
        if self.sink.is_none() {
            self.pending_seek = Some(position);
            return;
        }
        if self.ended {
            if let Err(e) = self.build_sink() {
                self.events.push(MediaEvent::Error(e));
                return;
            }
        }
        self.seek_sink(position);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    fn take_events(&mut self) -> Vec<MediaEvent> {
        while let Ok(loaded) = self.loaded_rx.try_recv() {
            self.on_loaded(loaded);
        }

        if let Some(sink) = &self.sink {
            if !self.ended && sink.empty() {
                self.ended = true;
                self.events.push(MediaEvent::Ended);
            } else if !sink.is_paused() {
                let position = sink.get_pos().as_secs_f64();
                if (position - self.reported_position).abs() >= TIME_UPDATE_STEP {
                    self.reported_position = position;
                    self.events.push(MediaEvent::TimeUpdate { position });
                }
            }
        }

        std::mem::take(&mut self.events)
    }
}
