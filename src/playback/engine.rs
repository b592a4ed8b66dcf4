use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::config::AudioSettings;
use crate::error::TransportError;

use super::thread::spawn_audio_thread;
use super::transport::Transport;
use super::types::{EVENT_QUEUE_CAPACITY, EngineCmd, EngineEvent, LoadId, clamp_rate};

/// How long `shutdown` waits for the audio thread beyond the fade-out.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Values of `latest` that match no load.
const NO_LOAD: u64 = 0;
const SHUTTING_DOWN: u64 = u64::MAX;

/// `Transport` backed by a dedicated rodio audio thread.
pub struct AudioEngine {
    tx: Sender<EngineCmd>,
    next_load: u64,
    /// Newest requested load; the audio thread abandons any other download.
    latest: Arc<AtomicU64>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioEngine {
    /// Start the audio thread. The returned receiver carries the engine's
    /// notifications and must be drained regularly by the event loop.
    pub fn spawn(client: Client, settings: AudioSettings) -> (Self, Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let (event_tx, event_rx) = mpsc::sync_channel::<EngineEvent>(EVENT_QUEUE_CAPACITY);

        let latest = Arc::new(AtomicU64::new(NO_LOAD));
        let handle = spawn_audio_thread(client, Arc::clone(&latest), rx, event_tx, settings);

        let engine = Self {
            tx,
            next_load: NO_LOAD,
            latest,
            join: Mutex::new(Some(handle)),
        };
        (engine, event_rx)
    }

    fn send(&self, cmd: EngineCmd) -> Result<(), TransportError> {
        self.tx.send(cmd).map_err(|_| TransportError::Disconnected)
    }

    /// Fade out, stop the audio thread and wait for it to exit. A download
    /// stuck on a silent server is left behind after a short grace period.
    pub fn shutdown(&self, fade_out: Duration) {
        self.latest.store(SHUTTING_DOWN, Ordering::Release);
        let _ = self.send(EngineCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        let Some(handle) = self.join.lock().ok().and_then(|mut j| j.take()) else {
            return;
        };
        let deadline = Instant::now() + fade_out + SHUTDOWN_GRACE;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!("audio thread did not stop in time, leaving it behind");
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let _ = handle.join();
    }
}

impl Transport for AudioEngine {
    fn load_and_play(&mut self, source: &str) -> Result<LoadId, TransportError> {
        self.next_load += 1;
        let load = LoadId(self.next_load);
        self.latest.store(load.0, Ordering::Release);
        debug!(load = load.0, source, "load");
        self.send(EngineCmd::Load {
            load,
            source: source.to_string(),
        })?;
        Ok(load)
    }

    fn pause(&mut self) -> Result<(), TransportError> {
        self.send(EngineCmd::Pause)
    }

    fn resume(&mut self) -> Result<(), TransportError> {
        self.send(EngineCmd::Resume)
    }

    fn seek(&mut self, seconds: f64) -> Result<(), TransportError> {
        self.send(EngineCmd::Seek(seconds))
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), TransportError> {
        self.send(EngineCmd::SetRate(clamp_rate(rate)))
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        self.latest.store(NO_LOAD, Ordering::Release);
        self.send(EngineCmd::Stop)
    }
}
