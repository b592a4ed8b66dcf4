use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use reqwest::blocking::Client;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, info, warn};

use crate::config::AudioSettings;
use crate::error::{RemoteError, TransportError};

use super::source::open_sink;
use super::types::{DEFAULT_RATE, EngineCmd, EngineEvent, EngineEventKind, LoadId, clamp_seek};

/// The source currently attached to the output.
struct Current {
    load: LoadId,
    sink: Sink,
    duration: Option<f64>,
}

/// State owned by the audio thread. The output stream is opened once and
/// reused for every track.
struct AudioThread {
    stream: Result<OutputStream, String>,
    client: Client,
    events: SyncSender<EngineEvent>,
    current: Option<Current>,
    rate: f32,
    /// Id of the newest load the engine asked for. Anything else being
    /// fetched has been superseded, stopped or abandoned at shutdown.
    latest: Arc<AtomicU64>,
}

pub(super) fn spawn_audio_thread(
    client: Client,
    latest: Arc<AtomicU64>,
    rx: Receiver<EngineCmd>,
    events: SyncSender<EngineEvent>,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when the stream is dropped, which would
                // scribble over the TUI.
                stream.log_on_drop(false);
                Ok(stream)
            }
            Err(e) => {
                error!(error = %e, "no audio output device");
                Err(e.to_string())
            }
        };

        let mut audio = AudioThread {
            stream,
            client,
            events,
            current: None,
            rate: DEFAULT_RATE,
            latest,
        };
        let tick = Duration::from_millis(audio_settings.tick_ms.max(1));

        'run: loop {
            let cmd = match rx.recv_timeout(tick) {
                Ok(cmd) => cmd,
                Err(RecvTimeoutError::Timeout) => {
                    audio.tick();
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let batch = if matches!(cmd, EngineCmd::Load { .. }) {
                let mut pending = vec![cmd];
                pending.extend(rx.try_iter());
                coalesce_loads(pending)
            } else {
                vec![cmd]
            };
            for cmd in batch {
                if !audio.handle(cmd) {
                    break 'run;
                }
            }
        }
        info!("audio thread stopped");
    })
}

/// Keep only the newest of the queued loads. Commands queued before it only
/// concern tracks it replaces, except rate changes and quit.
pub(super) fn coalesce_loads(pending: Vec<EngineCmd>) -> Vec<EngineCmd> {
    let Some(last) = pending
        .iter()
        .rposition(|cmd| matches!(cmd, EngineCmd::Load { .. }))
    else {
        return pending;
    };
    pending
        .into_iter()
        .enumerate()
        .filter(|(i, cmd)| {
            *i >= last || matches!(cmd, EngineCmd::SetRate(_) | EngineCmd::Quit { .. })
        })
        .map(|(_, cmd)| cmd)
        .collect()
}

impl AudioThread {
    /// Apply one command. Returns false once the thread should exit.
    fn handle(&mut self, cmd: EngineCmd) -> bool {
        match cmd {
            EngineCmd::Load { load, source } => self.load(load, &source),
            EngineCmd::Pause => self.pause(),
            EngineCmd::Resume => self.resume(),
            EngineCmd::Seek(seconds) => self.seek(seconds),
            EngineCmd::SetRate(rate) => self.set_rate(rate),
            EngineCmd::Stop => self.stop_current(),
            EngineCmd::Quit { fade_out_ms } => {
                if let Some(cur) = self.current.take() {
                    fade_out_sink(&cur.sink, fade_out_ms);
                    cur.sink.stop();
                }
                return false;
            }
        }
        true
    }

    fn is_latest(&self, load: LoadId) -> bool {
        self.latest.load(Ordering::Acquire) == load.0
    }

    fn emit(&self, load: LoadId, kind: EngineEventKind) {
        // The receiver is gone only while the app is shutting down.
        let _ = self.events.send(EngineEvent { load, kind });
    }

    fn stop_current(&mut self) {
        if let Some(cur) = self.current.take() {
            cur.sink.stop();
        }
    }

    fn load(&mut self, load: LoadId, source: &str) {
        if !self.is_latest(load) {
            debug!(load = load.0, "load superseded before fetching");
            return;
        }
        self.stop_current();

        let stream = match &self.stream {
            Ok(stream) => stream,
            Err(msg) => {
                let err = TransportError::Output(msg.clone());
                self.emit(load, EngineEventKind::Error(err.to_string()));
                return;
            }
        };

        let latest = &self.latest;
        let keep_going = || latest.load(Ordering::Acquire) == load.0;
        match open_sink(stream, &self.client, source, keep_going) {
            Ok(opened) => {
                opened.sink.set_speed(self.rate);
                opened.sink.play();
                debug!(load = load.0, duration = ?opened.duration, "playing");
                self.emit(
                    load,
                    EngineEventKind::TimeUpdate {
                        current: 0.0,
                        duration: opened.duration.unwrap_or(0.0),
                    },
                );
                self.emit(load, EngineEventKind::Play);
                self.current = Some(Current {
                    load,
                    sink: opened.sink,
                    duration: opened.duration,
                });
            }
            Err(TransportError::Fetch(RemoteError::Cancelled { .. })) => {
                debug!(load = load.0, "download abandoned");
            }
            Err(e) => {
                warn!(load = load.0, source, error = %e, "load failed");
                self.emit(load, EngineEventKind::Error(e.to_string()));
            }
        }
    }

    fn pause(&self) {
        if let Some(cur) = &self.current {
            if !cur.sink.is_paused() {
                cur.sink.pause();
                self.emit(cur.load, EngineEventKind::Pause);
            }
        }
    }

    fn resume(&self) {
        if let Some(cur) = &self.current {
            if cur.sink.is_paused() {
                cur.sink.play();
                self.emit(cur.load, EngineEventKind::Play);
            }
        }
    }

    fn seek(&self, seconds: f64) {
        let Some(cur) = &self.current else {
            return;
        };
        let target = clamp_seek(seconds, cur.duration);
        match cur.sink.try_seek(Duration::from_secs_f64(target)) {
            Ok(()) => self.emit(
                cur.load,
                EngineEventKind::TimeUpdate {
                    current: target,
                    duration: cur.duration.unwrap_or(0.0),
                },
            ),
            Err(e) => warn!(target, error = %e, "seek failed"),
        }
    }

    fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
        if let Some(cur) = &self.current {
            cur.sink.set_speed(rate);
        }
    }

    /// Periodic work: report position and detect end of media.
    fn tick(&mut self) {
        let Some(cur) = &self.current else {
            return;
        };
        if cur.sink.is_paused() {
            return;
        }

        if cur.sink.empty() {
            let load = cur.load;
            self.current = None;
            self.emit(load, EngineEventKind::Ended);
            return;
        }

        let duration = cur.duration.unwrap_or(0.0);
        let mut current = cur.sink.get_pos().as_secs_f64();
        if duration > 0.0 {
            current = current.min(duration);
        }
        // Position reports are superseded by the next tick; drop them rather
        // than block when the event loop falls behind.
        let event = EngineEvent {
            load: cur.load,
            kind: EngineEventKind::TimeUpdate { current, duration },
        };
        if let Err(TrySendError::Full(_)) = self.events.try_send(event) {
            debug!("event queue full, skipping position update");
        }
    }
}

fn fade_out_sink(sink: &Sink, fade_out_ms: u64) {
    if fade_out_ms == 0 || sink.is_paused() {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    sink.set_volume(1.0);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(1.0 - t);
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
