use tracing::{debug, info, warn};

use crate::catalog::Track;
use crate::error::TransportError;
use crate::media::{MediaMetadata, MediaSurface, PlaybackStatus};
use crate::playback::{EngineEvent, EngineEventKind, LoadId, Transport, clamp_rate, clamp_seek};

use super::state::{Phase, SessionState};

/// Owns the play queue and the transport, and keeps session state, the
/// transport and the media surface in lockstep.
///
/// State changes come from two places only: the explicit actions below and
/// engine notifications fed through [`Session::handle_event`] in arrival
/// order. The current track is always re-derived from `current_index`, so a
/// late notification for an earlier load can never win over a newer one.
pub struct Session<T: Transport, M: MediaSurface> {
    transport: T,
    media: M,
    state: SessionState,
    active_load: Option<LoadId>,
}

impl<T: Transport, M: MediaSurface> Session<T, M> {
    pub fn new(mut transport: T, media: M, playback_rate: f32) -> Self {
        let playback_rate = clamp_rate(playback_rate);
        if let Err(e) = transport.set_rate(playback_rate) {
            warn!(error = %e, "cannot apply initial playback rate");
        }
        media.set_rate(playback_rate);
        Self {
            transport,
            media,
            state: SessionState {
                playback_rate,
                ..SessionState::default()
            },
            active_load: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.current_track()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replace the queue wholesale and start playing `index` (clamped).
    /// An empty `tracks` leaves everything as it was.
    pub fn set_queue_and_play(&mut self, tracks: Vec<Track>, index: usize) {
        if tracks.is_empty() {
            debug!("ignoring empty queue");
            return;
        }
        info!(len = tracks.len(), index, "new queue");
        self.state.queue = tracks;
        self.state.last_error = None;
        self.play_index(index);
    }

    /// Select `index` (clamped into the queue) and start playing it.
    ///
    /// The selection sticks even if the transport fails, so the user can
    /// retry or pick another track.
    pub fn play_index(&mut self, index: usize) {
        let len = self.state.queue.len();
        if len == 0 {
            return;
        }
        let index = index.min(len - 1);

        self.state.current_index = Some(index);
        self.state.current_time = 0.0;
        self.state.duration = 0.0;
        self.state.is_playing = false;
        self.state.last_error = None;
        self.state.phase = Phase::Loading;

        let track = &self.state.queue[index];
        let source = track.audio_url.clone();
        self.media.set_metadata(Some(MediaMetadata::for_track(track)));
        self.media.set_status(PlaybackStatus::Stopped);

        match self.transport.load_and_play(&source) {
            Ok(load) => {
                debug!(index, load = load.0, "loading");
                self.active_load = Some(load);
            }
            Err(e) => {
                self.active_load = None;
                self.fail(e);
            }
        }
    }

    /// Pause when playing, resume when paused, otherwise (re)start the
    /// selected track, or the first one when nothing is selected.
    pub fn toggle(&mut self) {
        if self.state.is_playing {
            self.pause();
            return;
        }
        match (self.state.phase, self.state.current_index) {
            (Phase::Paused, Some(_)) => {
                if let Err(e) = self.transport.resume() {
                    self.fail(e);
                }
            }
            (_, Some(index)) => self.play_index(index),
            (_, None) if !self.state.queue.is_empty() => self.play_index(0),
            _ => {}
        }
    }

    pub fn pause(&mut self) {
        if let Err(e) = self.transport.pause() {
            self.fail(e);
        }
    }

    /// Drop the current source but keep the selection; `toggle` restarts it.
    pub fn stop(&mut self) {
        if self.state.current_index.is_none() {
            return;
        }
        if let Err(e) = self.transport.stop() {
            self.fail(e);
            return;
        }
        self.active_load = None;
        self.state.is_playing = false;
        self.state.current_time = 0.0;
        self.set_phase(Phase::Idle);
    }

    /// Move one track forward; no-op on the last track.
    pub fn next(&mut self) {
        match self.state.current_index {
            Some(i) if i + 1 < self.state.queue.len() => self.play_index(i + 1),
            None if !self.state.queue.is_empty() => self.play_index(0),
            _ => {}
        }
    }

    /// Move one track back; no-op on the first track.
    pub fn prev(&mut self) {
        match self.state.current_index {
            Some(i) if i > 0 => self.play_index(i - 1),
            None if !self.state.queue.is_empty() => self.play_index(0),
            _ => {}
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        if self.state.current_index.is_none() {
            return;
        }
        let known = (self.state.duration > 0.0).then_some(self.state.duration);
        let target = clamp_seek(seconds, known);
        match self.transport.seek(target) {
            Ok(()) => self.state.current_time = target,
            Err(e) => self.fail(e),
        }
    }

    pub fn set_playback_rate(&mut self, rate: f32) {
        let rate = clamp_rate(rate);
        match self.transport.set_rate(rate) {
            Ok(()) => {
                self.state.playback_rate = rate;
                self.media.set_rate(rate);
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn clear_error(&mut self) {
        self.state.last_error = None;
    }

    /// Apply one engine notification. Events from a load other than the
    /// latest one are dropped.
    pub fn handle_event(&mut self, event: EngineEvent) {
        if Some(event.load) != self.active_load {
            debug!(load = event.load.0, kind = ?event.kind, "dropping event from superseded load");
            return;
        }

        match event.kind {
            EngineEventKind::Play => {
                self.state.is_playing = true;
                self.state.last_error = None;
                self.set_phase(Phase::Playing);
            }
            EngineEventKind::Pause => {
                self.state.is_playing = false;
                if matches!(self.state.phase, Phase::Playing | Phase::Loading) {
                    self.set_phase(Phase::Paused);
                }
            }
            EngineEventKind::TimeUpdate { current, duration } => {
                let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
                let known = (duration > 0.0).then_some(duration);
                self.state.duration = duration;
                self.state.current_time = clamp_seek(current, known);
                self.media.set_position(self.state.current_time, duration);
            }
            EngineEventKind::Ended => {
                self.state.is_playing = false;
                self.advance_after_end();
            }
            EngineEventKind::Error(message) => {
                warn!(load = event.load.0, %message, "playback error");
                self.record_error(message);
            }
        }
    }

    fn advance_after_end(&mut self) {
        match self.state.current_index {
            Some(i) if i + 1 < self.state.queue.len() => self.play_index(i + 1),
            _ => {
                info!("queue finished");
                self.active_load = None;
                self.state.phase = Phase::Ended;
                self.media.set_metadata(None);
                self.media.set_status(PlaybackStatus::Stopped);
            }
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        self.state.phase = phase;
        self.media.set_status(phase.media_status());
    }

    fn fail(&mut self, err: TransportError) {
        warn!(error = %err, "transport failure");
        self.record_error(err.to_string());
    }

    fn record_error(&mut self, message: String) {
        self.state.last_error = Some(message);
        self.state.is_playing = false;
        self.set_phase(Phase::Errored);
    }
}
