use crate::catalog::Track;
use crate::media::PlaybackStatus;
use crate::playback::DEFAULT_RATE;

/// Where the session is in its playback lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing selected yet, or stopped.
    #[default]
    Idle,
    /// Play requested, waiting for the transport to start.
    Loading,
    Playing,
    Paused,
    /// The last track of the queue finished.
    Ended,
    /// The transport reported a failure; any transport action recovers.
    Errored,
}

impl Phase {
    pub fn media_status(self) -> PlaybackStatus {
        match self {
            Phase::Playing => PlaybackStatus::Playing,
            Phase::Paused => PlaybackStatus::Paused,
            Phase::Idle | Phase::Loading | Phase::Ended | Phase::Errored => {
                PlaybackStatus::Stopped
            }
        }
    }
}

/// Everything the presentation layer renders about playback.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub queue: Vec<Track>,
    /// `None` until something has been selected (or when the queue is empty).
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub playback_rate: f32,
    /// Seconds into the current track; reset to 0 on every track change.
    pub current_time: f64,
    /// Seconds; 0 while unknown.
    pub duration: f64,
    pub last_error: Option<String>,
    pub phase: Phase,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            current_index: None,
            is_playing: false,
            playback_rate: DEFAULT_RATE,
            current_time: 0.0,
            duration: 0.0,
            last_error: None,
            phase: Phase::Idle,
        }
    }
}

impl SessionState {
    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.queue.get(i))
    }

    pub fn has_prev(&self) -> bool {
        matches!(self.current_index, Some(i) if i > 0)
    }

    pub fn has_next(&self) -> bool {
        matches!(self.current_index, Some(i) if i + 1 < self.queue.len())
    }

    /// Fraction of the track played, in `[0, 1]`; 0 while duration is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.current_time / self.duration).clamp(0.0, 1.0)
    }
}
