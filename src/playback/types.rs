//! Playback engine commands, notifications and value limits.

pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;
pub const DEFAULT_RATE: f32 = 1.0;

/// Capacity of the engine -> controller event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Identifies one `load_and_play` request. Every notification carries the id
/// of the load it belongs to, so events from a superseded track can be told
/// apart from the current one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LoadId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    /// Output started or resumed.
    Play,
    /// Output paused.
    Pause,
    /// Position report; `duration` is 0 while unknown.
    TimeUpdate { current: f64, duration: f64 },
    /// The source played to its end.
    Ended,
    /// Loading or playback failed.
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub load: LoadId,
    pub kind: EngineEventKind,
}

#[derive(Debug)]
pub enum EngineCmd {
    /// Replace the current source and start playing it.
    Load { load: LoadId, source: String },
    Pause,
    Resume,
    /// Absolute position in seconds.
    Seek(f64),
    SetRate(f32),
    /// Drop the current source.
    Stop,
    /// Quit the audio thread, fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

pub fn clamp_rate(rate: f32) -> f32 {
    if rate.is_nan() {
        return DEFAULT_RATE;
    }
    rate.clamp(MIN_RATE, MAX_RATE)
}

/// Clamp a seek target to `[0, duration]`, or just to `>= 0` while the
/// duration is unknown.
pub fn clamp_seek(seconds: f64, duration: Option<f64>) -> f64 {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    match duration {
        Some(d) if d > 0.0 => seconds.min(d),
        _ => seconds,
    }
}
