use crate::error::TransportError;

use super::types::LoadId;

/// The playable-media primitive the session controller drives.
///
/// Exactly one transport exists per session and every track switch reuses
/// it. Calls only queue work: results arrive later as `EngineEvent`s tagged
/// with the returned `LoadId`. An `Err` here means the transport itself is
/// gone, not that a particular track failed.
pub trait Transport {
    /// Stop the current source, switch to `source`, rewind to 0 and play at
    /// the current rate.
    fn load_and_play(&mut self, source: &str) -> Result<LoadId, TransportError>;

    /// No-op when already paused.
    fn pause(&mut self) -> Result<(), TransportError>;

    /// No-op when already playing.
    fn resume(&mut self) -> Result<(), TransportError>;

    /// Reposition to `seconds`, clamped to the known duration. Keeps the
    /// play/pause state.
    fn seek(&mut self, seconds: f64) -> Result<(), TransportError>;

    /// Clamped to `[MIN_RATE, MAX_RATE]`; applies to later loads as well.
    fn set_rate(&mut self, rate: f32) -> Result<(), TransportError>;

    fn stop(&mut self) -> Result<(), TransportError>;
}
