//! The host's media-key / lock-screen surface, as seen by the session.
//!
//! The session pushes now-playing metadata and status here; whether anything
//! listens is up to the implementation.

use crate::catalog::Track;

pub const ALBUM: &str = "New Concept English";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MediaMetadata {
    pub track_id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Seconds; 0 while unknown.
    pub length: f64,
}

impl MediaMetadata {
    pub fn for_track(track: &Track) -> Self {
        Self {
            track_id: track.id.clone(),
            title: track.display(),
            artist: track.book.to_string(),
            album: ALBUM.to_string(),
            length: 0.0,
        }
    }
}

pub trait MediaSurface {
    /// `None` clears the now-playing entry.
    fn set_metadata(&self, metadata: Option<MediaMetadata>);

    fn set_status(&self, status: PlaybackStatus);

    /// Current position and duration in seconds.
    fn set_position(&self, _position: f64, _duration: f64) {}

    fn set_rate(&self, _rate: f32) {}
}

impl<S: MediaSurface + ?Sized> MediaSurface for Box<S> {
    fn set_metadata(&self, metadata: Option<MediaMetadata>) {
        (**self).set_metadata(metadata)
    }

    fn set_status(&self, status: PlaybackStatus) {
        (**self).set_status(status)
    }

    fn set_position(&self, position: f64, duration: f64) {
        (**self).set_position(position, duration)
    }

    fn set_rate(&self, rate: f32) {
        (**self).set_rate(rate)
    }
}

/// Used when media keys are turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMediaSurface;

impl MediaSurface for NoMediaSurface {
    fn set_metadata(&self, _metadata: Option<MediaMetadata>) {}

    fn set_status(&self, _status: PlaybackStatus) {}
}
