//! Error types shared across the player.
//!
//! Every error here is recoverable: the runtime converts them into state
//! fields (a page-level message or the player's `last_error`) instead of
//! letting them escape into the event loop.

use thiserror::Error;

/// Failure to read a remote or local resource.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with {status} for {url}")]
    Status { status: u16, url: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("download of {url} was cancelled")]
    Cancelled { url: String },
}

/// Failure to load the lesson list of a book.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to load lesson list: {0}")]
    Remote(#[from] RemoteError),

    #[error("lesson list is malformed: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Playback failed to start or was interrupted.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("audio engine is not running")]
    Disconnected,

    #[error("cannot fetch audio: {0}")]
    Fetch(#[from] RemoteError),

    #[error("cannot decode audio: {0}")]
    Decode(String),

    #[error("no audio output: {0}")]
    Output(String),
}
