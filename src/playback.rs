//! Playback engine: one audio output shared by every track, driven through
//! the `Transport` trait and reporting back over an event channel.

mod engine;
mod source;
mod thread;
mod transport;
mod types;

pub use engine::AudioEngine;
pub use transport::Transport;
pub use types::*;

#[cfg(test)]
mod tests;
