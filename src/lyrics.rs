//! Time-synced lyrics: parsing, active-line lookup and the per-track binding
//! that keeps the displayed lyric set in step with playback.

mod fetch;
mod locate;
mod parser;
mod sync;

pub use fetch::{LyricFetcher, LyricResponse};
pub use locate::locate;
pub use parser::{LyricLine, parse};
pub use sync::{LyricRequest, LyricSync, centered_offset};
