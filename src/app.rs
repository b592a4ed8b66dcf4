//! Application module: the view model the TUI draws and the runtime mutates.
//!
//! `App` lives in `app::model` and holds the browsed book, its lessons, the
//! list cursors, the search filter and the lyric binding.

mod model;

pub use model::*;
