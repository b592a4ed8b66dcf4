use tracing::debug;

use crate::catalog::Track;

use super::locate::locate;
use super::parser::{LyricLine, parse};

/// A lyric download to perform for the track that was current when
/// `generation` was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricRequest {
    pub generation: u64,
    pub url: String,
}

/// Lyric state for whichever track is currently selected.
///
/// The set is rebuilt from scratch on every track change and never merged.
/// Responses are tagged with the generation they were requested under, and
/// anything older than the latest track change is dropped on arrival.
#[derive(Debug, Default)]
pub struct LyricSync {
    generation: u64,
    track_id: Option<String>,
    lines: Vec<LyricLine>,
    missing: bool,
    active: Option<usize>,
}

impl LyricSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// React to the controller's current track.
    ///
    /// Clears the displayed set immediately when the track differs from the
    /// last one seen and returns the download to start for it. Calling this
    /// again for the same track is a no-op.
    pub fn track_changed(&mut self, track: Option<&Track>) -> Option<LyricRequest> {
        let id = track.map(|t| t.id.as_str());
        if id == self.track_id.as_deref() {
            return None;
        }

        self.generation += 1;
        self.track_id = id.map(str::to_string);
        self.lines.clear();
        self.missing = false;
        self.active = None;

        track.map(|t| LyricRequest {
            generation: self.generation,
            url: t.lyric_url.clone(),
        })
    }

    /// Apply a finished download. Returns `false` when the response belongs
    /// to a track that is no longer current.
    pub fn apply(&mut self, generation: u64, text: Option<String>) -> bool {
        if generation != self.generation || self.track_id.is_none() {
            debug!(generation, current = self.generation, "dropping stale lyrics");
            return false;
        }

        let lines = text
            .filter(|t| !t.trim().is_empty())
            .map(|t| parse(&t))
            .unwrap_or_default();
        self.missing = lines.is_empty();
        self.lines = lines;
        self.active = None;
        true
    }

    /// Recompute the highlighted line for `position` seconds.
    pub fn update_position(&mut self, position: f64) -> Option<usize> {
        self.active = locate(&self.lines, position);
        self.active
    }

    /// First row to show so the active line sits in the middle of a
    /// `viewport`-row pane.
    pub fn scroll_offset(&self, viewport: usize) -> usize {
        match self.active {
            Some(active) => centered_offset(active, self.lines.len(), viewport),
            None => 0,
        }
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// The current track has no usable lyric file.
    pub fn missing(&self) -> bool {
        self.missing
    }

    /// A track is selected but its lyrics have not arrived yet.
    pub fn is_loading(&self) -> bool {
        self.track_id.is_some() && !self.missing && self.lines.is_empty()
    }
}

/// Offset that centres row `active` of `len` rows in a `viewport`-row window,
/// clamped so the window never scrolls past either end.
pub fn centered_offset(active: usize, len: usize, viewport: usize) -> usize {
    if viewport == 0 || len <= viewport {
        return 0;
    }
    let max_offset = len - viewport;
    active.saturating_sub(viewport / 2).min(max_offset)
}
