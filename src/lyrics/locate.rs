use super::parser::LyricLine;

/// Index of the line that should be highlighted at `position` seconds.
///
/// Returns the last line whose time is not after `position`. Before the
/// first timestamp the first line is returned, so a non-empty set always has
/// an active line; `None` only for an empty set. `lines` must be sorted.
pub fn locate(lines: &[LyricLine], position: f64) -> Option<usize> {
    if lines.is_empty() {
        return None;
    }
    let after = lines.partition_point(|line| line.time <= position);
    Some(after.saturating_sub(1))
}
