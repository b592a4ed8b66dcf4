use std::sync::LazyLock;

use regex::Regex;

/// A single caption and the playback time (seconds) it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    pub time: f64,
    pub text: String,
}

static TIME_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{1,2}):(\d{2})(?:\.(\d{1,3}))?\]").expect("time tag pattern is valid")
});

/// Convert one `[mm:ss.fff]` capture into seconds.
fn tag_seconds(caps: &regex::Captures<'_>) -> Option<f64> {
    let minutes: u32 = caps.get(1)?.as_str().parse().ok()?;
    let seconds: u32 = caps.get(2)?.as_str().parse().ok()?;
    // "5" means 500ms and "05" means 50ms: pad on the right to three digits.
    let millis: u32 = match caps.get(3) {
        Some(m) => format!("{:0<3}", m.as_str()).parse().ok()?,
        None => 0,
    };

    let time = f64::from(minutes) * 60.0 + f64::from(seconds) + f64::from(millis) / 1000.0;
    time.is_finite().then_some(time)
}

/// Parse LRC text into lines sorted by time.
///
/// Each time tag on a line produces its own entry sharing the line's text.
/// Lines without tags (`[ti:...]`, blank lines, comments) are skipped, and
/// nothing here fails: garbage in gives an empty set out.
pub fn parse(raw: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for line in raw.lines() {
        let times: Vec<f64> = TIME_TAG
            .captures_iter(line)
            .filter_map(|caps| tag_seconds(&caps))
            .collect();
        if times.is_empty() {
            continue;
        }

        let text = TIME_TAG.replace_all(line, "").trim().to_string();
        lines.extend(times.into_iter().map(|time| LyricLine {
            time,
            text: text.clone(),
        }));
    }

    // Stable, so lines sharing a timestamp keep their file order.
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}
