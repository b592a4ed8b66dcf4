use std::collections::HashMap;

use serde::Deserialize;

use super::label::lesson_label;
use super::model::{Book, Track};

/// One lesson as listed in `static/data.json`. Other fields (per-side titles
/// and texts) are ignored.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    title: String,
    filename: String,
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

pub fn manifest_url(base_url: &str) -> String {
    format!("{}/static/data.json", trim_base(base_url))
}

fn track_from_entry(base_url: &str, book: Book, entry: ManifestEntry) -> Track {
    let stem = format!(
        "{}/NCE{}/{}",
        trim_base(base_url),
        book.number(),
        urlencoding::encode(&entry.filename)
    );
    Track {
        id: format!("{}:{}", book.number(), entry.filename),
        book,
        lesson_label: lesson_label(&entry.filename),
        audio_url: format!("{stem}.mp3"),
        lyric_url: format!("{stem}.lrc"),
        title: entry.title,
        filename: entry.filename,
    }
}

/// Extract the lessons of `book` from the manifest JSON, in manifest order.
/// A book missing from the manifest has no lessons.
pub fn parse_manifest(
    json: &str,
    book: Book,
    base_url: &str,
) -> Result<Vec<Track>, serde_json::Error> {
    let mut books: HashMap<String, Vec<ManifestEntry>> = serde_json::from_str(json)?;
    let entries = books.remove(&book.number().to_string()).unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|entry| track_from_entry(base_url, book, entry))
        .collect())
}
