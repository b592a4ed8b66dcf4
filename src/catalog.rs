//! Lesson catalog: the four course books, their lessons and the URLs of each
//! lesson's audio and lyric files.

mod fetch;
mod label;
mod manifest;
mod model;

pub use fetch::{CatalogFetcher, CatalogResponse};
pub use label::lesson_label;
pub use manifest::{manifest_url, parse_manifest};
pub use model::*;
