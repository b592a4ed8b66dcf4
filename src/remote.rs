//! Fetching manifests, lyric files and audio from the course server.
//!
//! `http://` and `https://` sources go through a blocking client;
//! `file://` URLs and bare paths are read from disk so a mirrored copy of the
//! course can be played offline.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::RemoteError;

const USER_AGENT: &str = concat!("nceplay/", env!("CARGO_PKG_VERSION"));

/// Size of each read while streaming a response body.
const CHUNK_SIZE: usize = 64 * 1024;

/// Build the HTTP client used for manifests and lyric files. `timeout`
/// bounds the whole request, body included.
pub fn build_client(timeout: Duration) -> Result<Client, RemoteError> {
    let client = Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
    Ok(client)
}

/// Build the HTTP client used for lesson audio. Only connecting is bounded;
/// a slow but live download runs to completion.
pub fn build_audio_client(connect_timeout: Duration) -> Result<Client, RemoteError> {
    let client = Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(None::<Duration>)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

pub fn fetch_text(client: &Client, url: &str) -> Result<String, RemoteError> {
    let bytes = fetch_bytes(client, url)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>, RemoteError> {
    fetch_bytes_while(client, url, || true)
}

/// Like [`fetch_bytes`], but checks `keep_going` before each chunk of the
/// body and gives up with [`RemoteError::Cancelled`] once it returns false.
pub fn fetch_bytes_while(
    client: &Client,
    url: &str,
    mut keep_going: impl FnMut() -> bool,
) -> Result<Vec<u8>, RemoteError> {
    let cancelled = || RemoteError::Cancelled { url: url.to_string() };
    if !keep_going() {
        return Err(cancelled());
    }

    if !is_http(url) {
        let path = local_path(url);
        return std::fs::read(&path).map_err(|source| RemoteError::Io { path, source });
    }

    let mut resp = client.get(url).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(RemoteError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let mut body = Vec::with_capacity(resp.content_length().unwrap_or(0) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        if !keep_going() {
            return Err(cancelled());
        }
        let n = resp.read(&mut chunk).map_err(|source| RemoteError::Io {
            path: url.to_string(),
            source,
        })?;
        if n == 0 {
            return Ok(body);
        }
        body.extend_from_slice(&chunk[..n]);
    }
}

fn is_http(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Map a `file://` URL or a plain path to a filesystem path, undoing the
/// percent-encoding applied when the URL was built.
pub(crate) fn local_path(url: &str) -> String {
    let raw = url.strip_prefix("file://").unwrap_or(url);
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}
