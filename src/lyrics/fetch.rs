use std::sync::mpsc::Sender;
use std::thread;

use reqwest::blocking::Client;
use tracing::debug;

use crate::remote::fetch_text;

use super::sync::LyricRequest;

/// Result of a lyric download. `text` is `None` when the file is absent,
/// unreachable or blank; that is the common case, not an error.
#[derive(Debug)]
pub struct LyricResponse {
    pub generation: u64,
    pub text: Option<String>,
}

/// Downloads lyric files off the event-loop thread.
pub struct LyricFetcher {
    client: Client,
    tx: Sender<LyricResponse>,
}

impl LyricFetcher {
    pub fn new(client: Client, tx: Sender<LyricResponse>) -> Self {
        Self { client, tx }
    }

    /// Start a download; the response is posted to the channel whenever it
    /// finishes. In-flight downloads are never aborted, only ignored.
    pub fn request(&self, req: LyricRequest) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let text = match fetch_text(&client, &req.url) {
                Ok(text) if !text.trim().is_empty() => Some(text),
                Ok(_) => None,
                Err(e) => {
                    debug!(url = %req.url, error = %e, "lyrics unavailable");
                    None
                }
            };
            let _ = tx.send(LyricResponse {
                generation: req.generation,
                text,
            });
        });
    }
}
