use std::sync::mpsc::Sender;
use std::thread;

use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::remote::fetch_text;

use super::manifest::{manifest_url, parse_manifest};
use super::model::{Book, Track};

#[derive(Debug)]
pub struct CatalogResponse {
    pub generation: u64,
    pub book: Book,
    pub result: Result<Vec<Track>, CatalogError>,
}

/// Loads lesson lists off the event-loop thread.
pub struct CatalogFetcher {
    client: Client,
    base_url: String,
    tx: Sender<CatalogResponse>,
}

impl CatalogFetcher {
    pub fn new(client: Client, base_url: String, tx: Sender<CatalogResponse>) -> Self {
        Self {
            client,
            base_url,
            tx,
        }
    }

    pub fn request(&self, generation: u64, book: Book) {
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = load_book(&client, &base_url, book);
            match &result {
                Ok(tracks) => info!(%book, lessons = tracks.len(), "catalog loaded"),
                Err(e) => warn!(%book, error = %e, "catalog load failed"),
            }
            let _ = tx.send(CatalogResponse {
                generation,
                book,
                result,
            });
        });
    }
}

fn load_book(client: &Client, base_url: &str, book: Book) -> Result<Vec<Track>, CatalogError> {
    let json = fetch_text(client, &manifest_url(base_url))?;
    Ok(parse_manifest(&json, book, base_url)?)
}
