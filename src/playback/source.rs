//! Turning a track URL into a ready-to-play rodio `Sink`.

use std::io::Cursor;

use lofty::prelude::AudioFile;
use lofty::probe::Probe;
use reqwest::blocking::Client;
use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::TransportError;
use crate::remote::fetch_bytes_while;

pub(super) struct OpenedSource {
    pub sink: Sink,
    /// Seconds, when either the container or the decoder reports it.
    pub duration: Option<f64>,
}

/// Fetch `source` and prepare a paused `Sink` positioned at the start.
/// The download is abandoned as soon as `keep_going` returns false.
pub(super) fn open_sink(
    stream: &OutputStream,
    client: &Client,
    source: &str,
    keep_going: impl FnMut() -> bool,
) -> Result<OpenedSource, TransportError> {
    let bytes = fetch_bytes_while(client, source, keep_going)?;
    let probed = probe_duration(&bytes);

    let byte_len = bytes.len() as u64;
    let decoder = Decoder::builder()
        .with_data(Cursor::new(bytes))
        .with_byte_len(byte_len)
        .with_seekable(true)
        .build()
        .map_err(|e| TransportError::Decode(e.to_string()))?;

    let duration = probed.or_else(|| decoder.total_duration().map(|d| d.as_secs_f64()));

    let sink = Sink::connect_new(stream.mixer());
    sink.pause();
    sink.append(decoder);
    Ok(OpenedSource { sink, duration })
}

/// Read the duration from the container headers. MP3 decoders often cannot
/// report one without scanning the whole stream.
pub(super) fn probe_duration(bytes: &[u8]) -> Option<f64> {
    let tagged = Probe::new(Cursor::new(bytes))
        .guess_file_type()
        .ok()?
        .read()
        .ok()?;
    let duration = tagged.properties().duration();
    (!duration.is_zero()).then(|| duration.as_secs_f64())
}
