//! MPRIS (D-Bus) adapter: the desktop media keys and lock screen talk to the
//! player through `org.mpris.MediaPlayer2.nceplay`.
//!
//! The bus runs on its own thread. Commands flow to the event loop as
//! [`ControlCmd`]s; state flows back through [`MprisHandle`], which is the
//! session's [`MediaSurface`].

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::{Connection, interface, object_server::InterfaceRef};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::media::{MediaMetadata, MediaSurface, PlaybackStatus};
use crate::playback::{DEFAULT_RATE, MAX_RATE, MIN_RATE};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.nceplay";
const NOTIFY_POLL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in seconds.
    SeekBy(f64),
    /// Absolute seek in seconds.
    SeekTo(f64),
    SetRate(f32),
}

#[derive(Debug)]
struct SharedState {
    status: PlaybackStatus,
    metadata: Option<MediaMetadata>,
    position: f64,
    duration: f64,
    rate: f64,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::default(),
            metadata: None,
            position: 0.0,
            duration: 0.0,
            rate: f64::from(DEFAULT_RATE),
        }
    }
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MediaSurface for MprisHandle {
    fn set_metadata(&self, metadata: Option<MediaMetadata>) {
        if let Ok(mut s) = self.state.lock() {
            s.duration = metadata.as_ref().map_or(0.0, |m| m.length);
            s.position = 0.0;
            s.metadata = metadata;
        }
        let _ = self.notify.send(());
    }

    fn set_status(&self, status: PlaybackStatus) {
        let changed = match self.state.lock() {
            Ok(mut s) => {
                let changed = s.status != status;
                s.status = status;
                changed
            }
            Err(_) => false,
        };
        if changed {
            let _ = self.notify.send(());
        }
    }

    fn set_position(&self, position: f64, duration: f64) {
        let length_learned = match self.state.lock() {
            Ok(mut s) => {
                s.position = position;
                let learned = s.duration <= 0.0 && duration > 0.0;
                s.duration = duration;
                learned
            }
            Err(_) => false,
        };
        // Position is polled by clients, but a newly known length changes metadata.
        if length_learned {
            let _ = self.notify.send(());
        }
    }

    fn set_rate(&self, rate: f32) {
        let changed = match self.state.lock() {
            Ok(mut s) => {
                let rate = f64::from(rate);
                let changed = s.rate != rate;
                s.rate = rate;
                changed
            }
            Err(_) => false,
        };
        if changed {
            let _ = self.notify.send(());
        }
    }
}

/// Maps a track id onto the object-path alphabet `[A-Za-z0-9_]`.
pub(crate) fn track_object_path(track_id: &str) -> String {
    let mut path = format!("{OBJECT_PATH}/track/");
    for b in track_id.bytes() {
        if b.is_ascii_alphanumeric() {
            path.push(b as char);
        } else {
            path.push_str(&format!("_{b:02x}"));
        }
    }
    path
}

fn micros(seconds: f64) -> i64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1_000_000.0) as i64
    } else {
        0
    }
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "nceplay"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn send(&self, cmd: ControlCmd) {
        if self.tx.send(cmd).is_err() {
            debug!("mpris command dropped: event loop is gone");
        }
    }

    fn has_track(&self) -> bool {
        self.state.lock().is_ok_and(|s| s.metadata.is_some())
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    /// `offset` is in microseconds.
    fn seek(&self, offset: i64) {
        self.send(ControlCmd::SeekBy(offset as f64 / 1_000_000.0));
    }

    /// Ignored unless `track_id` names the current track.
    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self
            .state
            .lock()
            .ok()
            .and_then(|s| s.metadata.as_ref().map(|m| track_object_path(&m.track_id)));
        if current.as_deref() == Some(track_id.as_str()) && position >= 0 {
            self.send(ControlCmd::SeekTo(position as f64 / 1_000_000.0));
        }
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.status {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }

    /// Microseconds into the current track.
    #[zbus(property)]
    fn position(&self) -> i64 {
        self.state.lock().map_or(0, |s| micros(s.position))
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        self.state.lock().map_or(f64::from(DEFAULT_RATE), |s| s.rate)
    }

    /// A rate of zero means pause; anything else is clamped by the session.
    #[zbus(property)]
    fn set_rate(&mut self, rate: f64) {
        if rate.is_nan() {
            return;
        }
        if rate <= 0.0 {
            self.send(ControlCmd::Pause);
        } else {
            self.send(ControlCmd::SetRate(rate as f32));
        }
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        f64::from(MIN_RATE)
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        f64::from(MAX_RATE)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        self.has_track()
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        self.has_track()
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.has_track()
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };
        let Some(m) = &s.metadata else {
            return map;
        };

        if let Ok(path) = ObjectPath::try_from(track_object_path(&m.track_id))
            && let Some(v) = owned(Value::from(path))
        {
            map.insert("mpris:trackid".to_string(), v);
        }
        let entries = [
            ("xesam:title", Value::from(m.title.clone())),
            ("xesam:artist", Value::from(vec![m.artist.clone()])),
            ("xesam:album", Value::from(m.album.clone())),
        ];
        for (key, value) in entries {
            if let Some(v) = owned(value) {
                map.insert(key.to_string(), v);
            }
        }
        let length = micros(s.duration.max(m.length));
        if length > 0
            && let Some(v) = owned(Value::from(length))
        {
            map.insert("mpris:length".to_string(), v);
        }
        map
    }
}

/// Start the D-Bus service on a background thread. Without a session bus the
/// handle still works; updates simply go nowhere.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("mpris".into())
        .spawn(move || block_on(serve(tx, state_for_thread, notify_rx)));
    if let Err(e) = spawned {
        warn!(error = %e, "cannot start mpris thread");
    }

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(tx: Sender<ControlCmd>, state: Arc<Mutex<SharedState>>, notify: Receiver<()>) {
    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            info!(error = %e, "mpris disabled: no session bus");
            return;
        }
    };

    if let Err(e) = connection.request_name(BUS_NAME).await {
        warn!(error = %e, "mpris: failed to acquire name");
        return;
    }

    let object_server = connection.object_server();

    if let Err(e) = object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await
    {
        warn!(error = %e, "mpris: failed to register root iface");
        return;
    }

    if let Err(e) = object_server.at(OBJECT_PATH, PlayerIface { tx, state }).await {
        warn!(error = %e, "mpris: failed to register player iface");
        return;
    }

    let iface_ref: InterfaceRef<PlayerIface> =
        match object_server.interface(OBJECT_PATH).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "mpris: player iface vanished");
                return;
            }
        };

    info!(name = BUS_NAME, "mpris registered");

    loop {
        Timer::after(NOTIFY_POLL).await;

        let mut changed = false;
        loop {
            match notify.try_recv() {
                Ok(()) => changed = true,
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return,
            }
        }
        if !changed {
            continue;
        }

        let iface = iface_ref.get().await;
        let emitter = iface_ref.signal_emitter();
        if let Err(e) = iface.playback_status_changed(emitter).await {
            debug!(error = %e, "mpris: status signal failed");
        }
        if let Err(e) = iface.metadata_changed(emitter).await {
            debug!(error = %e, "mpris: metadata signal failed");
        }
        if let Err(e) = iface.can_play_changed(emitter).await {
            debug!(error = %e, "mpris: capability signal failed");
        }
        if let Err(e) = iface.rate_changed(emitter).await {
            debug!(error = %e, "mpris: rate signal failed");
        }
    }
}
