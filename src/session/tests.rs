use super::*;
use crate::catalog::{Book, Track};
use crate::error::TransportError;
use crate::media::{MediaMetadata, MediaSurface, PlaybackStatus};
use crate::playback::{EngineEvent, EngineEventKind, LoadId, Transport};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(String),
    Pause,
    Resume,
    Seek(f64),
    Rate(f32),
    Stop,
}

#[derive(Default, Clone)]
struct FakeTransport {
    calls: Rc<RefCell<Vec<Call>>>,
    next_load: Rc<Cell<u64>>,
    broken: Rc<Cell<bool>>,
}

impl FakeTransport {
    fn record(&self, call: Call) -> Result<(), TransportError> {
        if self.broken.get() {
            return Err(TransportError::Disconnected);
        }
        self.calls.borrow_mut().push(call);
        Ok(())
    }

    fn loads(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Load(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    fn last_load(&self) -> LoadId {
        LoadId(self.next_load.get())
    }
}

impl Transport for FakeTransport {
    fn load_and_play(&mut self, source: &str) -> Result<LoadId, TransportError> {
        self.record(Call::Load(source.to_string()))?;
        self.next_load.set(self.next_load.get() + 1);
        Ok(self.last_load())
    }

    fn pause(&mut self) -> Result<(), TransportError> {
        self.record(Call::Pause)
    }

    fn resume(&mut self) -> Result<(), TransportError> {
        self.record(Call::Resume)
    }

    fn seek(&mut self, seconds: f64) -> Result<(), TransportError> {
        self.record(Call::Seek(seconds))
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), TransportError> {
        self.record(Call::Rate(rate))
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        self.record(Call::Stop)
    }
}

#[derive(Default, Clone)]
struct FakeMedia {
    metadata: Rc<RefCell<Vec<Option<MediaMetadata>>>>,
    status: Rc<Cell<PlaybackStatus>>,
    position: Rc<Cell<(f64, f64)>>,
    rate: Rc<Cell<f32>>,
}

impl MediaSurface for FakeMedia {
    fn set_metadata(&self, metadata: Option<MediaMetadata>) {
        self.metadata.borrow_mut().push(metadata);
    }

    fn set_status(&self, status: PlaybackStatus) {
        self.status.set(status);
    }

    fn set_position(&self, position: f64, duration: f64) {
        self.position.set((position, duration));
    }

    fn set_rate(&self, rate: f32) {
        self.rate.set(rate);
    }
}

fn t(name: &str) -> Track {
    Track {
        id: format!("1:{name}"),
        book: Book::One,
        title: name.to_string(),
        lesson_label: format!("Lesson {name}"),
        filename: name.to_string(),
        audio_url: format!("https://example.com/NCE1/{name}.mp3"),
        lyric_url: format!("https://example.com/NCE1/{name}.lrc"),
    }
}

fn abc() -> Vec<Track> {
    vec![t("A"), t("B"), t("C")]
}

fn session() -> (Session<FakeTransport, FakeMedia>, FakeTransport, FakeMedia) {
    let transport = FakeTransport::default();
    let media = FakeMedia::default();
    let s = Session::new(transport.clone(), media.clone(), 1.0);
    (s, transport, media)
}

fn emit(s: &mut Session<FakeTransport, FakeMedia>, transport: &FakeTransport, kind: EngineEventKind) {
    s.handle_event(EngineEvent {
        load: transport.last_load(),
        kind,
    });
}

fn url(name: &str) -> String {
    format!("https://example.com/NCE1/{name}.mp3")
}

#[test]
fn new_session_is_idle_and_applies_rate() {
    let transport = FakeTransport::default();
    let s = Session::new(transport.clone(), FakeMedia::default(), 5.0);
    assert_eq!(s.state().current_index, None);
    assert_eq!(s.state().phase, Phase::Idle);
    assert_eq!(s.state().playback_rate, 2.0);
    assert_eq!(*transport.calls.borrow(), vec![Call::Rate(2.0)]);
}

#[test]
fn queue_scenario_auto_advance_and_bounds() {
    let (mut s, transport, _media) = session();

    s.set_queue_and_play(abc(), 0);
    assert_eq!(s.state().current_index, Some(0));
    assert_eq!(transport.loads(), vec![url("A")]);

    emit(&mut s, &transport, EngineEventKind::Play);
    emit(&mut s, &transport, EngineEventKind::Ended);
    assert_eq!(s.state().current_index, Some(1));
    assert_eq!(transport.loads().last(), Some(&url("B")));

    s.prev();
    assert_eq!(s.state().current_index, Some(0));
    assert_eq!(transport.loads().last(), Some(&url("A")));

    s.next();
    s.next();
    assert_eq!(s.state().current_index, Some(2));
    assert_eq!(transport.loads().last(), Some(&url("C")));

    let loads_before = transport.loads().len();
    s.next();
    assert_eq!(s.state().current_index, Some(2));
    assert_eq!(transport.loads().len(), loads_before);
}

#[test]
fn play_index_clamps_past_the_end() {
    let (mut s, transport, _media) = session();
    s.set_queue_and_play(abc(), 0);
    s.play_index(99);
    assert_eq!(s.state().current_index, Some(2));
    assert_eq!(transport.loads().last(), Some(&url("C")));

    s.set_queue_and_play(abc(), 7);
    assert_eq!(s.state().current_index, Some(2));
}

#[test]
fn play_index_on_empty_queue_is_noop() {
    let (mut s, transport, _media) = session();
    s.play_index(0);
    s.play_index(3);
    assert_eq!(s.state().current_index, None);
    assert!(transport.loads().is_empty());
    assert_eq!(s.state().phase, Phase::Idle);
}

#[test]
fn set_queue_and_play_with_empty_tracks_keeps_existing_queue() {
    let (mut s, transport, _media) = session();
    s.set_queue_and_play(abc(), 1);
    s.set_queue_and_play(Vec::new(), 0);
    assert_eq!(s.state().queue.len(), 3);
    assert_eq!(s.state().current_index, Some(1));
    assert_eq!(transport.loads().len(), 1);
}

#[test]
fn set_queue_and_play_replaces_queue_and_clears_error() {
    let (mut s, transport, _media) = session();
    s.set_queue_and_play(abc(), 0);
    emit(&mut s, &transport, EngineEventKind::Error("boom".into()));
    assert!(s.state().last_error.is_some());

    s.set_queue_and_play(vec![t("X"), t("Y")], 1);
    assert_eq!(s.state().queue.len(), 2);
    assert_eq!(s.current_track().map(|t| t.title.as_str()), Some("Y"));
    assert_eq!(s.state().last_error, None);
}

#[test]
fn next_at_end_and_prev_at_start_are_noops() {
    let (mut s, transport, _media) = session();
    s.set_queue_and_play(abc(), 0);
    s.prev();
    assert_eq!(s.state().current_index, Some(0));
    assert_eq!(transport.loads().len(), 1);

    s.play_index(2);
    s.next();
    assert_eq!(s.state().current_index, Some(2));
    assert_eq!(transport.loads().len(), 2);
}

#[test]
fn ended_on_last_track_stops_and_clears_media() {
    let (mut s, transport, media) = session();
    s.set_queue_and_play(abc(), 2);
    emit(&mut s, &transport, EngineEventKind::Play);
    assert!(s.state().is_playing);
    assert_eq!(media.status.get(), PlaybackStatus::Playing);

    emit(&mut s, &transport, EngineEventKind::Ended);
    assert!(!s.state().is_playing);
    assert_eq!(s.state().phase, Phase::Ended);
    assert_eq!(s.state().current_index, Some(2));
    assert_eq!(transport.loads().len(), 1);
    assert_eq!(media.metadata.borrow().last(), Some(&None));
    assert_eq!(media.status.get(), PlaybackStatus::Stopped);

    // A repeated end notification does nothing further.
    emit(&mut s, &transport, EngineEventKind::Ended);
    assert_eq!(transport.loads().len(), 1);
}

#[test]
fn track_change_pushes_media_metadata() {
    let (mut s, _transport, media) = session();
    s.set_queue_and_play(abc(), 1);
    let pushed = media.metadata.borrow().last().cloned().flatten().unwrap();
    assert_eq!(pushed.title, "Lesson B · B");
    assert_eq!(pushed.artist, "NCE1");
    assert_eq!(pushed.album, crate::media::ALBUM);
    assert_eq!(pushed.track_id, "1:B");
}

#[test]
fn failed_load_keeps_selection_and_records_error() {
    let (mut s, transport, _media) = session();
    s.set_queue_and_play(abc(), 0);
    transport.broken.set(true);

    s.play_index(1);
    assert_eq!(s.state().current_index, Some(1));
    assert!(!s.state().is_playing);
    assert_eq!(s.state().phase, Phase::Errored);
    assert!(s.state().last_error.as_deref().unwrap().contains("not running"));

    s.clear_error();
    assert_eq!(s.state().last_error, None);
    assert_eq!(s.state().current_index, Some(1));
}

#[test]
fn engine_error_is_recoverable_by_next_action() {
    let (mut s, transport, media) = session();
    s.set_queue_and_play(abc(), 0);
    emit(&mut s, &transport, EngineEventKind::Play);
    emit(&mut s, &transport, EngineEventKind::Error("decode failed".into()));
    assert_eq!(s.state().phase, Phase::Errored);
    assert!(!s.state().is_playing);
    assert_eq!(s.state().last_error.as_deref(), Some("decode failed"));
    assert_eq!(media.status.get(), PlaybackStatus::Stopped);

    s.toggle();
    assert_eq!(s.state().phase, Phase::Loading);
    assert_eq!(s.state().last_error, None);
    assert_eq!(transport.loads(), vec![url("A"), url("A")]);

    emit(&mut s, &transport, EngineEventKind::Play);
    assert_eq!(s.state().phase, Phase::Playing);
}

#[test]
fn events_from_superseded_loads_are_ignored() {
    let (mut s, transport, _media) = session();
    s.set_queue_and_play(abc(), 0);
    let stale = transport.last_load();
    s.play_index(1);

    s.handle_event(EngineEvent {
        load: stale,
        kind: EngineEventKind::Error("late failure of A".into()),
    });
    s.handle_event(EngineEvent {
        load: stale,
        kind: EngineEventKind::Ended,
    });
    assert_eq!(s.state().current_index, Some(1));
    assert_eq!(s.state().last_error, None);
    assert_eq!(s.state().phase, Phase::Loading);

    emit(&mut s, &transport, EngineEventKind::Play);
    assert_eq!(s.state().phase, Phase::Playing);
    assert_eq!(s.current_track().map(|t| t.title.as_str()), Some("B"));
}

#[test]
fn toggle_pauses_resumes_and_replays() {
    let (mut s, transport, _media) = session();
    s.set_queue_and_play(abc(), 0);
    emit(&mut s, &transport, EngineEventKind::Play);

    s.toggle();
    assert_eq!(transport.calls.borrow().last(), Some(&Call::Pause));
    emit(&mut s, &transport, EngineEventKind::Pause);
    assert_eq!(s.state().phase, Phase::Paused);
    assert!(!s.state().is_playing);

    s.toggle();
    assert_eq!(transport.calls.borrow().last(), Some(&Call::Resume));
    emit(&mut s, &transport, EngineEventKind::Play);
    assert!(s.state().is_playing);

    s.play_index(2);
    emit(&mut s, &transport, EngineEventKind::Play);
    emit(&mut s, &transport, EngineEventKind::Ended);
    s.toggle();
    assert_eq!(transport.loads().last(), Some(&url("C")));
    assert_eq!(s.state().phase, Phase::Loading);
}

#[test]
fn toggle_without_queue_does_nothing() {
    let (mut s, transport, _media) = session();
    s.toggle();
    assert!(transport.loads().is_empty());
    assert_eq!(s.state().phase, Phase::Idle);
}

#[test]
fn time_updates_reset_on_track_change() {
    let (mut s, transport, media) = session();
    s.set_queue_and_play(abc(), 0);
    emit(
        &mut s,
        &transport,
        EngineEventKind::TimeUpdate {
            current: 12.0,
            duration: 60.0,
        },
    );
    assert_eq!(s.state().current_time, 12.0);
    assert_eq!(s.state().duration, 60.0);
    assert_eq!(media.position.get(), (12.0, 60.0));
    assert!((s.state().progress() - 0.2).abs() < 1e-9);

    s.next();
    assert_eq!(s.state().current_time, 0.0);
    assert_eq!(s.state().duration, 0.0);
}

#[test]
fn time_update_is_clamped_to_duration() {
    let (mut s, transport, _media) = session();
    s.set_queue_and_play(abc(), 0);
    emit(
        &mut s,
        &transport,
        EngineEventKind::TimeUpdate {
            current: 75.0,
            duration: 60.0,
        },
    );
    assert_eq!(s.state().current_time, 60.0);
}

#[test]
fn seek_clamps_to_known_duration_and_keeps_play_state() {
    let (mut s, transport, _media) = session();
    s.seek(10.0);
    assert!(transport.calls.borrow().iter().all(|c| !matches!(c, Call::Seek(_))));

    s.set_queue_and_play(abc(), 0);
    emit(&mut s, &transport, EngineEventKind::Play);
    s.seek(30.0);
    assert_eq!(transport.calls.borrow().last(), Some(&Call::Seek(30.0)));

    emit(
        &mut s,
        &transport,
        EngineEventKind::TimeUpdate {
            current: 1.0,
            duration: 40.0,
        },
    );
    s.seek(100.0);
    assert_eq!(transport.calls.borrow().last(), Some(&Call::Seek(40.0)));
    assert_eq!(s.state().current_time, 40.0);
    s.seek(-5.0);
    assert_eq!(s.state().current_time, 0.0);
    assert!(s.state().is_playing);
}

#[test]
fn playback_rate_is_clamped_and_mirrored() {
    let (mut s, transport, media) = session();
    assert_eq!(media.rate.get(), 1.0);
    s.set_playback_rate(1.5);
    assert_eq!(s.state().playback_rate, 1.5);
    assert_eq!(media.rate.get(), 1.5);
    s.set_playback_rate(0.1);
    assert_eq!(s.state().playback_rate, 0.5);
    s.set_playback_rate(9.0);
    assert_eq!(s.state().playback_rate, 2.0);
    assert_eq!(transport.calls.borrow().last(), Some(&Call::Rate(2.0)));
    assert_eq!(media.rate.get(), 2.0);

    transport.broken.set(true);
    s.set_playback_rate(1.0);
    assert_eq!(s.state().playback_rate, 2.0);
    assert_eq!(media.rate.get(), 2.0);
}

#[test]
fn has_prev_and_next_follow_position() {
    let (mut s, _transport, _media) = session();
    assert!(!s.state().has_prev());
    assert!(!s.state().has_next());
    s.set_queue_and_play(abc(), 0);
    assert!(!s.state().has_prev());
    assert!(s.state().has_next());
    s.play_index(2);
    assert!(s.state().has_prev());
    assert!(!s.state().has_next());
}

#[test]
fn stop_keeps_selection_and_toggle_restarts() {
    let (mut s, transport, media) = session();
    s.stop();
    assert!(transport.calls.borrow().iter().all(|c| *c != Call::Stop));

    s.set_queue_and_play(abc(), 1);
    emit(&mut s, &transport, EngineEventKind::Play);
    s.stop();
    assert_eq!(transport.calls.borrow().last(), Some(&Call::Stop));
    assert_eq!(s.state().phase, Phase::Idle);
    assert_eq!(s.state().current_index, Some(1));
    assert!(!s.state().is_playing);
    assert_eq!(media.status.get(), PlaybackStatus::Stopped);

    // Late events from the stopped load are ignored.
    emit(&mut s, &transport, EngineEventKind::Play);
    assert!(!s.state().is_playing);

    s.toggle();
    assert_eq!(transport.loads().last(), Some(&url("B")));
}
