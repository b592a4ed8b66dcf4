use super::source::probe_duration;
use super::thread::coalesce_loads;
use super::*;
use crate::config::AudioSettings;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

/// Serve one audio request: headers for a 1000-byte body, then one byte
/// every `byte_every`, or nothing at all when it is `None`.
fn slow_server(byte_every: Option<Duration>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let Ok((mut sock, _)) = listener.accept() else {
            return;
        };
        let mut request = [0u8; 4096];
        let _ = sock.read(&mut request);
        let head = "HTTP/1.1 200 OK\r\nContent-Type: audio/mpeg\r\nContent-Length: 1000\r\n\r\n";
        if sock.write_all(head.as_bytes()).is_err() {
            return;
        }
        match byte_every {
            Some(delay) => {
                for _ in 0..1000 {
                    thread::sleep(delay);
                    if sock.write_all(b"x").and_then(|()| sock.flush()).is_err() {
                        return;
                    }
                }
            }
            None => thread::sleep(Duration::from_secs(30)),
        }
    });
    format!("http://{addr}/NCE1/slow.mp3")
}

fn load(id: u64) -> EngineCmd {
    EngineCmd::Load {
        load: LoadId(id),
        source: format!("/NCE1/{id}.mp3"),
    }
}

fn load_ids(cmds: &[EngineCmd]) -> Vec<u64> {
    cmds.iter()
        .filter_map(|c| match c {
            EngineCmd::Load { load, .. } => Some(load.0),
            _ => None,
        })
        .collect()
}

#[test]
fn clamp_rate_bounds_and_nan() {
    assert_eq!(clamp_rate(1.25), 1.25);
    assert_eq!(clamp_rate(0.1), MIN_RATE);
    assert_eq!(clamp_rate(3.0), MAX_RATE);
    assert_eq!(clamp_rate(f32::NAN), DEFAULT_RATE);
}

#[test]
fn clamp_seek_respects_known_duration() {
    assert_eq!(clamp_seek(12.0, Some(30.0)), 12.0);
    assert_eq!(clamp_seek(45.0, Some(30.0)), 30.0);
    assert_eq!(clamp_seek(-3.0, Some(30.0)), 0.0);
}

#[test]
fn clamp_seek_with_unknown_duration_only_floors() {
    assert_eq!(clamp_seek(45.0, None), 45.0);
    assert_eq!(clamp_seek(45.0, Some(0.0)), 45.0);
    assert_eq!(clamp_seek(-1.0, None), 0.0);
    assert_eq!(clamp_seek(f64::NAN, None), 0.0);
}

#[test]
fn probe_duration_ignores_garbage() {
    assert_eq!(probe_duration(b"definitely not audio"), None);
    assert_eq!(probe_duration(&[]), None);
}

#[test]
fn engine_reports_failed_load_with_its_load_id() {
    let client = crate::remote::build_client(Duration::from_secs(1)).unwrap();
    let (mut engine, events) = AudioEngine::spawn(client, AudioSettings::default());

    let first = engine.load_and_play("/nonexistent/lesson-1.mp3").unwrap();
    let second = engine.load_and_play("/nonexistent/lesson-2.mp3").unwrap();
    assert!(second > first);

    // Whether or not an output device exists, the newest load fails. The
    // first may be skipped as superseded, but never reports after it.
    let mut failed = Vec::new();
    while failed.last() != Some(&second) {
        let ev = events.recv_timeout(Duration::from_secs(5)).unwrap();
        if let EngineEventKind::Error(msg) = ev.kind {
            assert!(!msg.is_empty());
            failed.push(ev.load);
        }
    }
    assert!(failed == vec![second] || failed == vec![first, second]);

    engine.shutdown(Duration::ZERO);
    assert!(engine.pause().is_err());
}

#[test]
fn engine_transport_calls_without_a_track_are_harmless() {
    let client = crate::remote::build_client(Duration::from_secs(1)).unwrap();
    let (mut engine, events) = AudioEngine::spawn(client, AudioSettings::default());

    assert!(engine.pause().is_ok());
    assert!(engine.resume().is_ok());
    assert!(engine.seek(10.0).is_ok());
    assert!(engine.set_rate(1.5).is_ok());
    assert!(engine.stop().is_ok());

    engine.shutdown(Duration::ZERO);
    assert!(events.try_iter().next().is_none());
}

#[test]
fn coalesce_keeps_newest_load_and_what_follows() {
    let batch = coalesce_loads(vec![
        load(1),
        EngineCmd::Seek(3.0),
        load(2),
        EngineCmd::SetRate(1.5),
        EngineCmd::Pause,
        load(3),
        EngineCmd::Pause,
    ]);
    assert_eq!(load_ids(&batch), vec![3]);
    assert!(matches!(batch[0], EngineCmd::SetRate(r) if r == 1.5));
    assert!(matches!(batch[2], EngineCmd::Pause));
    assert_eq!(batch.len(), 3);
}

#[test]
fn coalesce_keeps_quit_queued_before_a_load() {
    let batch = coalesce_loads(vec![load(1), EngineCmd::Quit { fade_out_ms: 0 }, load(2)]);
    assert!(matches!(batch[0], EngineCmd::Quit { .. }));
    assert_eq!(load_ids(&batch), vec![2]);

    let single = coalesce_loads(vec![load(4)]);
    assert_eq!(load_ids(&single), vec![4]);
}

#[test]
fn newer_load_abandons_slow_download() {
    let client = crate::remote::build_audio_client(Duration::from_secs(1)).unwrap();
    let (mut engine, events) = AudioEngine::spawn(client, AudioSettings::default());

    // The slow body would take 50 seconds to arrive.
    let slow = engine.load_and_play(&slow_server(Some(Duration::from_millis(50)))).unwrap();
    thread::sleep(Duration::from_millis(200));
    let started = Instant::now();
    let next = engine.load_and_play("/nonexistent/lesson-2.mp3").unwrap();

    loop {
        let ev = events.recv_timeout(Duration::from_secs(5)).unwrap();
        if ev.load == next {
            assert!(matches!(ev.kind, EngineEventKind::Error(_)));
            break;
        }
        assert_eq!(ev.load, slow);
    }
    assert!(started.elapsed() < Duration::from_secs(3));
    engine.shutdown(Duration::ZERO);
}

#[test]
fn shutdown_does_not_wait_for_a_stalled_download() {
    let client = crate::remote::build_audio_client(Duration::from_secs(1)).unwrap();
    let (mut engine, _events) = AudioEngine::spawn(client, AudioSettings::default());
    engine.load_and_play(&slow_server(None)).unwrap();
    thread::sleep(Duration::from_millis(200));

    let started = Instant::now();
    engine.shutdown(Duration::ZERO);
    assert!(started.elapsed() < Duration::from_secs(5));
}
