use super::source::{CurrentGeneration, fetch_source, probe_duration, read_while};
use super::types::OutputEvent;
use super::AudioError;
use std::cell::Cell;
use std::io::Cursor;
use std::time::Duration;

#[test]
fn output_event_generation_is_reported_for_every_variant() {
    let events = [
        OutputEvent::Ready { generation: 1 },
        OutputEvent::Duration {
            generation: 2,
            duration: Duration::from_secs(3),
        },
        OutputEvent::Position {
            generation: 3,
            position: Duration::ZERO,
        },
        OutputEvent::Ended { generation: 4 },
        OutputEvent::Failed {
            generation: 5,
            message: "boom".into(),
        },
    ];
    let generations: Vec<u64> = events.iter().map(OutputEvent::generation).collect();
    assert_eq!(generations, vec![1, 2, 3, 4, 5]);
}

#[test]
fn fetch_source_reads_local_files_into_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.ogg");
    std::fs::write(&path, b"not really audio").unwrap();

    let agent = ureq::AgentBuilder::new().build();
    let bytes = fetch_source(&agent, path.to_str().unwrap(), &CurrentGeneration::default(), 0).unwrap();
    assert_eq!(&bytes[..], b"not really audio");
}

#[test]
fn fetch_source_reports_missing_files_as_io_errors() {
    let agent = ureq::AgentBuilder::new().build();
    let err = fetch_source(
        &agent,
        "/definitely/not/here.mp3",
        &CurrentGeneration::default(),
        0,
    )
    .unwrap_err();
    assert!(matches!(err, AudioError::Io { .. }));
    assert!(err.to_string().contains("/definitely/not/here.mp3"));
}

#[test]
fn probe_duration_is_none_for_garbage() {
    assert_eq!(probe_duration(b"definitely not an audio container"), None);
}

#[test]
fn remote_fetch_for_a_replaced_source_is_not_started() {
    let current = CurrentGeneration::default();
    current.set(2);
    assert!(current.is(2));
    assert!(!current.is(1));

    let agent = ureq::AgentBuilder::new().build();
    let err = fetch_source(&agent, "http://127.0.0.1:9/old.mp3", &current, 1).unwrap_err();
    assert!(matches!(err, AudioError::Superseded { .. }));
}

#[test]
fn read_while_stops_between_chunks() {
    let data = vec![7u8; 200 * 1024];

    let all = read_while(Cursor::new(data.clone()), || true).unwrap();
    assert_eq!(all.map(|b| b.len()), Some(data.len()));

    let checks = Cell::new(0);
    let stopped = read_while(Cursor::new(data), || {
        checks.set(checks.get() + 1);
        checks.get() < 2
    })
    .unwrap();
    assert_eq!(stopped, None);
    assert_eq!(checks.get(), 2);
}
