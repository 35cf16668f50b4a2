use super::*;
use crate::config::CatalogSettings;
use std::fs;
use std::time::Duration;

const SAMPLE: &str = r#"[
  {
    "id": "science",
    "title": "Science",
    "thumbnail": "https://cdn.example/science.png",
    "audio": "https://cdn.example/science.mp3",
    "author": "Someone",
    "authorUrl": "https://example.com/@someone"
  },
  {
    "id": "second",
    "title": "Second",
    "audio": "/srv/music/second.ogg",
    "author": "Other"
  }
]"#;

fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new().build()
}

#[test]
fn parse_tracks_reads_camel_case_fields_and_defaults_optional_ones() {
    let tracks = parse_tracks(Mode::Primary, "inline", SAMPLE).unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, "science");
    assert_eq!(tracks[0].author_url, "https://example.com/@someone");
    assert_eq!(tracks[1].thumbnail, "");
    assert_eq!(tracks[1].author_url, "");
}

#[test]
fn parse_tracks_rejects_non_array_documents() {
    let err = parse_tracks(Mode::Alternate, "inline", r#"{"id": "x"}"#).unwrap_err();
    assert!(matches!(err, CatalogError::Parse { mode: Mode::Alternate, .. }));
    assert!(err.to_string().starts_with("alternate catalog at inline"));
}

#[test]
fn mode_other_flips_between_the_two_catalogs() {
    assert_eq!(Mode::Primary.other(), Mode::Alternate);
    assert_eq!(Mode::Alternate.other(), Mode::Primary);
    assert_eq!(Mode::default(), Mode::Primary);
}

#[test]
fn load_catalogs_reads_both_local_sources() {
    let dir = tempfile::tempdir().unwrap();
    let primary = dir.path().join("music.json");
    let alternate = dir.path().join("music-alt.json");
    fs::write(&primary, SAMPLE).unwrap();
    fs::write(
        &alternate,
        r#"[{"id": "m1", "title": "M1", "audio": "m1.mp3", "author": "A"}]"#,
    )
    .unwrap();

    let settings = CatalogSettings {
        primary: primary.to_string_lossy().into_owned(),
        alternate: alternate.to_string_lossy().into_owned(),
    };

    let catalogs = load_catalogs(&agent(), &settings).unwrap();
    assert_eq!(catalogs.get(Mode::Primary).len(), 2);
    assert_eq!(catalogs.get(Mode::Alternate).len(), 1);
    assert_eq!(catalogs.get(Mode::Alternate).get(0).unwrap().id, "m1");
}

#[test]
fn load_catalogs_fails_when_either_source_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let primary = dir.path().join("music.json");
    fs::write(&primary, SAMPLE).unwrap();

    let settings = CatalogSettings {
        primary: primary.to_string_lossy().into_owned(),
        alternate: dir.path().join("missing.json").to_string_lossy().into_owned(),
    };

    let err = load_catalogs(&agent(), &settings).unwrap_err();
    assert!(matches!(err, CatalogError::Io { mode: Mode::Alternate, .. }));
}

#[test]
fn spawn_catalog_load_delivers_a_single_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("music.json");
    fs::write(&path, SAMPLE).unwrap();
    let locator = path.to_string_lossy().into_owned();

    let rx = spawn_catalog_load(
        agent(),
        CatalogSettings {
            primary: locator.clone(),
            alternate: locator,
        },
    );

    let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let catalogs = result.unwrap();
    assert_eq!(catalogs.get(Mode::Primary), catalogs.get(Mode::Alternate));
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}
