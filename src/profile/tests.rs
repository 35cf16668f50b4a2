use super::client::{
    GraphQlResponse, activities_from_response, media_list_from_response, profile_from_response,
};
use super::*;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::time::Duration;

const USER_JSON: &str = r#"{
  "id": 42,
  "name": "Reuzin",
  "about": "<p>Hello <b>there</b></p>",
  "avatar": { "large": "https://img.example/l.png", "medium": null },
  "bannerImage": null,
  "statistics": {
    "anime": { "count": 120, "episodesWatched": 1500, "meanScore": 78.5 },
    "manga": { "count": 3, "chaptersRead": 40, "meanScore": 0 }
  }
}"#;

fn user() -> Profile {
    serde_json::from_str(USER_JSON).unwrap()
}

fn response<T: serde::de::DeserializeOwned>(body: &str) -> GraphQlResponse<T> {
    serde_json::from_str(body).unwrap()
}

#[test]
fn profile_tolerates_missing_optional_fields() {
    let p = user();
    assert_eq!(p.id, 42);
    assert_eq!(p.banner_image, None);
    assert_eq!(p.statistics.anime.episodes_watched, 1500);
    assert_eq!(score_label(p.statistics.anime.mean_score), "78.5");
    assert_eq!(score_label(p.statistics.manga.mean_score), "N/A");

    let bare: Profile = serde_json::from_str(r#"{"id": 1, "name": "x"}"#).unwrap();
    assert_eq!(bare.about_preview(), None);
    assert_eq!(bare.statistics.manga.count, 0);
}

#[test]
fn about_preview_strips_markup_and_truncates() {
    assert_eq!(user().about_preview().as_deref(), Some("Hello there"));

    let mut p = user();
    p.about = Some("a".repeat(250));
    let preview = p.about_preview().unwrap();
    assert_eq!(preview.chars().count(), 203);
    assert!(preview.ends_with("..."));
}

#[test]
fn graphql_errors_take_precedence_over_data() {
    let err = profile_from_response(
        response(r#"{"data": {"User": null}, "errors": [{"message": "Not Found."}]}"#),
        "ghost",
    )
    .unwrap_err();
    assert!(matches!(err, ProfileError::Api(ref m) if m == "Not Found."));
}

#[test]
fn missing_user_is_not_found() {
    let err = profile_from_response(response(r#"{"data": {"User": null}}"#), "ghost").unwrap_err();
    assert_eq!(err.to_string(), "no profile named ghost");
}

#[test]
fn user_is_extracted_from_response() {
    let body = format!(r#"{{"data": {{"User": {USER_JSON}}}}}"#);
    let p = profile_from_response(response(&body), "Reuzin").unwrap();
    assert_eq!(p, user());
}

#[test]
fn cache_serves_fresh_entries_only() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ResultCache::new(dir.path().join("nested/cache.json"), Duration::from_secs(300));

    assert_eq!(cache.read::<u32>(1_000), None);
    cache.write(&7u32, 1_000).unwrap();

    assert_eq!(cache.read::<u32>(1_000 + 299_999), Some(7));
    assert_eq!(cache.read::<u32>(1_000 + 300_000), None);
}

#[test]
fn cache_file_uses_data_and_timestamp_keys() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ResultCache::new(dir.path().join("cache.json"), Duration::from_secs(300));
    cache.write(&"hi", 1234).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(cache.path()).unwrap()).unwrap();
    assert_eq!(raw["data"], "hi");
    assert_eq!(raw["timestamp"], 1234);
}

#[test]
fn malformed_cache_entry_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, "{not json").unwrap();

    let cache = ResultCache::new(&path, Duration::from_secs(300));
    assert_eq!(cache.read::<u32>(0), None);
    assert!(!path.exists());
}

fn unreachable_settings(cache_path: std::path::PathBuf) -> crate::config::ProfileSettings {
    crate::config::ProfileSettings {
        endpoint: "http://127.0.0.1:9/graphql".to_string(),
        cache_path: Some(cache_path),
        ..Default::default()
    }
}

#[test]
fn load_profile_prefers_a_fresh_cache() {
    let dir = tempfile::tempdir().unwrap();
    let settings = unreachable_settings(dir.path().join("anilist.json"));
    let cache = profile_cache(&settings).unwrap();
    cache
        .write(
            &serde_json::json!({ "user": serde_json::from_str::<serde_json::Value>(USER_JSON).unwrap() }),
            chrono::Utc::now().timestamp_millis(),
        )
        .unwrap();

    let agent = ureq::AgentBuilder::new().build();
    let p = load_profile(&agent, &settings, Some(&cache), false).unwrap();
    assert_eq!(p.user.name, "Reuzin");
    assert!(p.activities.is_empty());

    let err = load_profile(&agent, &settings, Some(&cache), true).unwrap_err();
    assert!(matches!(err, ProfileError::Request { .. }));
}

#[test]
fn profile_cache_uses_configured_path() {
    let settings = unreachable_settings("/tmp/tandem-profile.json".into());
    let cache = profile_cache(&settings).unwrap();
    assert_eq!(cache.path(), std::path::Path::new("/tmp/tandem-profile.json"));
}

const ACTIVITIES_JSON: &str = r#"{"data": {"Page": {"activities": [
  {"id": 9, "type": "ANIME_LIST", "status": "watched episode", "progress": "3", "createdAt": 1700000000,
   "media": {"id": 5, "title": {"romaji": "Mushishi"}, "coverImage": {"large": null}, "siteUrl": "https://anilist.co/anime/5"}},
  {}
]}}}"#;

const ANIME_LIST_JSON: &str = r#"{"data": {"MediaListCollection": {"lists": [
  {"entries": [{"media": {"id": 5, "title": {"romaji": "Mushishi", "english": "Mushi-Shi"}, "genres": ["Mystery"], "episodes": 26},
                "status": "COMPLETED", "score": 9.5, "progress": 26}]},
  {"entries": [{"media": {"id": 6, "title": {"romaji": "Aria"}}, "status": "PLANNING", "score": 0, "progress": null}]}
]}}}"#;

#[test]
fn activity_feed_keeps_list_activities_only() {
    let activities = activities_from_response(response(ACTIVITIES_JSON)).unwrap();
    assert_eq!(activities.len(), 1);
    let a = &activities[0];
    assert_eq!(a.summary(), "watched episode 3 of");
    assert_eq!(a.date_label(), "Nov 14, 2023");
    assert_eq!(a.media.as_ref().unwrap().title.display(), "Mushishi");
}

#[test]
fn media_list_is_flattened_across_groups() {
    let entries = media_list_from_response(response(ANIME_LIST_JSON)).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].media.title.display(), "Mushi-Shi");
    assert_eq!(entries[1].media.title.display(), "Aria");
    assert_eq!(entries[1].progress, None);

    let top = top_rated(&entries, 1);
    assert_eq!(top[0].media.id, 5);
}

#[test]
fn missing_collection_is_an_error() {
    let err = media_list_from_response(response(r#"{"data": {"MediaListCollection": null}}"#))
        .unwrap_err();
    assert!(matches!(err, ProfileError::Empty("media list")));
}

#[test]
fn failed_section_is_left_empty_and_marks_the_profile_incomplete() {
    let anime = media_list_from_response(response(ANIME_LIST_JSON));
    let (data, complete) = assemble_profile(
        user(),
        Err(ProfileError::Api("Private".to_string())),
        anime,
        Ok(Vec::new()),
    );

    assert!(!complete);
    assert!(data.activities.is_empty());
    assert_eq!(data.anime_list.len(), 2);
    assert_eq!(data.user, user());
}

#[test]
fn all_sections_present_is_complete() {
    let (data, complete) = assemble_profile(user(), Ok(Vec::new()), Ok(Vec::new()), Ok(Vec::new()));
    assert!(complete);
    assert_eq!(data.user.name, "Reuzin");
}

#[test]
fn cached_profile_data_uses_camel_case_sections() {
    let data = ProfileData {
        user: user(),
        activities: Vec::new(),
        anime_list: media_list_from_response(response(ANIME_LIST_JSON)).unwrap(),
        manga_list: Vec::new(),
    };
    let raw = serde_json::to_value(&data).unwrap();
    assert_eq!(raw["user"]["name"], "Reuzin");
    assert_eq!(raw["animeList"].as_array().unwrap().len(), 2);
    assert!(raw["mangaList"].as_array().unwrap().is_empty());
}

/// Serve canned GraphQL answers, chosen by what the query asks for.
fn serve_graphql(manga_body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut body = vec![0; content_length];
            let _ = reader.read_exact(&mut body);
            let body = String::from_utf8_lossy(&body);

            let answer = if body.contains("MediaListCollection") {
                if body.contains("\"type\":\"MANGA\"") {
                    manga_body
                } else {
                    ANIME_LIST_JSON
                }
            } else if body.contains("activities") {
                ACTIVITIES_JSON
            } else {
                USER_RESPONSE_JSON
            };
            let _ = write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                answer.len(),
                answer
            );
        }
    });
    format!("http://{addr}/")
}

const USER_RESPONSE_JSON: &str = r#"{"data": {"User": {"id": 42, "name": "Reuzin"}}}"#;

fn served_settings(endpoint: String, cache_path: std::path::PathBuf) -> crate::config::ProfileSettings {
    crate::config::ProfileSettings {
        endpoint,
        cache_path: Some(cache_path),
        ..Default::default()
    }
}

#[test]
fn complete_profile_is_fetched_and_cached() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = serve_graphql(r#"{"data": {"MediaListCollection": {"lists": []}}}"#);
    let settings = served_settings(endpoint, dir.path().join("anilist.json"));
    let cache = profile_cache(&settings).unwrap();

    let agent = ureq::AgentBuilder::new().build();
    let data = load_profile(&agent, &settings, Some(&cache), false).unwrap();
    assert_eq!(data.user.id, 42);
    assert_eq!(data.activities.len(), 1);
    assert_eq!(data.anime_list.len(), 2);
    assert!(data.manga_list.is_empty());

    assert_eq!(cache.read::<ProfileData>(now_ms()), Some(data));
}

#[test]
fn failed_auxiliary_fetch_empties_its_section_and_skips_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = serve_graphql(r#"{"errors": [{"message": "Private list"}]}"#);
    let settings = served_settings(endpoint, dir.path().join("anilist.json"));
    let cache = profile_cache(&settings).unwrap();

    let agent = ureq::AgentBuilder::new().build();
    let data = load_profile(&agent, &settings, Some(&cache), false).unwrap();
    assert!(data.manga_list.is_empty());
    assert_eq!(data.anime_list.len(), 2);
    assert_eq!(data.activities.len(), 1);

    assert!(!cache.path().exists());
}
