//! AniList profile viewer backend: a GraphQL client and a short-lived
//! on-disk result cache in front of it.

mod cache;
mod client;
mod model;

pub use cache::{CacheEntry, CacheError, ResultCache};
pub use client::{ProfileError, fetch_activities, fetch_media_list, fetch_profile};
pub use model::*;

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use crate::config::{ProfileSettings, default_cache_dir};

const CACHE_FILE: &str = "anilist_data_cache.json";

pub type ProfileResult = Result<ProfileData, ProfileError>;

type Section<T> = Result<Vec<T>, ProfileError>;

/// Cache configured by `settings`, or `None` when no cache directory can be
/// determined.
pub fn profile_cache(settings: &ProfileSettings) -> Option<ResultCache> {
    let path: PathBuf = match &settings.cache_path {
        Some(p) => p.clone(),
        None => default_cache_dir()?.join(CACHE_FILE),
    };
    Some(ResultCache::new(path, Duration::from_secs(settings.cache_ttl_secs)))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Serve the profile from the cache while it is fresh, otherwise fetch it
/// and refresh the cache. `force` skips the cache lookup.
///
/// Only the user query is required. The activity feed and both media lists
/// are fetched concurrently afterwards; a failed one is logged and left
/// empty, and an incomplete result is not cached.
pub fn load_profile(
    agent: &ureq::Agent,
    settings: &ProfileSettings,
    cache: Option<&ResultCache>,
    force: bool,
) -> ProfileResult {
    if let Some(cache) = cache.filter(|_| !force) {
        if let Some(cached) = cache.read::<ProfileData>(now_ms()) {
            log::debug!("profile served from {}", cache.path().display());
            return Ok(cached);
        }
    }

    let user = fetch_profile(agent, &settings.endpoint, &settings.user_name)?;
    log::info!("fetched profile for {}", user.name);

    let (activities, anime_list, manga_list) = fetch_sections(agent, settings, user.id);
    let (data, complete) = assemble_profile(user, activities, anime_list, manga_list);

    match cache {
        Some(cache) if complete => {
            if let Err(e) = cache.write(&data, now_ms()) {
                log::warn!("{e}");
            }
        }
        Some(_) => log::debug!("profile incomplete, cache left untouched"),
        None => {}
    }
    Ok(data)
}

fn fetch_sections(
    agent: &ureq::Agent,
    settings: &ProfileSettings,
    user_id: u64,
) -> (Section<Activity>, Section<MediaListEntry>, Section<MediaListEntry>) {
    let endpoint = settings.endpoint.as_str();
    let user_name = settings.user_name.as_str();
    thread::scope(|s| {
        let activities = s.spawn(|| fetch_activities(agent, endpoint, user_id));
        let anime = s.spawn(|| fetch_media_list(agent, endpoint, user_name, MediaType::Anime));
        let manga = s.spawn(|| fetch_media_list(agent, endpoint, user_name, MediaType::Manga));

        (
            activities
                .join()
                .unwrap_or_else(|_| Err(ProfileError::Panicked("activity feed"))),
            anime
                .join()
                .unwrap_or_else(|_| Err(ProfileError::Panicked("anime list"))),
            manga
                .join()
                .unwrap_or_else(|_| Err(ProfileError::Panicked("manga list"))),
        )
    })
}

/// Combine the user with its auxiliary sections. Returns whether every
/// section arrived.
fn assemble_profile(
    user: Profile,
    activities: Section<Activity>,
    anime_list: Section<MediaListEntry>,
    manga_list: Section<MediaListEntry>,
) -> (ProfileData, bool) {
    let mut complete = true;
    let data = ProfileData {
        activities: section_or_empty("activity feed", activities, &mut complete),
        anime_list: section_or_empty("anime list", anime_list, &mut complete),
        manga_list: section_or_empty("manga list", manga_list, &mut complete),
        user,
    };
    (data, complete)
}

fn section_or_empty<T>(name: &str, section: Section<T>, complete: &mut bool) -> Vec<T> {
    section.unwrap_or_else(|e| {
        log::warn!("{name} unavailable: {e}");
        *complete = false;
        Vec::new()
    })
}

/// Load the profile on a background thread; the outcome arrives on the
/// returned channel.
pub fn spawn_profile_load(
    agent: ureq::Agent,
    settings: ProfileSettings,
    force: bool,
) -> Receiver<ProfileResult> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let cache = profile_cache(&settings);
        let _ = tx.send(load_profile(&agent, &settings, cache.as_ref(), force));
    });
    rx
}

#[cfg(test)]
mod tests;
