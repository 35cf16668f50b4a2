use std::collections::HashMap;

use crate::catalog::Track;
use crate::config::OverrideSettings;

/// Replacement fields for a track while its override is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackContent {
    pub title: String,
    pub author: String,
    pub author_url: String,
    pub thumbnail: String,
    pub audio: String,
}

impl From<&OverrideSettings> for TrackContent {
    fn from(o: &OverrideSettings) -> Self {
        Self {
            title: o.title.clone(),
            author: o.author.clone(),
            author_url: o.author_url.clone(),
            thumbnail: o.thumbnail.clone(),
            audio: o.audio.clone(),
        }
    }
}

/// Track id → substitute content.
#[derive(Debug, Clone, Default)]
pub struct OverrideRegistry {
    entries: HashMap<String, TrackContent>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(overrides: &[OverrideSettings]) -> Self {
        let mut registry = Self::new();
        for o in overrides {
            registry.insert(o.track_id.clone(), TrackContent::from(o));
        }
        registry
    }

    /// Register (or replace) the substitute for `track_id`.
    pub fn insert(&mut self, track_id: impl Into<String>, content: TrackContent) {
        self.entries.insert(track_id.into(), content);
    }

    pub fn get(&self, track_id: &str) -> Option<&TrackContent> {
        self.entries.get(track_id)
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.entries.contains_key(track_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-time view of a track with its override applied when active.
/// Never mutates the underlying track.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveTrack<'a> {
    track: &'a Track,
    substitute: Option<&'a TrackContent>,
}

impl<'a> EffectiveTrack<'a> {
    pub fn resolve(track: &'a Track, registry: &'a OverrideRegistry, override_active: bool) -> Self {
        let substitute = if override_active {
            registry.get(&track.id)
        } else {
            None
        };
        Self { track, substitute }
    }

    pub fn id(&self) -> &'a str {
        &self.track.id
    }

    pub fn is_substituted(&self) -> bool {
        self.substitute.is_some()
    }

    pub fn title(&self) -> &'a str {
        self.substitute.map_or(&self.track.title, |s| &s.title)
    }

    pub fn author(&self) -> &'a str {
        self.substitute.map_or(&self.track.author, |s| &s.author)
    }

    pub fn author_url(&self) -> &'a str {
        self.substitute.map_or(&self.track.author_url, |s| &s.author_url)
    }

    pub fn thumbnail(&self) -> &'a str {
        self.substitute.map_or(&self.track.thumbnail, |s| &s.thumbnail)
    }

    pub fn audio(&self) -> &'a str {
        self.substitute.map_or(&self.track.audio, |s| &s.audio)
    }
}
