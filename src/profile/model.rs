use serde::{Deserialize, Serialize};

/// AniList user profile as returned by the profile query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub statistics: Statistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    #[serde(default)]
    pub large: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub anime: AnimeStatistics,
    pub manga: MangaStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimeStatistics {
    pub count: u32,
    pub episodes_watched: u32,
    pub mean_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MangaStatistics {
    pub count: u32,
    pub chapters_read: u32,
    pub mean_score: f64,
}

/// Everything the profile popup shows, cached as one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub user: Profile,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub anime_list: Vec<MediaListEntry>,
    #[serde(default)]
    pub manga_list: Vec<MediaListEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Anime,
    Manga,
}

impl MediaType {
    /// GraphQL enum value.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Anime => "ANIME",
            MediaType::Manga => "MANGA",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
}

impl MediaTitle {
    /// English title when there is one, romaji otherwise.
    pub fn display(&self) -> &str {
        self.english
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.romaji.as_deref())
            .unwrap_or("Untitled")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverImage {
    pub large: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Media {
    pub id: u64,
    pub title: MediaTitle,
    pub cover_image: Option<CoverImage>,
    pub site_url: Option<String>,
    pub genres: Vec<String>,
    pub episodes: Option<u32>,
    pub chapters: Option<u32>,
}

/// One entry of the activity feed. The feed query only selects list
/// activities; other kinds arrive as empty objects and carry no media.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Activity {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub progress: Option<String>,
    pub created_at: i64,
    pub media: Option<Media>,
}

impl Activity {
    /// "watched episode 3 of", "completed", ...
    pub fn summary(&self) -> String {
        let status = self.status.as_deref().unwrap_or("updated");
        match self.progress.as_deref().filter(|p| !p.is_empty()) {
            Some(progress) => format!("{status} {progress} of"),
            None => status.to_string(),
        }
    }

    /// Creation date as `Mon D, YYYY`.
    pub fn date_label(&self) -> String {
        chrono::DateTime::from_timestamp(self.created_at, 0)
            .map(|d| d.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// A title on one of the user's lists with the user's own progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaListEntry {
    pub media: Media,
    pub status: Option<String>,
    pub score: f64,
    pub progress: Option<u32>,
}

/// The highest scored entries first, ties keep list order.
pub fn top_rated(entries: &[MediaListEntry], limit: usize) -> Vec<&MediaListEntry> {
    let mut sorted: Vec<&MediaListEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    sorted.truncate(limit);
    sorted
}

const ABOUT_PREVIEW_CHARS: usize = 200;

impl Profile {
    /// Plain-text preview of the about section: markup stripped, truncated
    /// to 200 characters.
    pub fn about_preview(&self) -> Option<String> {
        let about = self.about.as_deref()?;
        let plain = strip_markup(about);
        let plain = plain.trim();
        if plain.is_empty() {
            return None;
        }
        if plain.chars().count() > ABOUT_PREVIEW_CHARS {
            let cut: String = plain.chars().take(ABOUT_PREVIEW_CHARS).collect();
            Some(format!("{cut}..."))
        } else {
            Some(plain.to_string())
        }
    }
}

/// A zero mean score means the user has not rated anything yet.
pub fn score_label(mean_score: f64) -> String {
    if mean_score > 0.0 {
        format!("{mean_score:.1}")
    } else {
        "N/A".to_string()
    }
}

fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
