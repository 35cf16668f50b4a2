use serde::Deserialize;

/// One entry of a catalog as published by the catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    pub audio: String,
    pub author: String,
    #[serde(default)]
    pub author_url: String,
}

/// Which of the two catalogs is active.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Primary,
    Alternate,
}

impl Mode {
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Alternate,
            Self::Alternate => Self::Primary,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Alternate => "alternate",
        }
    }
}

/// An ordered, immutable list of tracks loaded from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

/// Both catalogs, kept in memory together so switching never re-fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogs {
    primary: Catalog,
    alternate: Catalog,
}

impl Catalogs {
    pub fn new(primary: Catalog, alternate: Catalog) -> Self {
        Self { primary, alternate }
    }

    pub fn get(&self, mode: Mode) -> &Catalog {
        match mode {
            Mode::Primary => &self.primary,
            Mode::Alternate => &self.alternate,
        }
    }
}
