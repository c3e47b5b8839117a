use serde::{Deserialize, Serialize};

/// Separator between the artist string and title in an identity key
pub const KEY_SEPARATOR: &str = "_";

/// Separator used when joining several artist names into one cell
pub const ARTIST_SEPARATOR: &str = ", ";

/// One playlist entry as it will be written to the sheet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub artists: Vec<String>,
    pub album: String,
    pub title: String,
}

impl Track {
    #[cfg(test)]
    pub fn new(artists: Vec<String>, album: impl Into<String>, title: impl Into<String>) -> Self {
        Self { artists, album: album.into(), title: title.into() }
    }

    /// Artist names joined the way they appear in the artist column
    pub fn artist_display(&self) -> String {
        self.artists.join(ARTIST_SEPARATOR)
    }

    /// Dedup key, comparable with keys read back from the sheet
    pub fn identity_key(&self) -> String {
        identity_key(&self.artist_display(), &self.title)
    }
}

pub fn identity_key(artist: &str, title: &str) -> String {
    format!("{artist}{KEY_SEPARATOR}{title}")
}

///
/// Spotify wire types, only the fields the sync reads
///

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<PlaylistEntry>,
}

/// A playlist item payload, either a track or something we skip
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlaylistEntry {
    Track(TrackObject),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    pub name: String,
    #[serde(default)]
    pub album: Option<NamedObject>,
    #[serde(default)]
    pub artists: Vec<NamedObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedObject {
    #[serde(default)]
    pub name: Option<String>,
}

impl From<TrackObject> for Track {
    fn from(t: TrackObject) -> Self {
        let artists = t.artists
            .into_iter()
            .map(|a| a.name.unwrap_or_default())
            .collect();
        let album = t.album.and_then(|a| a.name).unwrap_or_default();
        Track { artists, album, title: t.name }
    }
}

impl PlaylistPage {
    /// Playable tracks on this page, in playlist order
    pub fn tracks(self) -> impl Iterator<Item = Track> {
        self.items
            .into_iter()
            .filter_map(|item| match item.track {
                Some(PlaylistEntry::Track(t)) => Some(Track::from(t)),
                _ => None,
            })
    }
}
