use reqwest::Url;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Opaque Spotify track identifier. Only ever taken from the API or the skiplist.
pub type TrackId = String;

/// Opaque Spotify album identifier.
pub type AlbumId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

impl Token {
    /// Builds a token from a token endpoint response obtained at `obtained_at`.
    ///
    /// Refresh responses may omit the refresh token; `previous_refresh` is kept
    /// in that case.
    pub fn from_response(
        response: TokenResponse,
        previous_refresh: Option<&str>,
        obtained_at: u64,
    ) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string))
                .unwrap_or_default(),
            scope: response.scope.unwrap_or_default(),
            expires_in: response.expires_in,
            obtained_at,
        }
    }
}

/// Body returned by the Spotify token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

/// Spotify's generic paging object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    pub total: Option<u32>,
}

impl<T> Paging<T> {
    /// Offset of the following page, or `None` on the last page.
    ///
    /// Read from the `offset` query parameter of the `next` link, falling back to
    /// the current offset plus the number of returned items.
    pub fn next_offset(&self) -> Option<u32> {
        let next = self.next.as_deref()?;
        let from_link = Url::parse(next).ok().and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "offset")
                .and_then(|(_, value)| value.parse::<u32>().ok())
        });
        Some(from_link.unwrap_or(self.offset + self.items.len() as u32))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAlbum {
    pub added_at: Option<String>,
    pub album: Album,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: String,
    #[serde(default)]
    pub release_date: String,
    pub artists: Vec<AlbumArtist>,
    pub tracks: Paging<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumArtist {
    pub id: Option<String>,
    pub name: String,
}

/// Simplified track object as embedded in albums and album track listings.
///
/// `id` is null for tracks that are unavailable or local files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub track_number: u32,
    #[serde(default)]
    pub duration_ms: u64,
}

/// One page of a remote collection, independent of the response shape it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Offset to request next, `None` once the service reports no further pages.
    pub next: Option<u32>,
    /// Total size of the collection, when the service reports one that matches
    /// the number of items it hands out.
    pub total: Option<u32>,
}

/// A track of a liked album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumTrack {
    pub id: TrackId,
    pub name: String,
    pub track_number: u32,
}

impl AlbumTrack {
    /// Converts a wire track, dropping tracks without an ID.
    pub fn from_track(track: Track) -> Option<Self> {
        Some(Self {
            id: track.id?,
            name: track.name,
            track_number: track.track_number,
        })
    }
}

/// A saved album with the tracks known so far.
#[derive(Debug, Clone, PartialEq)]
pub struct LikedAlbum {
    pub id: AlbumId,
    pub name: String,
    pub artist_name: String,
    pub tracks: Vec<AlbumTrack>,
    /// Offset of the first track not yet fetched. `None` when `tracks` is complete.
    pub more_tracks_from: Option<u32>,
}

impl LikedAlbum {
    pub fn track_ids(&self) -> impl Iterator<Item = &TrackId> {
        self.tracks.iter().map(|t| &t.id)
    }

    pub fn is_complete(&self) -> bool {
        self.more_tracks_from.is_none()
    }
}

impl From<Album> for LikedAlbum {
    fn from(album: Album) -> Self {
        let more_tracks_from = album.tracks.next_offset();
        let artist_name = album
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(",");

        Self {
            id: album.id,
            name: album.name,
            artist_name,
            tracks: album
                .tracks
                .items
                .into_iter()
                .filter_map(AlbumTrack::from_track)
                .collect(),
            more_tracks_from,
        }
    }
}

impl std::fmt::Display for LikedAlbum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Album({}: '{}')", self.artist_name, self.name)
    }
}

/// Body of `PUT /me/tracks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveTracksRequest {
    pub ids: Vec<TrackId>,
}

#[derive(Tabled)]
pub struct ReportTableRow {
    pub metric: String,
    pub count: usize,
}

#[derive(Tabled)]
pub struct BatchTableRow {
    pub batch: usize,
    pub tracks: usize,
    pub status: String,
}
