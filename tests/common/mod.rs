#![allow(dead_code)]

use std::{
    collections::{BTreeSet, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use favsync::{
    SyncError,
    spotify::LibraryClient,
    types::{AlbumTrack, LikedAlbum, Page, TrackId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SavedAlbums { offset: u32, limit: u32 },
    AlbumTracks { album_id: String, offset: u32 },
    Contains(Vec<TrackId>),
    Save(Vec<TrackId>),
}

/// In-memory Spotify library.
///
/// Albums are listed with at most `embedded_tracks` tracks each; the rest has to
/// be fetched through `album_tracks_page`, like the real album listing.
pub struct FakeLibrary {
    pub albums: Vec<LikedAlbum>,
    pub embedded_tracks: usize,
    pub liked: Mutex<BTreeSet<TrackId>>,
    pub calls: Mutex<Vec<Call>>,
    /// 0-based indexes of `save_tracks` calls that fail.
    pub failing_saves: HashSet<usize>,
    /// Album page offset that fails.
    pub failing_album_offset: Option<u32>,
    /// 0-based index of the `contains_saved_tracks` call that fails.
    pub failing_contains: Option<usize>,
    /// Answer status checks with one flag less than asked for.
    pub short_contains_answers: bool,
    /// From this 0-based `save_tracks` call on, saves are rejected with 401.
    pub revoked_from_save: Option<usize>,
}

impl FakeLibrary {
    pub fn new(albums: Vec<LikedAlbum>) -> Self {
        Self {
            albums,
            embedded_tracks: 50,
            liked: Mutex::new(BTreeSet::new()),
            calls: Mutex::new(Vec::new()),
            failing_saves: HashSet::new(),
            failing_album_offset: None,
            failing_contains: None,
            short_contains_answers: false,
            revoked_from_save: None,
        }
    }

    pub fn with_liked(self, ids: &[TrackId]) -> Self {
        self.liked.lock().unwrap().extend(ids.iter().cloned());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn liked(&self) -> BTreeSet<TrackId> {
        self.liked.lock().unwrap().clone()
    }

    pub fn save_calls(&self) -> Vec<Vec<TrackId>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Save(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn contains_calls(&self) -> Vec<Vec<TrackId>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Contains(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn album_page_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::SavedAlbums { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn page<T: Clone>(items: &[T], offset: u32, limit: u32) -> (Vec<T>, Option<u32>) {
    let start = (offset as usize).min(items.len());
    let end = (start + limit as usize).min(items.len());
    let next = (end < items.len()).then_some(end as u32);
    (items[start..end].to_vec(), next)
}

#[async_trait]
impl LibraryClient for FakeLibrary {
    async fn saved_albums_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<LikedAlbum>, SyncError> {
        self.record(Call::SavedAlbums { offset, limit });
        if self.failing_album_offset == Some(offset) {
            return Err(SyncError::Transient {
                message: "503 after retries".to_string(),
                retry_after: None,
            });
        }

        let (albums, next) = page(&self.albums, offset, limit);
        let items = albums
            .into_iter()
            .map(|mut album| {
                if album.tracks.len() > self.embedded_tracks {
                    album.tracks.truncate(self.embedded_tracks);
                    album.more_tracks_from = Some(self.embedded_tracks as u32);
                }
                album
            })
            .collect();

        Ok(Page {
            items,
            next,
            total: Some(self.albums.len() as u32),
        })
    }

    async fn album_tracks_page(
        &self,
        album_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<AlbumTrack>, SyncError> {
        self.record(Call::AlbumTracks {
            album_id: album_id.to_string(),
            offset,
        });

        let album = self
            .albums
            .iter()
            .find(|a| a.id == album_id)
            .ok_or_else(|| SyncError::Http {
                status: 404,
                message: format!("no album {album_id}"),
            })?;

        let (items, next) = page(&album.tracks, offset, limit);
        Ok(Page {
            items,
            next,
            total: None,
        })
    }

    async fn contains_saved_tracks(&self, ids: &[TrackId]) -> Result<Vec<bool>, SyncError> {
        let index = self.contains_calls().len();
        self.record(Call::Contains(ids.to_vec()));
        if self.failing_contains == Some(index) {
            return Err(SyncError::Transient {
                message: "504 after retries".to_string(),
                retry_after: None,
            });
        }

        let liked = self.liked.lock().unwrap();
        let mut answers: Vec<bool> = ids.iter().map(|id| liked.contains(id)).collect();
        if self.short_contains_answers {
            answers.pop();
        }
        Ok(answers)
    }

    async fn save_tracks(&self, ids: &[TrackId]) -> Result<(), SyncError> {
        let index = self.save_calls().len();
        self.record(Call::Save(ids.to_vec()));
        if self.revoked_from_save.is_some_and(|from| index >= from) {
            return Err(SyncError::Auth("401 token revoked".to_string()));
        }
        if self.failing_saves.contains(&index) {
            return Err(SyncError::Transient {
                message: "502 after retries".to_string(),
                retry_after: None,
            });
        }
        self.liked.lock().unwrap().extend(ids.iter().cloned());
        Ok(())
    }
}

/// Album `id` with `count` tracks named `{id}-t000`, `{id}-t001`, ...
pub fn album(id: &str, count: usize) -> LikedAlbum {
    album_with_tracks(
        id,
        &(0..count).map(|i| format!("{id}-t{i:03}")).collect::<Vec<_>>(),
    )
}

pub fn album_with_tracks(id: &str, track_ids: &[String]) -> LikedAlbum {
    LikedAlbum {
        id: id.to_string(),
        name: format!("Album {id}"),
        artist_name: "Artist".to_string(),
        tracks: track_ids
            .iter()
            .enumerate()
            .map(|(i, track_id)| AlbumTrack {
                id: track_id.clone(),
                name: format!("Song {i}"),
                track_number: i as u32 + 1,
            })
            .collect(),
        more_tracks_from: None,
    }
}
