use async_trait::async_trait;

use crate::{
    error::SyncError,
    spotify::LibraryClient,
    sync::pager::PageSource,
    types::{AlbumTrack, LikedAlbum, Page},
};

/// The user's saved albums, as a [`PageSource`].
pub struct SavedAlbums<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: LibraryClient + ?Sized> SavedAlbums<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: LibraryClient + ?Sized> PageSource<LikedAlbum> for SavedAlbums<'_, C> {
    fn describe(&self) -> String {
        "saved albums".to_string()
    }

    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Page<LikedAlbum>, SyncError> {
        self.client.saved_albums_page(offset, limit).await
    }
}

/// The track listing of one album, as a [`PageSource`].
pub struct AlbumTracks<'a, C: ?Sized> {
    client: &'a C,
    album: &'a LikedAlbum,
}

impl<'a, C: LibraryClient + ?Sized> AlbumTracks<'a, C> {
    pub fn new(client: &'a C, album: &'a LikedAlbum) -> Self {
        Self { client, album }
    }
}

#[async_trait]
impl<C: LibraryClient + ?Sized> PageSource<AlbumTrack> for AlbumTracks<'_, C> {
    fn describe(&self) -> String {
        format!("tracks of {}", self.album)
    }

    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Page<AlbumTrack>, SyncError> {
        self.client
            .album_tracks_page(&self.album.id, offset, limit)
            .await
    }
}
