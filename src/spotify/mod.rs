//! # Spotify Integration Module
//!
//! This module is the integration layer between favsync and the Spotify Web API.
//! It provides the OAuth 2.0 PKCE flow used by `favsync auth` and a client for the
//! four library operations the sync core needs.
//!
//! ## Architecture
//!
//! ```text
//! Sync Core (pager, resolver, batcher)
//!          ↓
//! LibraryClient trait
//!          ↓
//! SpotifyClient (reqwest, retry, token refresh)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## API Coverage
//!
//! - `GET /me/albums` - Saved albums, with the first page of their tracks
//! - `GET /albums/{id}/tracks` - Remaining track pages of one album
//! - `GET /me/tracks/contains` - Liked status for up to 50 track IDs
//! - `PUT /me/tracks` - Like up to 50 track IDs
//! - `POST /api/token` - Token exchange and refresh
//!
//! ## Error Handling
//!
//! Every request carries a timeout. Timeouts, 5xx and 429 responses are retried
//! with exponential backoff (honoring `Retry-After`); 401/403 become
//! [`SyncError::Auth`] and other statuses [`SyncError::Http`], neither retried.

pub mod auth;
mod client;

pub use client::SpotifyClient;

use async_trait::async_trait;

use crate::{
    error::SyncError,
    types::{AlbumTrack, LikedAlbum, Page, TrackId},
};

/// The library operations the sync core depends on.
///
/// Implemented by [`SpotifyClient`] for the real service and by in-memory fakes
/// in tests.
#[async_trait]
pub trait LibraryClient: Send + Sync {
    /// One page of the user's saved albums, each with its first page of tracks.
    async fn saved_albums_page(&self, offset: u32, limit: u32)
    -> Result<Page<LikedAlbum>, SyncError>;

    /// One page of an album's track listing.
    async fn album_tracks_page(
        &self,
        album_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<AlbumTrack>, SyncError>;

    /// Liked status for each of `ids`, in the same order. At most 50 IDs.
    async fn contains_saved_tracks(&self, ids: &[TrackId]) -> Result<Vec<bool>, SyncError>;

    /// Marks `ids` as liked. At most 50 IDs.
    async fn save_tracks(&self, ids: &[TrackId]) -> Result<(), SyncError>;
}
