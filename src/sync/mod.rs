//! # Sync Module
//!
//! The core of favsync: make every track of every saved album a liked track.
//!
//! ```text
//! saved albums (pager) → complete track lists (resolver)
//!          ↓
//! album track IDs − skiplist = candidates
//!          ↓
//! liked status of candidates (batched) → delta
//!          ↓
//! like delta (batched, failures isolated per batch)
//! ```
//!
//! Everything up to the delta is the fetch phase: any error there aborts the run
//! before a single write is made. The like phase tolerates transient failures,
//! one batch at a time; auth and other permanent errors stop it. Nothing is persisted between runs, and liking a track twice
//! is harmless, so an interrupted run is simply repeated.

mod batch;
mod pager;
mod report;
mod resolver;
mod skiplist;
mod sources;

pub use batch::{batches, check_liked, like_tracks};
pub use pager::{PageSource, fetch_all};
pub use report::{BatchOutcome, BatchStatus, RunReport};
pub use resolver::{album_track_ids, complete_album_tracks};
pub use skiplist::{ID_COLUMN, column_index, load_skiplist, parse_skiplist};
pub use sources::{AlbumTracks, SavedAlbums};

use std::{
    collections::{BTreeSet, HashSet},
    time::Instant,
};

use indicatif::ProgressBar;

use crate::{
    config, debug,
    error::SyncError,
    spotify::LibraryClient,
    types::{LikedAlbum, TrackId},
};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Compute the delta but do not like anything.
    pub dry_run: bool,
    pub page_limit: u32,
    pub batch_limit: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            page_limit: config::PAGE_LIMIT,
            batch_limit: config::BATCH_LIMIT,
        }
    }
}

/// Result of a successful run: the report plus the albums with complete track
/// lists, for callers that want to export them.
#[derive(Debug)]
pub struct SyncOutcome {
    pub report: RunReport,
    pub albums: Vec<LikedAlbum>,
}

/// Album track IDs split by the skiplist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidates {
    pub candidates: BTreeSet<TrackId>,
    pub skipped: BTreeSet<TrackId>,
}

/// Splits the album track IDs into candidates and skiplisted tracks.
pub fn split_candidates(
    album_tracks: BTreeSet<TrackId>,
    skiplist: &HashSet<TrackId>,
) -> Candidates {
    let (skipped, candidates) = album_tracks
        .into_iter()
        .partition(|id| skiplist.contains(id));
    Candidates {
        candidates,
        skipped,
    }
}

/// Fetches every saved album, with the first page of its tracks.
pub async fn fetch_saved_albums<C>(client: &C, page_limit: u32) -> Result<Vec<LikedAlbum>, SyncError>
where
    C: LibraryClient + ?Sized,
{
    fetch_all(&SavedAlbums::new(client), 0, page_limit).await
}

/// Runs one full sync against `client`.
///
/// `pb` only receives status messages; pass [`ProgressBar::hidden`] when there is
/// no terminal to draw on.
///
/// # Errors
///
/// Any fetch-phase failure: saved albums, album tracks or liked status. Like
/// batches that fail after retries are reported in [`RunReport::batches`]; a
/// non-transient like failure ends the run with [`SyncError::LikeAborted`].
pub async fn run<C>(
    client: &C,
    skiplist: &HashSet<TrackId>,
    options: &SyncOptions,
    pb: &ProgressBar,
) -> Result<SyncOutcome, SyncError>
where
    C: LibraryClient + ?Sized,
{
    let start = Instant::now();

    pb.set_message("Fetching saved albums...");
    let mut albums = fetch_saved_albums(client, options.page_limit).await?;
    pb.set_message(format!("Found {} saved albums. Fetching track lists...", albums.len()));

    complete_album_tracks(client, &mut albums, options.page_limit).await?;

    let split = split_candidates(album_track_ids(&albums), skiplist);
    for id in &split.skipped {
        debug!("Skipping track {} because it is in the skiplist.", id);
    }

    pb.set_message(format!(
        "Checking liked status of {} tracks...",
        split.candidates.len()
    ));
    let already_liked = check_liked(client, &split.candidates, options.batch_limit).await?;

    let delta: Vec<TrackId> = split
        .candidates
        .difference(&already_liked)
        .cloned()
        .collect();

    if !delta.is_empty() {
        pb.set_message(format!("Liking {} tracks...", delta.len()));
    }
    let batches = like_tracks(client, &delta, options.batch_limit, options.dry_run).await?;

    let report = RunReport {
        albums_scanned: albums.len(),
        candidate_tracks: split.candidates.len(),
        skipped: split.skipped.len(),
        already_liked: already_liked.len(),
        batches,
        dry_run: options.dry_run,
        elapsed: start.elapsed(),
    };

    Ok(SyncOutcome { report, albums })
}
