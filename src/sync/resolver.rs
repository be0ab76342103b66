use std::collections::BTreeSet;

use crate::{
    debug,
    error::SyncError,
    spotify::LibraryClient,
    sync::{pager::fetch_all, sources::AlbumTracks},
    trace,
    types::{LikedAlbum, TrackId},
};

/// Fetches the missing track pages of every album whose embedded listing was cut
/// short, so that each album ends up with its complete track list.
///
/// Albums that came back complete from the album listing cost no extra request.
/// Any failed track page aborts with [`SyncError::FatalFetch`].
pub async fn complete_album_tracks<C>(
    client: &C,
    albums: &mut [LikedAlbum],
    page_limit: u32,
) -> Result<(), SyncError>
where
    C: LibraryClient + ?Sized,
{
    let total = albums.len();
    for (n, album) in albums.iter_mut().enumerate() {
        debug!("Processing album {} of {}: {}", n + 1, total, album);

        let Some(offset) = album.more_tracks_from else {
            continue;
        };

        trace!(
            "{} has more tracks than its listing, fetching from offset {}.",
            album, offset
        );
        let rest = fetch_all(&AlbumTracks::new(client, album), offset, page_limit).await?;
        album.tracks.extend(rest);
        album.more_tracks_from = None;
    }

    Ok(())
}

/// Union of every track ID of every album.
///
/// A track on several albums appears once. Albums without tracks contribute
/// nothing.
pub fn album_track_ids(albums: &[LikedAlbum]) -> BTreeSet<TrackId> {
    albums
        .iter()
        .flat_map(|album| album.track_ids().cloned())
        .collect()
}
