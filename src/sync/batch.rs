use std::collections::BTreeSet;

use crate::{
    debug,
    error::SyncError,
    spotify::LibraryClient,
    sync::report::{BatchOutcome, BatchStatus},
    types::TrackId,
};

/// Splits `items` into consecutive groups of at most `limit` items.
///
/// The last group holds the remainder. A `limit` of 0 is treated as 1.
pub fn batches<T>(items: &[T], limit: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(limit.max(1))
}

/// Returns the subset of `candidates` that is already liked.
///
/// Issues one status check per batch of at most `limit` IDs. A failed check, or
/// a response whose length does not match the batch, is fatal: the delta must not
/// be computed from an incomplete picture.
pub async fn check_liked<C>(
    client: &C,
    candidates: &BTreeSet<TrackId>,
    limit: usize,
) -> Result<BTreeSet<TrackId>, SyncError>
where
    C: LibraryClient + ?Sized,
{
    let ids: Vec<TrackId> = candidates.iter().cloned().collect();
    let mut liked = BTreeSet::new();

    for batch in batches(&ids, limit) {
        let statuses = client
            .contains_saved_tracks(batch)
            .await
            .map_err(|e| e.into_fatal_fetch("liked status"))?;

        if statuses.len() != batch.len() {
            return Err(SyncError::FatalFetch {
                what: "liked status".to_string(),
                reason: format!(
                    "asked for {} tracks, got {} answers",
                    batch.len(),
                    statuses.len()
                ),
            });
        }

        liked.extend(
            batch
                .iter()
                .zip(statuses)
                .filter(|(_, is_liked)| *is_liked)
                .map(|(id, _)| id.clone()),
        );
    }

    Ok(liked)
}

/// Likes `delta` in batches of at most `limit` IDs.
///
/// A batch that still fails after the client's retries is recorded and the
/// remaining batches still run. With `dry_run` no write call is issued and every
/// batch is marked as such.
///
/// # Errors
///
/// [`SyncError::LikeAborted`] as soon as a batch fails with a non-transient error
/// (revoked token, rejected request). Later batches are not sent.
pub async fn like_tracks<C>(
    client: &C,
    delta: &[TrackId],
    limit: usize,
    dry_run: bool,
) -> Result<Vec<BatchOutcome>, SyncError>
where
    C: LibraryClient + ?Sized,
{
    let mut outcomes: Vec<BatchOutcome> = Vec::new();

    for (index, batch) in batches(delta, limit).enumerate() {
        let status = if dry_run {
            BatchStatus::DryRun
        } else {
            match client.save_tracks(batch).await {
                Ok(()) => {
                    debug!("Liked batch {} ({} tracks).", index + 1, batch.len());
                    BatchStatus::Committed
                }
                Err(e) if e.is_transient() => {
                    debug!("Failed to like batch {} ({} tracks): {}", index + 1, batch.len(), e);
                    BatchStatus::Failed(e.to_string())
                }
                Err(e) => {
                    let committed_tracks = outcomes
                        .iter()
                        .filter(|b| b.is_committed())
                        .map(|b| b.ids.len())
                        .sum();
                    return Err(SyncError::LikeAborted {
                        batch: index + 1,
                        committed_tracks,
                        batches: outcomes,
                        source: Box::new(e),
                    });
                }
            }
        };

        outcomes.push(BatchOutcome {
            index,
            ids: batch.to_vec(),
            status,
        });
    }

    Ok(outcomes)
}
