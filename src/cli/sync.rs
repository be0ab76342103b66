use std::{path::PathBuf, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    SyncError, config, error, info,
    spotify::SpotifyClient,
    success,
    sync::{self, SyncOptions},
    utils, verbosity, warning,
};

pub async fn sync(skiplist_file: Option<PathBuf>, dry_run: bool, save_tsv: Option<PathBuf>) {
    let skiplist_path = skiplist_file.unwrap_or_else(config::default_skiplist_path);
    info!(
        "Starting. dry_run={}, skiplist_file={}",
        dry_run,
        skiplist_path.display()
    );

    // a broken skiplist must stop the run before anything is liked
    let skiplist = match sync::load_skiplist(Some(skiplist_path.as_path())).await {
        Ok(skiplist) => skiplist,
        Err(e) => error!("{}", e),
    };

    let client = match SpotifyClient::from_cache().await {
        Ok(client) => client,
        Err(e) => error!("{}", e),
    };

    if !dry_run && !client.can_modify_library().await {
        error!(
            "The stored token is read-only. Run favsync auth without --read-only, or sync with --dry-run."
        );
    }

    let pb = progress_bar(verbosity());

    let options = SyncOptions {
        dry_run,
        ..Default::default()
    };

    let outcome = match sync::run(&client, &skiplist, &options, &pb).await {
        Ok(outcome) => {
            pb.finish_and_clear();
            outcome
        }
        Err(SyncError::LikeAborted {
            batch,
            committed_tracks,
            batches,
            source,
        }) => {
            pb.finish_and_clear();
            for done in batches.iter().filter(|b| b.is_committed()) {
                info!("Batch {} ({} tracks) was liked.", done.index + 1, done.ids.len());
            }
            error!(
                "Liking stopped at batch {}: {}. {} tracks were liked before that.",
                batch, source, committed_tracks
            );
        }
        Err(e) => {
            pb.finish_and_clear();
            error!("Nothing was liked. {}", e);
        }
    };

    if let Some(path) = save_tsv {
        match utils::save_tracks_tsv(&path, &outcome.albums).await {
            Ok(()) => success!("Saved all album tracks to {}", path.display()),
            Err(e) => warning!("Failed to save tracks to {}: {}", path.display(), e),
        }
    }

    let report = outcome.report;
    println!("{}", report);

    for batch in report.failed_batches() {
        warning!(
            "Batch {} ({} tracks) was not liked. Run favsync sync again to retry.",
            batch.index + 1,
            batch.ids.len()
        );
    }

    info!("Took {} to run.", utils::format_elapsed(report.elapsed));

    if dry_run {
        warning!("Dry run: no tracks liked.");
    } else if report.all_batches_failed() {
        error!("Every like batch failed.");
    } else if report.newly_liked() > 0 {
        success!("Liked {} tracks.", report.newly_liked());
    } else if report.batches.is_empty() {
        success!("No tracks to like - everything's up to date!");
    }
}

/// Spinner for the sync run.
///
/// Hidden when `-v` output is on, since those lines are printed while the run is
/// in progress and would be interleaved with spinner frames.
fn progress_bar(verbosity: u8) -> ProgressBar {
    if verbosity > 0 {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}
