mod common;

use std::collections::{BTreeSet, HashSet};

use common::{Call, FakeLibrary, album, album_with_tracks};
use favsync::{
    SyncError,
    sync::{self, BatchStatus, SyncOptions, SyncOutcome},
    types::TrackId,
};
use indicatif::ProgressBar;

async fn run(fake: &FakeLibrary, skiplist: &HashSet<TrackId>) -> Result<SyncOutcome, SyncError> {
    sync::run(fake, skiplist, &SyncOptions::default(), &ProgressBar::hidden()).await
}

fn ids(values: &[&str]) -> Vec<TrackId> {
    values.iter().map(|v| v.to_string()).collect()
}

fn all_track_ids(fake: &FakeLibrary) -> BTreeSet<TrackId> {
    fake.albums
        .iter()
        .flat_map(|a| a.track_ids().cloned())
        .collect()
}

#[tokio::test]
async fn test_pagination_completeness() {
    for pages in [0_usize, 1, 5] {
        for page_size in [1_usize, 50] {
            // every page full except a partial last one (where a page can be partial)
            let count = match pages {
                0 => 0,
                k => (k - 1) * page_size + page_size.div_ceil(2),
            };
            let albums = (0..count).map(|i| album(&format!("a{i:04}"), 1)).collect();
            let fake = FakeLibrary::new(albums);

            let fetched = sync::fetch_saved_albums(&fake, page_size as u32)
                .await
                .unwrap();

            let fetched_ids: Vec<&str> = fetched.iter().map(|a| a.id.as_str()).collect();
            let expected_ids: Vec<&str> = fake.albums.iter().map(|a| a.id.as_str()).collect();
            assert_eq!(fetched_ids, expected_ids, "K={pages} P={page_size}");
            assert_eq!(fake.album_page_calls(), pages.max(1), "K={pages} P={page_size}");
        }
    }
}

#[tokio::test]
async fn test_batches_of_123_tracks() {
    let mut fake = FakeLibrary::new(vec![album("big", 123)]);
    fake.embedded_tracks = 50;

    let outcome = run(&fake, &HashSet::new()).await.unwrap();

    let album_track_requests: Vec<u32> = fake
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::AlbumTracks { offset, .. } => Some(offset),
            _ => None,
        })
        .collect();
    assert_eq!(album_track_requests, vec![50, 100]);

    let check_sizes: Vec<usize> = fake.contains_calls().iter().map(Vec::len).collect();
    let save_sizes: Vec<usize> = fake.save_calls().iter().map(Vec::len).collect();
    assert_eq!(check_sizes, vec![50, 50, 23]);
    assert_eq!(save_sizes, vec![50, 50, 23]);

    let report = outcome.report;
    assert_eq!(report.albums_scanned, 1);
    assert_eq!(report.candidate_tracks, 123);
    assert_eq!(report.newly_liked(), 123);
    assert_eq!(report.already_liked, 0);
    assert_eq!(fake.liked(), all_track_ids(&fake));
}

#[tokio::test]
async fn test_partial_failure_keeps_other_batches() {
    let mut fake = FakeLibrary::new(vec![album("big", 123)]);
    fake.failing_saves.insert(1);

    let outcome = run(&fake, &HashSet::new()).await.unwrap();
    let report = outcome.report;

    let statuses: Vec<bool> = report.batches.iter().map(|b| b.is_committed()).collect();
    assert_eq!(statuses, vec![true, false, true]);
    assert!(matches!(report.batches[1].status, BatchStatus::Failed(_)));
    assert_eq!(report.newly_liked(), 73);
    assert_eq!(report.failed_tracks(), 50);
    assert!(!report.all_batches_failed());

    let saves = fake.save_calls();
    let mut committed: BTreeSet<TrackId> = saves[0].iter().cloned().collect();
    committed.extend(saves[2].iter().cloned());
    assert_eq!(fake.liked(), committed);
}

#[tokio::test]
async fn test_all_batches_failed() {
    let mut fake = FakeLibrary::new(vec![album("a", 3)]);
    fake.failing_saves.insert(0);

    let report = run(&fake, &HashSet::new()).await.unwrap().report;
    assert!(report.all_batches_failed());
    assert_eq!(report.newly_liked(), 0);
}

#[tokio::test]
async fn test_empty_library() {
    let fake = FakeLibrary::new(Vec::new());

    let report = run(&fake, &HashSet::new()).await.unwrap().report;

    assert_eq!(report.albums_scanned, 0);
    assert_eq!(report.candidate_tracks, 0);
    assert_eq!(report.newly_liked(), 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.already_liked, 0);
    assert!(report.batches.is_empty());
    assert!(fake.save_calls().is_empty());
    assert!(fake.contains_calls().is_empty());
}

#[tokio::test]
async fn test_second_run_likes_nothing() {
    let fake = FakeLibrary::new(vec![album("a", 12), album("b", 60)]);

    let first = run(&fake, &HashSet::new()).await.unwrap().report;
    assert_eq!(first.newly_liked(), 72);

    fake.clear_calls();
    let second = run(&fake, &HashSet::new()).await.unwrap().report;

    assert_eq!(second.newly_liked(), 0);
    assert!(second.batches.is_empty());
    assert_eq!(second.already_liked, 72);
    assert!(fake.save_calls().is_empty());
}

#[tokio::test]
async fn test_delta_respects_skiplist_and_liked() {
    let fake = FakeLibrary::new(vec![album("a", 5), album("b", 5)])
        .with_liked(&ids(&["a-t000", "b-t004"]));
    let skiplist: HashSet<TrackId> = ids(&["a-t001", "b-t002", "not-on-any-album"])
        .into_iter()
        .collect();

    let report = run(&fake, &skiplist).await.unwrap().report;

    let delta: BTreeSet<TrackId> = fake.save_calls().into_iter().flatten().collect();
    let desired = all_track_ids(&fake);

    assert!(delta.is_subset(&desired));
    assert!(delta.iter().all(|id| !skiplist.contains(id)));
    assert!(!delta.contains("a-t000"));
    assert_eq!(delta.len(), 6);

    assert_eq!(report.skipped, 2);
    assert_eq!(report.candidate_tracks, 8);
    assert_eq!(report.already_liked, 2);
    assert_eq!(report.newly_liked(), 6);

    // skiplisted tracks are never even checked
    let checked: BTreeSet<TrackId> = fake.contains_calls().into_iter().flatten().collect();
    assert!(!checked.contains("a-t001"));
}

#[tokio::test]
async fn test_shared_tracks_liked_once() {
    let shared = ids(&["shared-1", "shared-2"]);
    let mut first = shared.clone();
    first.push("only-first".to_string());

    let fake = FakeLibrary::new(vec![
        album_with_tracks("first", &first),
        album_with_tracks("compilation", &shared),
        album("empty", 0),
    ]);

    let report = run(&fake, &HashSet::new()).await.unwrap().report;

    let saved: Vec<TrackId> = fake.save_calls().into_iter().flatten().collect();
    assert_eq!(saved.len(), 3);
    assert_eq!(report.albums_scanned, 3);
    assert_eq!(report.candidate_tracks, 3);
}

#[tokio::test]
async fn test_failed_album_page_aborts_before_writes() {
    let mut fake = FakeLibrary::new((0..120).map(|i| album(&format!("a{i:03}"), 2)).collect());
    fake.failing_album_offset = Some(50);

    let result = run(&fake, &HashSet::new()).await;

    assert!(matches!(result, Err(SyncError::FatalFetch { .. })));
    assert!(fake.contains_calls().is_empty());
    assert!(fake.save_calls().is_empty());
}

#[tokio::test]
async fn test_dry_run_issues_no_writes() {
    let fake = FakeLibrary::new(vec![album("a", 70)]);
    let options = SyncOptions {
        dry_run: true,
        ..Default::default()
    };

    let report = sync::run(&fake, &HashSet::new(), &options, &ProgressBar::hidden())
        .await
        .unwrap()
        .report;

    assert!(fake.save_calls().is_empty());
    assert_eq!(report.would_like(), 70);
    assert_eq!(report.newly_liked(), 0);
    assert_eq!(report.batches.len(), 2);
    assert!(report.to_string().contains("would like"));
}

#[tokio::test]
async fn test_outcome_contains_complete_albums() {
    let mut fake = FakeLibrary::new(vec![album("long", 75)]);
    fake.embedded_tracks = 20;

    let outcome = run(&fake, &HashSet::new()).await.unwrap();

    assert_eq!(outcome.albums.len(), 1);
    assert_eq!(outcome.albums[0].tracks.len(), 75);
    assert!(outcome.albums[0].is_complete());
}

#[tokio::test]
async fn test_revoked_token_stops_liking() {
    let mut fake = FakeLibrary::new(vec![album("big", 123)]);
    fake.revoked_from_save = Some(1);

    let result = run(&fake, &HashSet::new()).await;

    match result {
        Err(SyncError::LikeAborted {
            batch,
            committed_tracks,
            batches,
            source,
        }) => {
            assert_eq!(batch, 2);
            assert_eq!(committed_tracks, 50);
            assert_eq!(batches.len(), 1);
            assert!(batches[0].is_committed());
            assert!(matches!(*source, SyncError::Auth(_)));
        }
        other => panic!("expected the like phase to abort, got {other:?}"),
    }

    // the third batch is never sent
    assert_eq!(fake.save_calls().len(), 2);
    assert_eq!(fake.liked().len(), 50);
}

#[tokio::test]
async fn test_transient_like_failure_does_not_stop_liking() {
    let mut fake = FakeLibrary::new(vec![album("big", 123)]);
    fake.failing_saves.insert(0);

    let report = run(&fake, &HashSet::new()).await.unwrap().report;

    assert_eq!(fake.save_calls().len(), 3);
    assert_eq!(report.newly_liked(), 73);
}

#[tokio::test]
async fn test_failed_status_check_aborts_before_writes() {
    let mut fake = FakeLibrary::new(vec![album("big", 123)]);
    fake.failing_contains = Some(1);

    let result = run(&fake, &HashSet::new()).await;

    assert!(matches!(result, Err(SyncError::FatalFetch { .. })));
    assert_eq!(fake.contains_calls().len(), 2);
    assert!(fake.save_calls().is_empty());
}

#[tokio::test]
async fn test_short_status_answer_aborts_before_writes() {
    let mut fake = FakeLibrary::new(vec![album("a", 10)]);
    fake.short_contains_answers = true;

    let result = run(&fake, &HashSet::new()).await;

    match result {
        Err(SyncError::FatalFetch { what, reason }) => {
            assert_eq!(what, "liked status");
            assert!(reason.contains("asked for 10 tracks, got 9 answers"));
        }
        other => panic!("expected a fatal fetch error, got {other:?}"),
    }
    assert!(fake.save_calls().is_empty());
}
