use std::{path::Path, time::Duration};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use csv::WriterBuilder;
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::{error::SyncError, types::LikedAlbum};

/// Columns of the track export written by `--save-tsv`.
pub const TSV_HEADERS: [&str; 4] = ["artist", "album", "track", "track_num"];

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Renders every track of every album as tab separated rows with a header.
pub fn tracks_tsv(albums: &[LikedAlbum]) -> Result<Vec<u8>, SyncError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(TSV_HEADERS).map_err(io_error)?;
    for album in albums {
        for track in &album.tracks {
            writer.write_record([
                album.artist_name.as_str(),
                album.name.as_str(),
                track.name.as_str(),
                track.track_number.to_string().as_str(),
            ])
            .map_err(io_error)?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| SyncError::Io(e.into_error()))
}

/// Writes [`tracks_tsv`] to `path`, replacing any previous export.
pub async fn save_tracks_tsv(path: &Path, albums: &[LikedAlbum]) -> Result<(), SyncError> {
    let content = tracks_tsv(albums)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        async_fs::create_dir_all(parent).await?;
    }
    async_fs::write(path, content).await?;
    Ok(())
}

fn io_error(err: csv::Error) -> SyncError {
    SyncError::Io(err.into())
}

/// Formats a duration as `1m 05s` / `3.2s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}
