use std::{collections::HashSet, io::Read, path::Path};

use csv::{ErrorKind, ReaderBuilder, StringRecord, Trim};

use crate::{debug, error::SyncError, types::TrackId, warning};

/// Header of the column holding the track IDs. All other columns are annotations.
pub const ID_COLUMN: &str = "spotify_id";

/// Position of the column called `name` in a header row.
pub fn column_index<'a, I>(headers: I, name: &str) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    headers.into_iter().position(|header| header == name)
}

/// Parses skiplist CSV content into the set of excluded track IDs.
///
/// # Errors
///
/// [`SyncError::SkiplistFormat`] if the header has no `spotify_id` column or a row
/// has a different number of fields than the header.
pub fn parse_skiplist<R: Read>(reader: R) -> Result<HashSet<TrackId>, SyncError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let id_index = column_index(headers.iter(), ID_COLUMN).ok_or_else(|| {
        SyncError::SkiplistFormat(format!(
            "missing required column '{}' (found: {})",
            ID_COLUMN,
            headers.iter().collect::<Vec<_>>().join(", ")
        ))
    })?;

    let mut skipped = HashSet::new();
    let mut record = StringRecord::new();
    loop {
        match csv_reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                if let Some(id) = record.get(id_index).filter(|id| !id.is_empty()) {
                    skipped.insert(id.to_string());
                }
            }
            Err(err) => return Err(describe_row_error(err)),
        }
    }

    Ok(skipped)
}

/// Loads the skiplist at `path`.
///
/// The skiplist is optional: no path, or a path that does not exist, yields an
/// empty set.
pub async fn load_skiplist(path: Option<&Path>) -> Result<HashSet<TrackId>, SyncError> {
    let Some(path) = path else {
        debug!("No skiplist file given.");
        return Ok(HashSet::new());
    };

    if !path.is_file() {
        warning!(
            "Skiplist file '{}' does not exist. No tracks will be skipped.",
            path.display()
        );
        return Ok(HashSet::new());
    }

    let content = async_fs::read(path).await?;
    let skipped = parse_skiplist(content.as_slice()).map_err(|err| match err {
        SyncError::SkiplistFormat(msg) => {
            SyncError::SkiplistFormat(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;

    debug!(
        "Loaded {} skiplisted tracks from '{}'.",
        skipped.len(),
        path.display()
    );
    Ok(skipped)
}

fn describe_row_error(err: csv::Error) -> SyncError {
    match err.kind() {
        ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => {
            let line = pos
                .as_ref()
                .map(|p| p.line().to_string())
                .unwrap_or_else(|| "?".to_string());
            SyncError::SkiplistFormat(format!(
                "malformed row at line {line}: expected {expected_len} fields, found {len}"
            ))
        }
        _ => SyncError::from(err),
    }
}
