use async_trait::async_trait;

use crate::{error::SyncError, trace, types::Page};

/// A remote collection that can be read one page at a time.
///
/// Each call is independent, so walking the collection again simply starts over
/// from offset 0.
#[async_trait]
pub trait PageSource<T: Send> {
    /// Human readable name of the collection, used in errors and logs.
    fn describe(&self) -> String;

    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Page<T>, SyncError>;
}

/// Walks `source` from `start` until no next page is reported and returns every
/// item in order.
///
/// Any failed page turns into [`SyncError::FatalFetch`] (auth errors keep their
/// kind): a truncated listing is never returned. The same applies when the
/// service moves its cursor backwards or the item count disagrees with the
/// reported total.
pub async fn fetch_all<T, S>(source: &S, start: u32, limit: u32) -> Result<Vec<T>, SyncError>
where
    T: Send,
    S: PageSource<T> + Sync + ?Sized,
{
    let what = source.describe();
    let mut items = Vec::new();
    let mut offset = start;
    let mut expected_total: Option<u32> = None;

    loop {
        trace!("Fetching {} (offset: {}, limit: {})", what, offset, limit);
        let page = source
            .fetch_page(offset, limit)
            .await
            .map_err(|e| e.into_fatal_fetch(&what))?;

        if page.total.is_some() {
            expected_total = page.total;
        }
        items.extend(page.items);

        match page.next {
            Some(next) if next <= offset => {
                return Err(SyncError::FatalFetch {
                    what,
                    reason: format!("next offset {next} does not advance past {offset}"),
                });
            }
            Some(next) => offset = next,
            None => break,
        }
    }

    if let Some(total) = expected_total {
        let expected = total.saturating_sub(start) as usize;
        if items.len() != expected {
            return Err(SyncError::FatalFetch {
                what,
                reason: format!(
                    "retrieved {} items, service reported {}",
                    items.len(),
                    expected
                ),
            });
        }
    }

    Ok(items)
}
