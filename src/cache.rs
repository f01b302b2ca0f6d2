//! Explicit "all items" cache for list views.
//!
//! A [`ListCache`] is owned by whoever needs it and passed by reference.
//! Entries are served until they are older than the configured TTL or until
//! [`ListCache::invalidate`] is called, whichever comes first.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::client::TaskApi;
use crate::error::ApiError;
use crate::task::TaskRecord;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug)]
struct Entry<T> {
    items: Arc<Vec<T>>,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct ListCache<T> {
    ttl: Duration,
    entry: Mutex<Option<Entry<T>>>,
}

impl<T> ListCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Return the cached list, or run `fetch` and cache its result.
    ///
    /// Concurrent callers wait for a single fetch. Errors are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, fetch: F) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let mut entry = self.entry.lock().await;
        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.items));
            }
            tracing::debug!(age = ?cached.fetched_at.elapsed(), "cached list is stale");
        }
        let items = Arc::new(fetch().await?);
        *entry = Some(Entry {
            items: Arc::clone(&items),
            fetched_at: Instant::now(),
        });
        Ok(items)
    }

    /// Drop the cached list so the next read fetches again.
    pub async fn invalidate(&self) {
        self.entry.lock().await.take();
    }

    pub async fn is_fresh(&self) -> bool {
        self.entry
            .lock()
            .await
            .as_ref()
            .is_some_and(|e| e.fetched_at.elapsed() < self.ttl)
    }
}

/// Stop paging after this many requests even if the server keeps answering.
pub const MAX_PAGES: u32 = 1_000;

/// Fetch every page of tasks.
///
/// Ends at the reported total, on a short page, when a page repeats the
/// previous one, or after [`MAX_PAGES`] requests.
pub async fn fetch_all_tasks(
    api: &dyn TaskApi,
    page_size: u32,
) -> Result<Vec<TaskRecord>, ApiError> {
    let page_size = page_size.max(1);
    let mut all = Vec::new();
    let mut previous_first = None;
    for page in 1..=MAX_PAGES {
        let batch = api.list_tasks(page, page_size).await?;
        let received = batch.items.len();
        let first = batch.items.first().map(|r| r.id.clone());
        if first.is_some() && first == previous_first {
            tracing::warn!(page, "server repeated the previous page; stopping");
            return Ok(all);
        }
        all.extend(batch.items);
        let done = match batch.total {
            Some(total) => all.len() as u64 >= total,
            None => received < page_size as usize,
        };
        if done || received == 0 {
            return Ok(all);
        }
        previous_first = first;
    }
    tracing::warn!(pages = MAX_PAGES, "page limit reached; listing may be incomplete");
    Ok(all)
}
