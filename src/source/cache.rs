use std::{sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::Instant};

use crate::{
    Error,
    source::{DataSource, SourceTables},
};

/// A time-bound memoization wrapper around a [DataSource].
///
/// Tables fetched less than `ttl` ago are served from memory. Failed fetches
/// are not cached, so the next request tries the source again.
pub struct CachedSource {
    inner: Arc<dyn DataSource>,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
}

struct CacheEntry {
    fetched_at: Instant,
    tables: Arc<SourceTables>,
}

impl CachedSource {
    /// Wrap `inner` so that its tables are reused for `ttl`.
    pub fn new(inner: Arc<dyn DataSource>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Get the tables, fetching them from the wrapped source if the cached
    /// copy is missing or stale.
    ///
    /// The lock is held while fetching so that concurrent requests share a
    /// single refetch.
    ///
    /// # Errors
    /// Returns the wrapped source's error if a fetch is needed and fails.
    pub async fn get(&self) -> Result<Arc<SourceTables>, Error> {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                tracing::debug!("Serving source tables from cache");
                return Ok(cached.tables.clone());
            }
        }

        let tables = Arc::new(self.inner.fetch_tables().await?);
        *entry = Some(CacheEntry {
            fetched_at: Instant::now(),
            tables: tables.clone(),
        });

        Ok(tables)
    }

    /// Drop the cached tables so the next [CachedSource::get] fetches fresh data.
    pub async fn invalidate(&self) {
        tracing::info!("Source table cache invalidated");
        *self.entry.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use crate::{
        Error,
        test_utils::{CountingSource, sample_tables},
    };

    use super::CachedSource;

    #[tokio::test]
    async fn reuses_tables_within_ttl() {
        let source = Arc::new(CountingSource::new(Ok(sample_tables())));
        let cache = CachedSource::new(source.clone(), Duration::from_secs(60));

        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn refetches_stale_tables() {
        let source = Arc::new(CountingSource::new(Ok(sample_tables())));
        let cache = CachedSource::new(source.clone(), Duration::ZERO);

        cache.get().await.unwrap();
        cache.get().await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let source = Arc::new(CountingSource::new(Ok(sample_tables())));
        let cache = CachedSource::new(source.clone(), Duration::from_secs(60));

        cache.get().await.unwrap();
        cache.invalidate().await;
        cache.get().await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn does_not_cache_failures() {
        let error = Error::DataSourceUnavailable("sheet".to_owned(), "timed out".to_owned());
        let source = Arc::new(CountingSource::new(Err(error.clone())));
        let cache = CachedSource::new(source.clone(), Duration::from_secs(60));

        assert_eq!(cache.get().await, Err(error.clone()));
        assert_eq!(cache.get().await, Err(error));
        assert_eq!(source.fetch_count(), 2);
    }
}
