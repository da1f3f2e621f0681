//! Cache-aware access to extracted calendar data.
//!
//! [`DataManager`] decides per request whether a persisted document can be
//! reused or the source PDF must be extracted again:
//!
//! - **year**, cache off (the default): always extract.
//! - **year**, cache on: year document, else extract.
//! - **month**, cache on (the default): month document, else the year document
//!   (writing the month document back), else extract.
//! - **month**, cache off: always extract.
//!
//! Extraction runs on the blocking pool behind a semaphore and is bounded by a
//! timeout; cache reads and writes also run on the blocking pool. A successful
//! extraction writes the year document first and then one document per month.
//! Nothing is written when extraction fails.
//!
//! Concurrent requests for the same work share one in-flight future: one map
//! keyed by year for extractions, one keyed by (year, month) for cached month
//! lookups. The work is spawned, so it finishes and populates the cache even if
//! every caller disconnects.

use std::collections::BTreeMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::backend::YearExtractor;
use crate::error::{ExtractionError, MonthFailure};
use crate::record::{Month, MonthDocument, MonthRecord, Year, YearDocument, YearRecord};
use crate::source::PdfLibrary;
use crate::store::{CacheKey, CacheStore, CacheStoreExt, StoreError};

/// Default number of concurrent extractions.
pub const DEFAULT_WORKERS: usize = 2;

/// Default upper bound on a single extraction.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Error, Debug, Clone)]
pub enum DataError {
    #[error("no source calendar for year {year}")]
    SourceNotFound { year: Year },
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("extraction of year {year} exceeded {} seconds", .limit.as_secs())]
    Timeout { year: Year, limit: Duration },
    #[error("extraction worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub workers: usize,
    pub timeout: Duration,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_EXTRACTION_TIMEOUT,
        }
    }
}

/// Sources and persisted documents, as listed by [`DataManager::index`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CalendarIndex {
    pub available_years: Vec<String>,
    pub processed_years: Vec<String>,
    pub processed_months: BTreeMap<String, Vec<String>>,
    pub available_files: Vec<String>,
}

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, DataError>>>;

struct Flight<T: Clone> {
    id: u64,
    future: SharedResult<T>,
}

struct Inner {
    store: Arc<dyn CacheStore>,
    extractor: Arc<dyn YearExtractor>,
    library: PdfLibrary,
    permits: Arc<Semaphore>,
    timeout: Duration,
    next_flight: AtomicU64,
    extractions: DashMap<Year, Flight<YearRecord>>,
    month_lookups: DashMap<(Year, Month), Flight<MonthRecord>>,
}

/// Shared handle; clones refer to the same cache, pool and in-flight maps.
#[derive(Clone)]
pub struct DataManager {
    inner: Arc<Inner>,
}

impl DataManager {
    pub fn new(
        store: Arc<dyn CacheStore>,
        extractor: Arc<dyn YearExtractor>,
        library: PdfLibrary,
        options: ManagerOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                extractor,
                library,
                permits: Arc::new(Semaphore::new(options.workers.max(1))),
                timeout: options.timeout,
                next_flight: AtomicU64::new(0),
                extractions: DashMap::new(),
                month_lookups: DashMap::new(),
            }),
        }
    }

    pub fn library(&self) -> &PdfLibrary {
        &self.inner.library
    }

    /// A full year. `use_cache` defaults to `false`.
    pub async fn get_year(&self, year: Year, use_cache: Option<bool>) -> Result<YearRecord, DataError> {
        if use_cache.unwrap_or(false) {
            if let Some(record) = self.with_store(move |store| cached_year(store, year)).await? {
                tracing::debug!(year, "serving year from cache");
                return Ok(record);
            }
            tracing::info!(year, "year not cached, extracting");
        }
        self.extract(year).await
    }

    /// A single month. `use_cache` defaults to `true`.
    pub async fn get_month(
        &self,
        year: Year,
        month: Month,
        use_cache: Option<bool>,
    ) -> Result<MonthRecord, DataError> {
        if !use_cache.unwrap_or(true) {
            let record = self.extract(year).await?;
            return month_of(year, month, &record);
        }

        let this = self.clone();
        let lookup = self.coalesce(
            month_lookups,
            (year, month),
            async move { this.cached_month_or_extract(year, month).await },
        );
        lookup.await
    }

    pub async fn year_document(
        &self,
        year: Year,
        use_cache: Option<bool>,
    ) -> Result<YearDocument, DataError> {
        let data = self.get_year(year, use_cache).await?;
        Ok(YearDocument::new(year, data))
    }

    pub async fn month_document(
        &self,
        year: Year,
        month: Month,
        use_cache: Option<bool>,
    ) -> Result<MonthDocument, DataError> {
        let data = self.get_month(year, month, use_cache).await?;
        Ok(MonthDocument::new(year, month, data))
    }

    /// Source files on disk and documents already in the cache.
    pub fn index(&self) -> Result<CalendarIndex, DataError> {
        let sources = self
            .inner
            .library
            .available()
            .map_err(|e| StoreError::Io {
                key: self.inner.library.dir().display().to_string(),
                source: Arc::new(e),
            })?;

        let mut index = CalendarIndex::default();
        for (year, file) in sources {
            index.available_years.push(year.to_string());
            index.available_files.push(file);
        }
        for key in self.inner.store.keys()? {
            match key {
                CacheKey::Year(y) => index.processed_years.push(y.to_string()),
                CacheKey::Month(y, m) => index
                    .processed_months
                    .entry(y.to_string())
                    .or_default()
                    .push(m.key()),
            }
        }
        Ok(index)
    }

    /// Run cache I/O on the blocking pool.
    async fn with_store<T, F>(&self, f: F) -> Result<T, DataError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CacheStore) -> Result<T, DataError> + Send + 'static,
    {
        let store = Arc::clone(&self.inner.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| DataError::Worker(e.to_string()))?
    }

    async fn cached_month_or_extract(&self, year: Year, month: Month) -> Result<MonthRecord, DataError> {
        let cached = self
            .with_store(move |store| cached_month(store, year, month))
            .await?;
        if let Some(data) = cached {
            return Ok(data);
        }

        tracing::info!(year, month = %month, "month not cached, extracting");
        let record = self.extract(year).await?;
        month_of(year, month, &record)
    }

    /// Extract a year and persist it, joining an extraction already running
    /// for the same year.
    async fn extract(&self, year: Year) -> Result<YearRecord, DataError> {
        let this = self.clone();
        let flight = self.coalesce(
            extractions,
            year,
            async move { this.run_extraction(year).await },
        );
        flight.await
    }

    async fn run_extraction(&self, year: Year) -> Result<YearRecord, DataError> {
        let path = self.inner.library.path_for(year);
        if !path.is_file() {
            return Err(DataError::SourceNotFound { year });
        }

        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|e| DataError::Worker(e.to_string()))?;

        tracing::info!(year, path = %path.display(), "extracting year");
        let start = std::time::Instant::now();
        let extractor = Arc::clone(&self.inner.extractor);
        let task = tokio::task::spawn_blocking(move || {
            // Held until the work really ends, even after a timeout.
            let _permit = permit;
            extractor.extract_year(&path, year)
        });

        let record = match tokio::time::timeout(self.inner.timeout, task).await {
            Err(_) => {
                tracing::warn!(year, limit = ?self.inner.timeout, "extraction timed out");
                return Err(DataError::Timeout {
                    year,
                    limit: self.inner.timeout,
                });
            }
            Ok(Err(join)) => return Err(DataError::Worker(join.to_string())),
            Ok(Ok(result)) => result.inspect_err(|e| {
                tracing::warn!(year, error = %e, "extraction failed");
            })?,
        };

        let missing = record.missing_months();
        if !missing.is_empty() {
            return Err(ExtractionError::YearExtractionFailed {
                year,
                failures: missing
                    .into_iter()
                    .map(|month| MonthFailure {
                        month,
                        error: ExtractionError::MonthNotFound(month),
                    })
                    .collect(),
            }
            .into());
        }

        let persisted = record.clone();
        self.with_store(move |store| Ok(store.persist_year(year, &persisted)?))
            .await?;
        tracing::info!(year, elapsed = ?start.elapsed(), "year extracted and cached");
        Ok(record)
    }

    /// Join the in-flight future for `key`, or spawn `work` and register it.
    ///
    /// The spawned task removes its own entry when done; the flight id guards
    /// against removing a newer flight registered under the same key.
    fn coalesce<K, T, F>(
        &self,
        select: fn(&Inner) -> &DashMap<K, Flight<T>>,
        key: K,
        work: F,
    ) -> SharedResult<T>
    where
        K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
        T: Clone + Send + Sync + 'static,
        F: Future<Output = Result<T, DataError>> + Send + 'static,
    {
        match select(&self.inner).entry(key.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!(key = ?key, "joining in-flight request");
                entry.get().future.clone()
            }
            Entry::Vacant(entry) => {
                let id = self.inner.next_flight.fetch_add(1, Ordering::Relaxed);
                let inner = Arc::clone(&self.inner);
                let handle = tokio::spawn(async move {
                    let result = work.await;
                    select(&inner).remove_if(&key, |_, flight| flight.id == id);
                    result
                });
                let future = async move {
                    handle
                        .await
                        .unwrap_or_else(|e| Err(DataError::Worker(e.to_string())))
                }
                .boxed()
                .shared();
                entry.insert(Flight {
                    id,
                    future: future.clone(),
                });
                future
            }
        }
    }
}

fn extractions(inner: &Inner) -> &DashMap<Year, Flight<YearRecord>> {
    &inner.extractions
}

fn month_lookups(inner: &Inner) -> &DashMap<(Year, Month), Flight<MonthRecord>> {
    &inner.month_lookups
}

fn cached_year(store: &dyn CacheStore, year: Year) -> Result<Option<YearRecord>, DataError> {
    let Some(doc) = store.read_year(year)? else {
        return Ok(None);
    };
    if !doc.data.is_complete(year) {
        return Err(StoreError::Corrupt {
            key: CacheKey::Year(year).to_string(),
            message: "year document is incomplete".into(),
        }
        .into());
    }
    Ok(Some(doc.data))
}

/// The month document, else the month cut from a cached year and written back.
fn cached_month(
    store: &dyn CacheStore,
    year: Year,
    month: Month,
) -> Result<Option<MonthRecord>, DataError> {
    if let Some(doc) = store.read_month(year, month)? {
        if !doc.data.is_complete_for(year, month) {
            return Err(StoreError::Corrupt {
                key: CacheKey::Month(year, month).to_string(),
                message: "month document is incomplete".into(),
            }
            .into());
        }
        tracing::debug!(year, month = %month, "serving month from cache");
        return Ok(Some(doc.data));
    }

    let Some(record) = cached_year(store, year)? else {
        return Ok(None);
    };
    let data = month_of(year, month, &record)?;
    store.write_month(&MonthDocument::new(year, month, data.clone()))?;
    tracing::info!(year, month = %month, "month derived from cached year");
    Ok(Some(data))
}

fn month_of(year: Year, month: Month, record: &YearRecord) -> Result<MonthRecord, DataError> {
    record.month(month).cloned().ok_or_else(|| {
        DataError::Extraction(ExtractionError::YearExtractionFailed {
            year,
            failures: vec![MonthFailure {
                month,
                error: ExtractionError::MonthNotFound(month),
            }],
        })
    })
}
