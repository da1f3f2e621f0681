use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use takvimi_core::{
    CacheKey, CacheStore, CacheStoreExt, DataError, DataManager, DayRecord, ExtractionError,
    FsStore, ManagerOptions, MemoryStore, Month, MonthFailure, MonthRecord, PdfLibrary,
    PrayerTimes, Year, YearExtractor, YearRecord,
};

fn day(d: u32) -> DayRecord {
    DayRecord {
        day: d,
        weekday: "e mërkurë".into(),
        hijri_day: Some(d),
        note: if d == 1 {
            "Viti i Ri 2025, Hëna e re".into()
        } else {
            String::new()
        },
        times: PrayerTimes::from_ordered(&[
            "5:21", "5:41", "7:13", "11:48", "14:13", "16:22", "17:54", "9:09",
        ])
        .unwrap(),
    }
}

fn full_year(year: Year) -> YearRecord {
    let mut record = YearRecord::new();
    for m in Month::all() {
        let days = MonthRecord::from_days(year, m, (1..=m.days_in(year)).map(day)).unwrap();
        record.insert(m, days);
    }
    record
}

#[derive(Default)]
struct CountingExtractor {
    calls: AtomicUsize,
    delay: Option<Duration>,
    fail_month: Option<Month>,
}

impl CountingExtractor {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl YearExtractor for CountingExtractor {
    fn extract_year(&self, _path: &Path, year: Year) -> Result<YearRecord, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(month) = self.fail_month {
            return Err(ExtractionError::YearExtractionFailed {
                year,
                failures: vec![MonthFailure {
                    month,
                    error: ExtractionError::MonthNotFound(month),
                }],
            });
        }
        Ok(full_year(year))
    }
}

struct Fixture {
    _pdf_dir: tempfile::TempDir,
    library: PdfLibrary,
}

fn library_with(years: &[Year]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    for y in years {
        std::fs::write(dir.path().join(PdfLibrary::file_name(*y)), b"%PDF-1.7").unwrap();
    }
    let library = PdfLibrary::new(dir.path());
    Fixture {
        _pdf_dir: dir,
        library,
    }
}

fn manager(
    store: Arc<dyn CacheStore>,
    extractor: Arc<CountingExtractor>,
    library: &PdfLibrary,
    options: ManagerOptions,
) -> DataManager {
    DataManager::new(store, extractor, library.clone(), options)
}

#[tokio::test]
async fn test_default_year_requests_always_extract() {
    let fx = library_with(&[2025]);
    let extractor = Arc::new(CountingExtractor::default());
    let dm = manager(
        Arc::new(MemoryStore::new()),
        extractor.clone(),
        &fx.library,
        ManagerOptions::default(),
    );

    dm.get_year(2025, None).await.unwrap();
    dm.get_year(2025, None).await.unwrap();
    assert_eq!(extractor.calls(), 2);

    dm.get_year(2025, Some(true)).await.unwrap();
    assert_eq!(extractor.calls(), 2, "cached year should be reused on request");
}

#[tokio::test]
async fn test_default_month_requests_extract_once() {
    let fx = library_with(&[2025]);
    let extractor = Arc::new(CountingExtractor::default());
    let dm = manager(
        Arc::new(MemoryStore::new()),
        extractor.clone(),
        &fx.library,
        ManagerOptions::default(),
    );

    let first = dm.get_month(2025, Month::FEBRUARY, None).await.unwrap();
    let second = dm.get_month(2025, Month::FEBRUARY, None).await.unwrap();
    assert_eq!(extractor.calls(), 1);
    assert_eq!(first, second);

    let keys: Vec<&str> = first.keys().collect();
    let expected: Vec<String> = (1..=28).map(|d| format!("{d:02}")).collect();
    assert_eq!(keys, expected.iter().map(String::as_str).collect::<Vec<_>>());

    dm.get_month(2025, Month::FEBRUARY, Some(false)).await.unwrap();
    assert_eq!(extractor.calls(), 2, "cache bypass must re-extract");
}

#[tokio::test]
async fn test_extraction_writes_year_then_every_month() {
    let fx = library_with(&[2025]);
    let store = Arc::new(MemoryStore::new());
    let dm = manager(
        store.clone(),
        Arc::new(CountingExtractor::default()),
        &fx.library,
        ManagerOptions::default(),
    );

    dm.get_year(2025, None).await.unwrap();
    let keys = store.keys().unwrap();
    assert_eq!(keys.len(), 13);
    assert_eq!(keys[0], CacheKey::Year(2025));
    assert!(keys.contains(&CacheKey::Month(2025, Month::DECEMBER)));
}

#[tokio::test]
async fn test_month_backfilled_from_cached_year() {
    let fx = library_with(&[2025]);
    let store = Arc::new(MemoryStore::new());
    store
        .write_year(&takvimi_core::YearDocument::new(2025, full_year(2025)))
        .unwrap();
    let extractor = Arc::new(CountingExtractor::default());
    let dm = manager(
        store.clone(),
        extractor.clone(),
        &fx.library,
        ManagerOptions::default(),
    );

    let march = dm.get_month(2025, Month::new(3).unwrap(), None).await.unwrap();
    assert_eq!(march.len(), 31);
    assert_eq!(extractor.calls(), 0);
    assert!(store.read_month(2025, Month::new(3).unwrap()).unwrap().is_some());
}

/// A store that blocks the calling thread on the runtime; doing so from an
/// async worker panics.
#[derive(Default)]
struct BlockingStore {
    inner: MemoryStore,
}

impl BlockingStore {
    fn block(&self) {
        tokio::runtime::Handle::current().block_on(std::future::ready(()));
    }
}

impl CacheStore for BlockingStore {
    fn read(&self, key: CacheKey) -> Result<Option<Vec<u8>>, takvimi_core::StoreError> {
        self.block();
        self.inner.read(key)
    }

    fn write(&self, key: CacheKey, bytes: &[u8]) -> Result<(), takvimi_core::StoreError> {
        self.block();
        self.inner.write(key, bytes)
    }

    fn keys(&self) -> Result<Vec<CacheKey>, takvimi_core::StoreError> {
        self.inner.keys()
    }
}

#[tokio::test]
async fn test_cache_io_runs_off_the_async_workers() {
    let fx = library_with(&[2025]);
    let store = Arc::new(BlockingStore::default());
    store
        .inner
        .write_year(&takvimi_core::YearDocument::new(2025, full_year(2025)))
        .unwrap();
    let extractor = Arc::new(CountingExtractor::default());
    let dm = manager(
        store.clone(),
        extractor.clone(),
        &fx.library,
        ManagerOptions::default(),
    );

    let june = dm.get_month(2025, Month::new(6).unwrap(), None).await.unwrap();
    assert_eq!(june.len(), 30);
    let year = dm.get_year(2025, Some(true)).await.unwrap();
    assert_eq!(year.missing_months(), Vec::<Month>::new());
    assert_eq!(extractor.calls(), 0);

    dm.get_year(2025, None).await.unwrap();
    assert_eq!(extractor.calls(), 1);
    assert_eq!(store.inner.keys().unwrap().len(), 13);
}

#[tokio::test]
async fn test_fs_round_trip_through_cache() {
    let fx = library_with(&[2024]);
    let json_dir = tempfile::tempdir().unwrap();
    let extractor = Arc::new(CountingExtractor::default());
    let dm = manager(
        Arc::new(FsStore::new(json_dir.path())),
        extractor.clone(),
        &fx.library,
        ManagerOptions::default(),
    );

    let extracted = dm.get_year(2024, Some(false)).await.unwrap();
    let cached = dm.get_year(2024, Some(true)).await.unwrap();
    assert_eq!(extracted, cached);
    assert_eq!(extractor.calls(), 1);
    assert_eq!(cached.month(Month::FEBRUARY).unwrap().len(), 29);

    let doc = dm.month_document(2024, Month::JANUARY, None).await.unwrap();
    let json = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["year"], "2024");
    assert_eq!(json["month"], "01");
    assert_eq!(
        json["data"]["01"]["festat_fetare_dhe_shenime_te_tjera_astronomike"],
        "Viti i Ri 2025, Hëna e re"
    );
    assert_eq!(json["data"]["01"]["kohet"]["gjatesia_e_dites"], "9:09");
}

#[tokio::test]
async fn test_missing_source_is_not_found() {
    let fx = library_with(&[]);
    let dm = manager(
        Arc::new(MemoryStore::new()),
        Arc::new(CountingExtractor::default()),
        &fx.library,
        ManagerOptions::default(),
    );
    let err = dm.get_year(1999, None).await.unwrap_err();
    assert!(matches!(err, DataError::SourceNotFound { year: 1999 }));
    let err = dm.get_month(1999, Month::JANUARY, None).await.unwrap_err();
    assert!(matches!(err, DataError::SourceNotFound { year: 1999 }));
}

#[tokio::test]
async fn test_failed_extraction_writes_nothing() {
    let fx = library_with(&[2025]);
    let store = Arc::new(MemoryStore::new());
    let extractor = Arc::new(CountingExtractor {
        fail_month: Some(Month::new(7).unwrap()),
        ..Default::default()
    });
    let dm = manager(store.clone(), extractor, &fx.library, ManagerOptions::default());

    let err = dm.get_year(2025, None).await.unwrap_err();
    match err {
        DataError::Extraction(e) => assert_eq!(e.failed_months(), vec![Month::new(7).unwrap()]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_corrupt_cache_is_an_error() {
    let fx = library_with(&[2025]);
    let store = Arc::new(MemoryStore::new());
    store.insert_raw(CacheKey::Month(2025, Month::JANUARY), "{\"year\":");
    let extractor = Arc::new(CountingExtractor::default());
    let dm = manager(store, extractor.clone(), &fx.library, ManagerOptions::default());

    let err = dm.get_month(2025, Month::JANUARY, None).await.unwrap_err();
    assert!(matches!(err, DataError::Store(_)));
    assert_eq!(extractor.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_extraction() {
    let fx = library_with(&[2025]);
    let extractor = Arc::new(CountingExtractor {
        delay: Some(Duration::from_millis(200)),
        ..Default::default()
    });
    let dm = manager(
        Arc::new(MemoryStore::new()),
        extractor.clone(),
        &fx.library,
        ManagerOptions::default(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let dm = dm.clone();
            tokio::spawn(async move { dm.get_month(2025, Month::JANUARY, None).await })
        })
        .collect();
    for h in handles {
        assert_eq!(h.await.unwrap().unwrap().len(), 31);
    }
    assert_eq!(extractor.calls(), 1);
}

#[tokio::test]
async fn test_slow_extraction_times_out() {
    let fx = library_with(&[2025]);
    let store = Arc::new(MemoryStore::new());
    let extractor = Arc::new(CountingExtractor {
        delay: Some(Duration::from_millis(500)),
        ..Default::default()
    });
    let dm = manager(
        store.clone(),
        extractor,
        &fx.library,
        ManagerOptions {
            workers: 1,
            timeout: Duration::from_millis(50),
        },
    );

    let err = dm.get_year(2025, None).await.unwrap_err();
    assert!(matches!(err, DataError::Timeout { year: 2025, .. }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_index_lists_sources_and_cache() {
    let fx = library_with(&[2025, 2026]);
    let dm = manager(
        Arc::new(MemoryStore::new()),
        Arc::new(CountingExtractor::default()),
        &fx.library,
        ManagerOptions::default(),
    );
    dm.get_year(2025, None).await.unwrap();

    let index = dm.index().unwrap();
    assert_eq!(index.available_years, vec!["2025", "2026"]);
    assert_eq!(index.available_files, vec!["takvimi2025.pdf", "takvimi2026.pdf"]);
    assert_eq!(index.processed_years, vec!["2025"]);
    assert_eq!(index.processed_months["2025"].len(), 12);
}
