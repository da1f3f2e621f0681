pub mod backend;
pub mod config_file;
pub mod error;
pub mod manager;
pub mod record;
pub mod source;
pub mod store;

// Re-export for convenience
pub use backend::{PageLayout, PdfBackend, TextToken, YearExtractor};
pub use error::{
    ExtractionError, LayoutStrategy, MonthFailure, PdfReadError, Rejection, StrategyAttempt,
};
pub use manager::{CalendarIndex, DataError, DataManager, ManagerOptions};
pub use record::{
    DayGap, DayRecord, Month, MonthDocument, MonthRecord, PrayerTimes, Year, YearDocument,
    YearRecord,
};
pub use source::PdfLibrary;
pub use store::{CacheKey, CacheStore, CacheStoreExt, FsStore, MemoryStore, StoreError};
