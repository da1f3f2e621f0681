use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::record::{Month, Year};

/// Failure reading positioned text out of a PDF.
#[derive(Error, Debug, Clone)]
pub enum PdfReadError {
    #[error("PDF not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
    #[error("failed to extract page {page}: {message}")]
    Extraction { page: usize, message: String },
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),
}

impl From<std::io::Error> for PdfReadError {
    fn from(err: std::io::Error) -> Self {
        PdfReadError::Io(Arc::new(err))
    }
}

/// Layout strategies for turning page rows into day records, in the order
/// they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutStrategy {
    /// Time columns located by consensus x-positions.
    ColumnBins,
    /// Times taken left to right by pattern, positions ignored.
    PositionalRegex,
    /// Token stream re-split on day-number anchors.
    RowReconciliation,
}

impl LayoutStrategy {
    pub const ORDER: [LayoutStrategy; 3] = [
        LayoutStrategy::ColumnBins,
        LayoutStrategy::PositionalRegex,
        LayoutStrategy::RowReconciliation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayoutStrategy::ColumnBins => "column_bins",
            LayoutStrategy::PositionalRegex => "positional_regex",
            LayoutStrategy::RowReconciliation => "row_reconciliation",
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a strategy's result was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("no timetable rows found")]
    NoTimetableRows,
    #[error("only {found} rows agree on column positions, need {needed}")]
    NoColumnConsensus { found: usize, needed: usize },
    #[error("{count} rows have times outside the column bins")]
    MisalignedRows { count: usize },
    #[error("day {0} appears more than once with different content")]
    DuplicateDay(u32),
    #[error("missing days {0:?}")]
    MissingDays(Vec<u32>),
    #[error("day {0} is outside the month")]
    DayOutOfRange(u32),
    #[error("row counts are consistent, reconciliation not needed")]
    NotNeeded,
}

/// One strategy's outcome within a failed month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    pub strategy: LayoutStrategy,
    pub rejection: Rejection,
}

impl fmt::Display for StrategyAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.rejection)
    }
}

/// A month that could not be produced, with its cause.
#[derive(Debug, Clone)]
pub struct MonthFailure {
    pub month: Month,
    pub error: ExtractionError,
}

impl fmt::Display for MonthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "month {}: {}", self.month, self.error)
    }
}

#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    #[error(transparent)]
    Pdf(#[from] PdfReadError),
    #[error("no heading found for month {0}")]
    MonthNotFound(Month),
    #[error("month {month} (pages {pages:?}) could not be parsed: {}", join(.attempts))]
    MonthExtractionFailed {
        month: Month,
        pages: Vec<usize>,
        attempts: Vec<StrategyAttempt>,
    },
    #[error("year {year} extraction failed: {}", join(.failures))]
    YearExtractionFailed {
        year: Year,
        failures: Vec<MonthFailure>,
    },
}

impl ExtractionError {
    /// Months named by this error, in ascending order.
    pub fn failed_months(&self) -> Vec<Month> {
        match self {
            ExtractionError::Pdf(_) => Vec::new(),
            ExtractionError::MonthNotFound(m) => vec![*m],
            ExtractionError::MonthExtractionFailed { month, .. } => vec![*month],
            ExtractionError::YearExtractionFailed { failures, .. } => {
                let mut months: Vec<Month> = failures.iter().map(|f| f.month).collect();
                months.sort();
                months
            }
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
