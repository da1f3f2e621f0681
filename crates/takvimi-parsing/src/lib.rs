use std::path::Path;

pub mod assembler;
pub mod config;
pub mod csv_export;
pub mod day;
pub mod fields;
pub mod locator;
pub mod rows;
pub mod strategy;
pub mod text;

pub use assembler::{YearAssembler, assemble_from_pages};
pub use config::{ParsingConfig, ParsingConfigBuilder};
pub use csv_export::{ExportError, export_page, page_to_csv};
pub use day::{ParsedMonth, parse_month};
pub use locator::{LocateError, MonthPages, locate_months, locate_months_in_pdf};
// Re-export domain types from core (canonical definitions live there)
pub use takvimi_core::{
    ExtractionError, LayoutStrategy, PageLayout, PdfBackend, TextToken, YearRecord,
};

/// Extract a full year from a calendar PDF using the given backend.
///
/// Pipeline:
/// 1. Extract positioned text for every page via `backend`
/// 2. Locate each month's page range from the page headings
/// 3. Parse each month's day rows, falling back through the layout strategies
/// 4. Fill notes from note pages and infer missing weekday names
pub fn extract_year(
    pdf_path: &Path,
    year: takvimi_core::Year,
    backend: &dyn PdfBackend,
) -> Result<YearRecord, ExtractionError> {
    let pages = backend.extract_pages(pdf_path)?;
    assemble_from_pages(&pages, year, &ParsingConfig::default())
}
