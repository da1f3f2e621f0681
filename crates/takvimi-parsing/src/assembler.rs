use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use takvimi_core::{
    ExtractionError, Month, MonthFailure, PageLayout, PdfBackend, Year, YearExtractor, YearRecord,
};

use crate::config::ParsingConfig;
use crate::day::{ParsedMonth, parse_month};
use crate::locator::{LocateError, MonthPages, locate_months};

/// Builds a full year from a calendar PDF.
///
/// Pages are extracted once and months located once; the located months are
/// then parsed in parallel. Any failed month fails the whole year.
#[derive(Clone)]
pub struct YearAssembler {
    backend: Arc<dyn PdfBackend>,
    config: ParsingConfig,
}

impl YearAssembler {
    pub fn new(backend: Arc<dyn PdfBackend>) -> Self {
        Self::with_config(backend, ParsingConfig::default())
    }

    pub fn with_config(backend: Arc<dyn PdfBackend>, config: ParsingConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    pub fn assemble_year(&self, pdf_path: &Path, year: Year) -> Result<YearRecord, ExtractionError> {
        let pages = self.backend.extract_pages(pdf_path)?;
        tracing::info!(year, pages = pages.len(), "assembling year");
        assemble_from_pages(&pages, year, &self.config)
    }
}

impl YearExtractor for YearAssembler {
    fn extract_year(&self, path: &Path, year: Year) -> Result<YearRecord, ExtractionError> {
        self.assemble_year(path, year)
    }
}

/// Assemble a year from already extracted pages.
pub fn assemble_from_pages(
    pages: &[PageLayout],
    year: Year,
    config: &ParsingConfig,
) -> Result<YearRecord, ExtractionError> {
    let mut failures: Vec<MonthFailure> = Vec::new();
    let located = match locate_months(pages, config) {
        Ok(located) => located,
        Err(LocateError::MonthNotFound { missing, located }) => {
            tracing::warn!(year, missing = ?missing, "month headings not found");
            failures.extend(missing.into_iter().map(|month| MonthFailure {
                month,
                error: ExtractionError::MonthNotFound(month),
            }));
            located
        }
        Err(LocateError::Pdf(e)) => return Err(e.into()),
    };

    let results: Vec<(Month, Result<ParsedMonth, ExtractionError>)> = month_jobs(pages, &located)
        .into_par_iter()
        .map(|(month, month_pages)| (month, parse_month(year, month, &month_pages, config)))
        .collect();

    let mut record = YearRecord::new();
    for (month, result) in results {
        match result {
            Ok(parsed) => {
                tracing::info!(year, month = %month, strategy = %parsed.strategy, days = parsed.record.len(), "month extracted");
                record.insert(month, parsed.record);
            }
            Err(error) => {
                tracing::warn!(year, month = %month, error = %error, "month extraction failed");
                failures.push(MonthFailure { month, error });
            }
        }
    }

    if !failures.is_empty() {
        failures.sort_by_key(|f| f.month);
        return Err(ExtractionError::YearExtractionFailed { year, failures });
    }
    Ok(record)
}

fn month_jobs<'a>(pages: &'a [PageLayout], located: &MonthPages) -> Vec<(Month, Vec<&'a PageLayout>)> {
    located
        .iter()
        .map(|(month, indices)| {
            let month_pages = indices
                .iter()
                .filter_map(|i| pages.iter().find(|p| p.index == *i))
                .collect();
            (month, month_pages)
        })
        .collect()
}
