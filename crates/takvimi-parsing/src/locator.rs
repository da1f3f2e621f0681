use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use takvimi_core::{Month, PageLayout, PdfBackend, PdfReadError};

use crate::config::ParsingConfig;
use crate::text::month_from_word;

/// Page indices (0-based, ascending) belonging to each located month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthPages {
    ranges: BTreeMap<Month, Vec<usize>>,
}

impl MonthPages {
    pub fn get(&self, month: Month) -> Option<&[usize]> {
        self.ranges.get(&month).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Month, &[usize])> {
        self.ranges.iter().map(|(m, p)| (*m, p.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn missing(&self) -> Vec<Month> {
        Month::all().filter(|m| !self.ranges.contains_key(m)).collect()
    }
}

#[derive(Error, Debug, Clone)]
pub enum LocateError {
    #[error("no heading found for months {missing:?}")]
    MonthNotFound {
        missing: Vec<Month>,
        located: MonthPages,
    },
    #[error(transparent)]
    Pdf(#[from] PdfReadError),
}

/// The month named by a page heading, if any.
///
/// Only tokens whose top edge lies in the heading band are considered; when
/// several name a month the topmost (then leftmost) wins.
pub fn heading_month(page: &PageLayout, config: &ParsingConfig) -> Option<Month> {
    let band = page.height * config.heading_band;
    page.tokens
        .iter()
        .filter(|t| t.y <= band)
        .filter_map(|t| month_from_word(&t.text).map(|m| (t, m)))
        .min_by(|(a, _), (b, _)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(_, m)| m)
}

/// Assign pages to months by their headings.
///
/// A month's range runs from the first page carrying its heading up to the
/// page before the next page headed by a different month. Pages before the
/// first heading are ignored, as are pages under a heading for a month whose
/// range already ended.
pub fn locate_months(pages: &[PageLayout], config: &ParsingConfig) -> Result<MonthPages, LocateError> {
    let mut located = MonthPages::default();
    let mut current: Option<Month> = None;

    for page in pages {
        if let Some(month) = heading_month(page, config)
            && current != Some(month)
        {
            if located.ranges.contains_key(&month) {
                tracing::debug!(page = page.index, month = %month, "heading repeats an earlier month, ignoring page");
                current = None;
                continue;
            }
            current = Some(month);
        }
        if let Some(month) = current {
            located.ranges.entry(month).or_default().push(page.index);
        }
    }

    let missing = located.missing();
    if !missing.is_empty() {
        return Err(LocateError::MonthNotFound { missing, located });
    }
    Ok(located)
}

/// [`locate_months`] over every page of a PDF.
pub fn locate_months_in_pdf(
    pdf_path: &Path,
    backend: &dyn PdfBackend,
    config: &ParsingConfig,
) -> Result<MonthPages, LocateError> {
    let pages = backend.extract_pages(pdf_path)?;
    locate_months(&pages, config)
}
