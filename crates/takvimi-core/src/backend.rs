use std::path::Path;

use crate::error::{ExtractionError, PdfReadError};
use crate::record::{Year, YearRecord};

/// A run of text on a page with its bounding box.
///
/// Coordinates are in page units with the origin at the top-left corner and
/// y growing downward.
#[derive(Debug, Clone, PartialEq)]
pub struct TextToken {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextToken {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Positioned text of a single page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 0-based page index within the document.
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub tokens: Vec<TextToken>,
}

/// Trait for PDF layout extraction backends.
///
/// Implementors turn a page into positioned text tokens; locating months and
/// parsing day rows lives in `takvimi_parsing`.
pub trait PdfBackend: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self, path: &Path) -> Result<usize, PdfReadError>;

    /// Extract one page by 0-based index.
    fn extract_page(&self, path: &Path, page_index: usize) -> Result<PageLayout, PdfReadError>;

    /// Extract every page in order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageLayout>, PdfReadError> {
        let count = self.page_count(path)?;
        (0..count).map(|i| self.extract_page(path, i)).collect()
    }
}

/// Turns a source document into a complete year of records.
///
/// The data manager only sees this trait, so the cache layer stays independent
/// of how extraction is done.
pub trait YearExtractor: Send + Sync {
    fn extract_year(&self, path: &Path, year: Year) -> Result<YearRecord, ExtractionError>;
}

impl<T: YearExtractor + ?Sized> YearExtractor for std::sync::Arc<T> {
    fn extract_year(&self, path: &Path, year: Year) -> Result<YearRecord, ExtractionError> {
        (**self).extract_year(path, year)
    }
}
