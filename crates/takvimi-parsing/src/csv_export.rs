use std::path::Path;

use thiserror::Error;

use takvimi_core::{PageLayout, PdfBackend, PdfReadError};

use crate::config::ParsingConfig;
use crate::rows::cluster_rows;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Pdf(#[from] PdfReadError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One page as CSV: a record per visual row, a field per token.
///
/// Rows have as many fields as they have tokens, so the output is ragged.
pub fn page_to_csv(page: &PageLayout, config: &ParsingConfig) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in cluster_rows(&page.tokens, config.row_tolerance) {
        writer.write_record(row.words())?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Export a page by 1-based number.
pub fn export_page(
    pdf_path: &Path,
    page_num: usize,
    backend: &dyn PdfBackend,
    config: &ParsingConfig,
) -> Result<String, ExportError> {
    let index = match page_num.checked_sub(1) {
        Some(index) => index,
        None => {
            let count = backend.page_count(pdf_path)?;
            return Err(PdfReadError::PageOutOfRange { index: 0, count }.into());
        }
    };
    let page = backend.extract_page(pdf_path, index)?;
    page_to_csv(&page, config)
}
