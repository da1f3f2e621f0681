use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use takvimi_parsing::export_page;

use super::{parse_year, strip_ext};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// `GET /api/takvimi/{year}/page/{page}.csv`, page numbers start at 1.
pub async fn page_csv(
    State(state): State<Arc<AppState>>,
    Path((year, file)): Path<(String, String)>,
) -> Result<Response> {
    let year = parse_year(&year)?;
    let raw = strip_ext(&file, ".csv")?;
    let page_num: usize = raw
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid page number: {raw}")))?;

    let library = state.manager.library();
    if !library.exists(year) {
        return Err(AppError::NotFound(format!(
            "No calendar PDF available for year {year}"
        )));
    }

    let path = library.path_for(year);
    let backend = state.backend.clone();
    let config = state.parsing.clone();
    let csv = tokio::task::spawn_blocking(move || {
        export_page(&path, page_num, backend.as_ref(), &config)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let disposition = format!("attachment;filename=takvimi{year}_page{page_num}.csv");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
