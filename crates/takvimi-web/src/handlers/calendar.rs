use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};

use takvimi_core::{Month, MonthDocument, YearDocument};

use super::{CacheQuery, parse_year, strip_ext};
use crate::error::{AppError, Result};
use crate::models::CalendarListing;
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<CalendarListing>> {
    let index = state.manager.index()?;
    Ok(Json(index.into()))
}

/// `GET /api/takvimi/{year}.json`
pub async fn year(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<YearDocument>> {
    let year = parse_year(strip_ext(&file, ".json")?)?;
    tracing::info!(year, use_cache = ?query.use_cache(), "year requested");
    let doc = state.manager.year_document(year, query.use_cache()).await?;
    Ok(Json(doc))
}

/// `GET /api/takvimi/{year}/{month}.json`
pub async fn month(
    State(state): State<Arc<AppState>>,
    Path((year, file)): Path<(String, String)>,
    Query(query): Query<CacheQuery>,
) -> Result<Json<MonthDocument>> {
    let year = parse_year(&year)?;
    let raw = strip_ext(&file, ".json")?;
    let month = Month::parse_key(raw)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid month: {raw}. Expected 1-12")))?;
    tracing::info!(year, month = %month, use_cache = ?query.use_cache(), "month requested");
    let doc = state
        .manager
        .month_document(year, month, query.use_cache())
        .await?;
    Ok(Json(doc))
}
