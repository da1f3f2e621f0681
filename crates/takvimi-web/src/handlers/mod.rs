pub mod calendar;
pub mod index;
pub mod page;

use serde::Deserialize;

use takvimi_core::Year;

use crate::error::AppError;

/// `?use_cache=` as sent by clients; anything but `true` (any case) means off.
#[derive(Debug, Default, Deserialize)]
pub struct CacheQuery {
    pub use_cache: Option<String>,
}

impl CacheQuery {
    /// `None` when absent so the manager's per-kind default applies.
    pub fn use_cache(&self) -> Option<bool> {
        self.use_cache
            .as_deref()
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

/// Strip a required file suffix from the last path segment.
fn strip_ext<'a>(segment: &'a str, ext: &str) -> Result<&'a str, AppError> {
    segment
        .strip_suffix(ext)
        .ok_or_else(|| AppError::NotFound(format!("Unknown resource: {segment}")))
}

fn parse_year(raw: &str) -> Result<Year, AppError> {
    raw.parse::<Year>()
        .ok()
        .filter(|y| *y > 0)
        .ok_or_else(|| AppError::NotFound(format!("Unknown year: {raw}")))
}
