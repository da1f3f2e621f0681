use serde::Serialize;

use takvimi_core::CalendarIndex;

pub const CACHING_INFO: &str = "By default, caching is enabled for month data and disabled for full year data. \
To change this behavior, add ?use_cache=true or ?use_cache=false to your request.";

#[derive(Serialize)]
pub struct ApiInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /api/takvimi` body: the calendar index plus a note on cache defaults.
#[derive(Serialize)]
pub struct CalendarListing {
    #[serde(flatten)]
    pub index: CalendarIndex,
    pub caching_info: &'static str,
}

impl From<CalendarIndex> for CalendarListing {
    fn from(index: CalendarIndex) -> Self {
        Self {
            index,
            caching_info: CACHING_INFO,
        }
    }
}
