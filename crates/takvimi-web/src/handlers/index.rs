use axum::Json;

use crate::models::{ApiInfo, EndpointInfo, HealthResponse};

pub async fn index() -> Json<ApiInfo> {
    Json(ApiInfo {
        name: "Takvimi Shqip API",
        description: "API for Albanian Islamic Calendar (Takvimi)",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            EndpointInfo {
                path: "/api/takvimi",
                description: "Available source years and cached documents",
            },
            EndpointInfo {
                path: "/api/takvimi/{year}.json",
                description: "Prayer times for a full year",
            },
            EndpointInfo {
                path: "/api/takvimi/{year}/{month}.json",
                description: "Prayer times for one month",
            },
            EndpointInfo {
                path: "/api/takvimi/{year}/page/{page}.csv",
                description: "Raw text of one PDF page as CSV",
            },
        ],
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
