use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::aggregator::{AggregateError, Aggregator};

pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    source: String,
}

impl IntoResponse for AggregateError {
    fn into_response(self) -> Response {
        match self {
            AggregateError::SourceNotFound(source) => {
                let body = ErrorBody {
                    success: false,
                    error: "Source not found".to_string(),
                    source,
                };
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/feeds", get(all_feeds))
        .route("/api/feeds/:source", get(source_feed))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Route handlers
pub async fn index() -> impl IntoResponse {
    "Box Box Box is running! API available at /api/feeds"
}

pub async fn all_feeds(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.aggregator.aggregate_all().await)
}

pub async fn source_feed(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
) -> Result<impl IntoResponse, AggregateError> {
    let response = state.aggregator.aggregate_one(&source).await?;
    Ok(Json(response))
}

pub async fn health() -> impl IntoResponse {
    "OK"
}
