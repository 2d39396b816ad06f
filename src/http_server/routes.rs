//! Epidata HTTP Routes
//!
//! Query strings become [`QueryParams`]; the handler runs on the blocking
//! pool since storage access is synchronous.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::error;

use crate::api::{ApiError, ApiHandler, EpidataResponse, QueryParams};
use crate::stream::StreamError;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sources: Vec<&'static str>,
}

/// `GET /health`
pub fn health_routes(handler: Arc<ApiHandler>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(handler)
}

/// `GET /epidata/:source` and legacy `GET /api.php?source=`
pub fn epidata_routes(handler: Arc<ApiHandler>) -> Router {
    Router::new()
        .route("/epidata/:source", get(epidata_handler))
        .route("/api.php", get(legacy_handler))
        .with_state(handler)
}

async fn health_handler(State(handler): State<Arc<ApiHandler>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sources: handler.state().datasets.names(),
    };

    (StatusCode::OK, Json(response))
}

async fn epidata_handler(
    State(handler): State<Arc<ApiHandler>>,
    Path(source): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    serve(handler, source, QueryParams::from_pairs(params)).await
}

async fn legacy_handler(
    State(handler): State<Arc<ApiHandler>>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Response {
    match params.remove("source") {
        Some(source) => serve(handler, source, QueryParams::from_pairs(params)).await,
        None => to_http(EpidataResponse::error(&ApiError::missing_parameter("source"))),
    }
}

async fn serve(handler: Arc<ApiHandler>, source: String, params: QueryParams) -> Response {
    let joined = tokio::task::spawn_blocking(move || handler.handle(&source, &params)).await;
    match joined {
        Ok(response) => to_http(response),
        Err(e) => {
            error!(error = %e, "request task failed");
            let err = ApiError::from(StreamError::store_failed("request task failed"));
            to_http(EpidataResponse::error(&err))
        }
    }
}

fn to_http(response: EpidataResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}
