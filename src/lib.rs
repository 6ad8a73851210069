//! Oficina API Library
//!
//! Service-order management for a device repair shop: orders with parts,
//! labor lines, photos and status history, clients, seeded categories and
//! dashboard aggregates, served over a JSON REST API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::DefaultBodyLimit,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::db::DbPool;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

// Common response wrappers
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Success envelope carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Every route of the API, relative to `/api`.
pub fn api_routes() -> Router<AppState> {
    let ordens = Router::new()
        .route(
            "/ordens",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/ordens/stats", get(handlers::orders::order_stats))
        .route("/ordens/relatorio", get(handlers::orders::order_report))
        .route(
            "/ordens/:id",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        .route("/ordens/:id/status", patch(handlers::orders::change_status))
        .route("/ordens/:id/fotos", post(handlers::orders::upload_photos));

    let clientes = Router::new()
        .route(
            "/clientes",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route("/clientes/search", get(handlers::clients::search_clients))
        .route(
            "/clientes/:id",
            get(handlers::clients::get_client).put(handlers::clients::update_client),
        );

    let categorias = Router::new()
        .route("/categorias", get(handlers::categories::list_categories))
        .route(
            "/categorias-financeiras",
            get(handlers::categories::list_financial_categories),
        );

    Router::new()
        // Status and health endpoints
        .route("/status", get(handlers::health::api_status))
        .route("/health", get(handlers::health::health_check))
        .merge(ordens)
        .merge(clientes)
        .merge(categorias)
}

/// Full application router: the API under `/api`, Swagger UI, body limit,
/// HTTP tracing and request ids.
pub fn app_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_size;

    Router::<AppState>::new()
        .route("/", get(|| async { "oficina-api up" }))
        .nest("/api", api_routes())
        .merge(openapi::swagger_ui())
        .layer(DefaultBodyLimit::max(body_limit))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_omits_missing_message() {
        let value = serde_json::to_value(ApiResponse::success(json!({"id": 1}))).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"id": 1}}));
    }

    #[test]
    fn message_envelope_omits_data() {
        let value = serde_json::to_value(ApiResponse::message("ok")).unwrap();
        assert_eq!(value, json!({"success": true, "message": "ok"}));
    }
}
