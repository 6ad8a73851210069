use axum::{extract::State, Json};

use crate::{
    entities::{categoria, categoria_financeira},
    errors::ErrorResponse,
    ApiResponse, ApiResult, AppState,
};

/// Stock categories, by name
#[utoipa::path(
    get,
    path = "/api/categorias",
    responses(
        (status = 200, description = "Stock categories", body = ApiResponse<Vec<categoria::Model>>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Categorias"
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<categoria::Model>> {
    let categorias = state.services.categories.list_categories().await?;
    Ok(Json(ApiResponse::success(categorias)))
}

/// Financial categories, revenue first
#[utoipa::path(
    get,
    path = "/api/categorias-financeiras",
    responses(
        (status = 200, description = "Financial categories", body = ApiResponse<Vec<categoria_financeira::Model>>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Categorias"
)]
pub async fn list_financial_categories(
    State(state): State<AppState>,
) -> ApiResult<Vec<categoria_financeira::Model>> {
    let categorias = state
        .services
        .categories
        .list_financial_categories()
        .await?;
    Ok(Json(ApiResponse::success(categorias)))
}
