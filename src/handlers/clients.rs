use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::common::{parse_id, ApiJson, PaginatedResponse, Pagination};
use crate::{
    dto::clients::{ClienteListQuery, ClienteRequest, ClienteSearchQuery},
    entities::cliente,
    errors::{ErrorResponse, ServiceError},
    services::clients::CLIENT_NOT_FOUND,
    ApiResponse, ApiResult, AppState,
};

/// List clients
#[utoipa::path(
    get,
    path = "/api/clientes",
    params(ClienteListQuery),
    responses(
        (status = 200, description = "Clients retrieved successfully", body = PaginatedResponse<cliente::Model>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Clientes"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClienteListQuery>,
) -> Result<Json<PaginatedResponse<cliente::Model>>, ServiceError> {
    let pagination =
        Pagination::from_config(query.page.as_deref(), query.limit.as_deref(), &state.config);
    let (clientes, total) = state
        .services
        .clients
        .list_clients(query.q.as_deref(), pagination.offset(), pagination.limit)
        .await?;
    Ok(Json(PaginatedResponse::new(clientes, pagination, total)))
}

/// Search clients by name, phone or email
#[utoipa::path(
    get,
    path = "/api/clientes/search",
    params(ClienteSearchQuery),
    responses(
        (status = 200, description = "Matching clients", body = ApiResponse<Vec<cliente::Model>>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Clientes"
)]
pub async fn search_clients(
    State(state): State<AppState>,
    Query(query): Query<ClienteSearchQuery>,
) -> ApiResult<Vec<cliente::Model>> {
    let clientes = state
        .services
        .clients
        .search_clients(query.q.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(ApiResponse::success(clientes)))
}

#[utoipa::path(
    get,
    path = "/api/clientes/{id}",
    params(("id" = i32, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client retrieved successfully", body = ApiResponse<cliente::Model>),
        (status = 404, description = "Client not found", body = ErrorResponse),
    ),
    tag = "Clientes"
)]
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<cliente::Model> {
    let id = parse_id(&id, CLIENT_NOT_FOUND)?;
    let cliente = state.services.clients.get_client(id).await?;
    Ok(Json(ApiResponse::success(cliente)))
}

#[utoipa::path(
    post,
    path = "/api/clientes",
    request_body = ClienteRequest,
    responses(
        (status = 201, description = "Client created", body = ApiResponse<cliente::Model>),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
    ),
    tag = "Clientes"
)]
pub async fn create_client(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ClienteRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let cliente = state.services.clients.create_client(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Cliente criado com sucesso", cliente)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/clientes/{id}",
    params(("id" = i32, Path, description = "Client id")),
    request_body = ClienteRequest,
    responses(
        (status = 200, description = "Client updated", body = ApiResponse<cliente::Model>),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse),
    ),
    tag = "Clientes"
)]
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ClienteRequest>,
) -> ApiResult<cliente::Model> {
    let id = parse_id(&id, CLIENT_NOT_FOUND)?;
    let cliente = state.services.clients.update_client(id, request).await?;
    Ok(Json(ApiResponse::with_message(
        "Cliente atualizado com sucesso",
        cliente,
    )))
}
