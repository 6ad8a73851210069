use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::common::{parse_id, read_multipart, ApiJson, OrderForm, PaginatedResponse, Pagination};
use crate::{
    dto::{
        orders::{
            OrderDetail, OrderListQuery, OrderSummary, OrderWithClient, StatusChangeRequest,
            UploadedPhoto,
        },
        reports::{DashboardStats, OrderReport, ReportQuery},
    },
    errors::{ErrorResponse, ServiceError},
    services::orders::{OrderFilters, ORDER_NOT_FOUND},
    ApiResponse, ApiResult, AppState,
};

/// List service orders
#[utoipa::path(
    get,
    path = "/api/ordens",
    summary = "List service orders",
    description = "Paginated list, newest entry first. Blank filter values are ignored.",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = PaginatedResponse<OrderSummary>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Ordens"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<PaginatedResponse<OrderSummary>>, ServiceError> {
    let filters = OrderFilters::from_query(&query)?;
    let pagination =
        Pagination::from_config(query.page.as_deref(), query.limit.as_deref(), &state.config);

    let page = state
        .services
        .orders
        .list_orders(&filters, pagination.offset(), pagination.limit)
        .await?;

    Ok(Json(PaginatedResponse::new(page.items, pagination, page.total)))
}

/// Get a service order with parts, services, photos and history
#[utoipa::path(
    get,
    path = "/api/ordens/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Ordens"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<OrderDetail> {
    let id = parse_id(&id, ORDER_NOT_FOUND)?;
    let detail = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Create a service order
///
/// Accepts a JSON object or `multipart/form-data`; in forms `pecas` and
/// `servicos` are JSON-encoded strings and photos go in `fotos`.
#[utoipa::path(
    post,
    path = "/api/ordens",
    request_body(content = serde_json::Value, description = "Order fields, parts and services", content_type = "application/json"),
    responses(
        (status = 201, description = "Order created successfully", body = ApiResponse<OrderWithClient>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Ordens"
)]
pub async fn create_order(
    State(state): State<AppState>,
    form: OrderForm,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .orders
        .create_order(form.input, form.files)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Ordem de serviço criada com sucesso",
            created,
        )),
    ))
}

/// Update a service order and replace its parts and services
#[utoipa::path(
    put,
    path = "/api/ordens/{id}",
    params(("id" = i32, Path, description = "Order id")),
    request_body(content = serde_json::Value, description = "Order fields, parts and services", content_type = "application/json"),
    responses(
        (status = 200, description = "Order updated successfully", body = ApiResponse<OrderWithClient>),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Ordens"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: OrderForm,
) -> ApiResult<OrderWithClient> {
    let id = match parse_id(&id, ORDER_NOT_FOUND) {
        Ok(id) => id,
        Err(e) => {
            crate::services::photos::PhotoStorage::discard(&form.files).await;
            return Err(e);
        }
    };

    let updated = state
        .services
        .orders
        .update_order(id, form.input, form.files)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Ordem de serviço atualizada com sucesso",
        updated,
    )))
}

/// Change only the status of a service order
#[utoipa::path(
    patch,
    path = "/api/ordens/{id}/status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Missing or invalid status", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Ordens"
)]
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<StatusChangeRequest>,
) -> ApiResult<serde_json::Value> {
    let id = parse_id(&id, ORDER_NOT_FOUND)?;
    state.services.orders.change_status(id, request).await?;
    Ok(Json(ApiResponse::message("Status alterado com sucesso")))
}

/// Delete a service order with everything attached to it
#[utoipa::path(
    delete,
    path = "/api/ordens/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Ordens"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let id = parse_id(&id, ORDER_NOT_FOUND)?;
    state.services.orders.delete_order(id).await?;
    Ok(Json(ApiResponse::message(
        "Ordem de serviço deletada com sucesso",
    )))
}

/// Attach photos to an existing order
#[utoipa::path(
    post,
    path = "/api/ordens/{id}/fotos",
    params(("id" = i32, Path, description = "Order id")),
    request_body(content = String, description = "Photo files in the `fotos` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Photos attached", body = ApiResponse<Vec<UploadedPhoto>>),
        (status = 400, description = "No photo sent", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Ordens"
)]
pub async fn upload_photos(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Vec<UploadedPhoto>> {
    let id = parse_id(&id, ORDER_NOT_FOUND)?;
    state.services.orders.ensure_exists(id).await?;

    let files = match multipart {
        Ok(multipart) => read_multipart(&state.services.photos, multipart).await?.1,
        Err(_) => Vec::new(),
    };

    let fotos = state.services.orders.add_photos(id, files).await?;
    let message = format!("{} foto(s) adicionada(s) com sucesso", fotos.len());
    Ok(Json(ApiResponse::with_message(message, fotos)))
}

/// Dashboard figures for the current month and day
#[utoipa::path(
    get,
    path = "/api/ordens/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = ApiResponse<DashboardStats>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Dashboard"
)]
pub async fn order_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let stats = state.services.dashboard.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Orders of a period with totals
#[utoipa::path(
    get,
    path = "/api/ordens/relatorio",
    params(ReportQuery),
    responses(
        (status = 200, description = "Report generated", body = ApiResponse<OrderReport>),
        (status = 400, description = "Invalid date", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "Dashboard"
)]
pub async fn order_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<OrderReport> {
    let report = state.services.dashboard.report(query).await?;
    Ok(Json(ApiResponse::success(report)))
}
