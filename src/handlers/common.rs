use async_trait::async_trait;
use axum::{
    extract::{multipart::Field, FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::warn;
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    dto::orders::{FieldMap, OrderInput},
    errors::ServiceError,
    services::photos::{PhotoStorage, StagedFile},
    AppState,
};

const MAX_OFFSET: u64 = i64::MAX as u64;

/// Page/limit pair resolved from raw query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Missing, non-numeric or zero values fall back to page 1 and the
    /// configured default size; sizes above the maximum are clamped.
    pub fn resolve(page: Option<&str>, limit: Option<&str>, default_limit: u64, max_limit: u64) -> Self {
        fn positive(raw: Option<&str>) -> Option<u64> {
            raw.and_then(|v| v.trim().parse::<u64>().ok()).filter(|v| *v > 0)
        }

        Self {
            page: positive(page).unwrap_or(1),
            limit: positive(limit).unwrap_or(default_limit).min(max_limit),
        }
    }

    pub fn from_config(page: Option<&str>, limit: Option<&str>, config: &AppConfig) -> Self {
        Self::resolve(
            page,
            limit,
            config.api_default_page_size,
            config.api_max_page_size,
        )
    }

    /// Zero-based row offset, capped at the largest value SQL accepts.
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .checked_mul(self.limit)
            .map_or(MAX_OFFSET, |offset| offset.min(MAX_OFFSET))
    }
}

/// Standard pagination response metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total: u64) -> Self {
        Self {
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages: total.div_ceil(pagination.limit.max(1)),
        }
    }
}

/// Standard paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total: u64) -> Self {
        Self {
            success: true,
            data,
            pagination: PaginationMeta::new(pagination, total),
        }
    }
}

/// Parses a path id; ids that cannot exist resolve to `not_found`.
pub fn parse_id(raw: &str, not_found: &str) -> Result<i32, ServiceError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ServiceError::not_found(not_found))
}

/// JSON body extractor whose rejections use the error envelope.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ServiceError::validation(format!(
                "Corpo da requisição inválido: {}",
                rejection.body_text()
            ))),
        }
    }
}

/// Reads every part of a multipart form: photo parts are written to storage,
/// text parts become fields. Already staged files are discarded on failure.
pub async fn read_multipart(
    storage: &PhotoStorage,
    mut multipart: Multipart,
) -> Result<(FieldMap, Vec<StagedFile>), ServiceError> {
    let mut fields = FieldMap::new();
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                PhotoStorage::discard(&files).await;
                return Err(ServiceError::validation(format!(
                    "Upload inválido: {}",
                    e.body_text()
                )));
            }
        };

        if let Err(e) = read_part(storage, field, &mut fields, &mut files).await {
            PhotoStorage::discard(&files).await;
            return Err(e);
        }
    }

    Ok((fields, files))
}

async fn read_part(
    storage: &PhotoStorage,
    field: Field<'_>,
    fields: &mut FieldMap,
    files: &mut Vec<StagedFile>,
) -> Result<(), ServiceError> {
    let Some(name) = field.name().map(str::to_string) else {
        return Ok(());
    };
    let file_name = field.file_name().map(str::to_string);

    if file_name.is_some() || PhotoStorage::is_photo_field(&name) {
        let data = field
            .bytes()
            .await
            .map_err(|e| ServiceError::validation(format!("Upload inválido: {}", e.body_text())))?;
        if !PhotoStorage::is_photo_field(&name) {
            warn!(field = %name, "Ignoring file sent in a non-photo field");
            return Ok(());
        }
        if data.is_empty() {
            return Ok(());
        }
        files.push(storage.store(file_name.as_deref(), &data).await?);
        return Ok(());
    }

    let text = field
        .text()
        .await
        .map_err(|e| ServiceError::validation(format!("Upload inválido: {}", e.body_text())))?;
    fields.insert(name, Value::String(text));
    Ok(())
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Order create/update body: a JSON object or a multipart form with photos.
pub struct OrderForm {
    pub input: OrderInput,
    pub files: Vec<StagedFile>,
}

#[async_trait]
impl FromRequest<AppState> for OrderForm {
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                ServiceError::validation(format!("Upload inválido: {}", e.body_text()))
            })?;
            let (fields, files) = read_multipart(&state.services.photos, multipart).await?;
            return Ok(Self {
                input: OrderInput::from_fields(&fields),
                files,
            });
        }

        let ApiJson(body) = ApiJson::<Value>::from_request(req, state).await?;
        match body {
            Value::Object(fields) => Ok(Self {
                input: OrderInput::from_fields(&fields),
                files: Vec::new(),
            }),
            _ => Err(ServiceError::validation(
                "Corpo da requisição deve ser um objeto JSON",
            )),
        }
    }
}
