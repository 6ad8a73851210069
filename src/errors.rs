use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

/// Message shown to clients for any storage or unexpected failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Erro interno do servidor";

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error envelope shared by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "success": false,
    "error": "Cliente, equipamento e defeito são obrigatórios",
    "details": {
        "cliente_id": "Cliente é obrigatório",
        "equipamento": null,
        "defeito": null
    }
}))]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human-readable error description
    pub error: String,
    /// Per-field messages, `null` for fields that passed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<BTreeMap<String, Option<String>>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{message}")]
    FieldValidation {
        message: String,
        details: BTreeMap<String, Option<String>>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let details = err
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let message = errors
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("Campo {} inválido", field));
                (field.to_string(), Some(message))
            })
            .collect();

        ServiceError::FieldValidation {
            message: "Dados inválidos".to_string(),
            details,
        }
    }
}

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::ValidationError(message.into())
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::FieldValidation { .. } => StatusCode::BAD_REQUEST,
            Self::DatabaseError(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return a generic message; the cause is only logged.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) | Self::Io(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            _ => self.to_string(),
        }
    }

    fn details(&self) -> Option<BTreeMap<String, Option<String>>> {
        match self {
            Self::FieldValidation { details, .. } => Some(details.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(
                request_id = current_request_id().as_deref().unwrap_or("-"),
                error = %self,
                "Request failed with internal error"
            );
        }

        let body = ErrorResponse {
            success: false,
            error: self.response_message(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}
