//! Error types for the Biblio server

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Context attached to a permission denial: which request was denied and
/// which rules were consulted.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PermissionContext {
    pub method: String,
    pub path: String,
    pub permissions: Vec<String>,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Permission denied")]
    Forbidden(PermissionContext),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid fields")]
    FieldValidation(BTreeMap<String, String>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed(Vec<String>),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect::<Vec<_>>()
                    .join(", ");
                let message = if message.is_empty() {
                    "invalid value".to_string()
                } else {
                    message
                };
                (field.to_string(), message)
            })
            .collect();
        AppError::FieldValidation(fields)
    }
}

/// Uniform error envelope returned for every failure
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub error: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<PermissionContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<String>>,
}

impl ErrorResponse {
    fn new(status: StatusCode, error: &str, detail: String) -> Self {
        Self {
            status_code: status.as_u16(),
            error: error.to_string(),
            detail,
            details: None,
            fields: None,
            allowed_methods: None,
        }
    }
}

/// True when the database error is a unique or foreign-key violation
fn is_integrity_error(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            // 23505 unique_violation, 23503 foreign_key_violation
            matches!(db.code().as_deref(), Some("23505") | Some("23503"))
        }
        _ => false,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self {
            AppError::Authentication(msg) => {
                tracing::debug!("Authentication failure: {}", msg);
                ErrorResponse::new(
                    StatusCode::UNAUTHORIZED,
                    "not_authenticated",
                    "Please login to proceed".to_string(),
                )
            }
            AppError::Forbidden(context) => {
                let mut b = ErrorResponse::new(
                    StatusCode::FORBIDDEN,
                    "permission_denied",
                    format!(
                        "You do not have permission to perform {} on {}",
                        context.method, context.path
                    ),
                );
                b.details = Some(context);
                b
            }
            AppError::NotFound(msg) => {
                ErrorResponse::new(StatusCode::NOT_FOUND, "not_found", msg)
            }
            AppError::Validation(msg) => {
                ErrorResponse::new(StatusCode::BAD_REQUEST, "validation_error", msg)
            }
            AppError::FieldValidation(fields) => {
                let mut b = ErrorResponse::new(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    "One or more fields are invalid".to_string(),
                );
                b.fields = Some(fields);
                b
            }
            AppError::Database(e) if is_integrity_error(&e) => {
                tracing::warn!("Integrity error: {:?}", e);
                ErrorResponse::new(
                    StatusCode::CONFLICT,
                    "integrity_error",
                    "The data you are trying to insert don't fit our database requirements"
                        .to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ErrorResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                ErrorResponse::new(StatusCode::CONFLICT, "conflict", msg)
            }
            AppError::BadRequest(msg) => {
                ErrorResponse::new(StatusCode::BAD_REQUEST, "bad_request", msg)
            }
            AppError::MethodNotAllowed(allowed) => {
                let mut b = ErrorResponse::new(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "method_not_allowed",
                    format!("Allowed methods: {}", allowed.join(", ")),
                );
                b.allowed_methods = Some(allowed);
                b
            }
            AppError::BusinessRule(msg) => {
                ErrorResponse::new(StatusCode::UNPROCESSABLE_ENTITY, "business_rule", msg)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ErrorResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let status =
            StatusCode::from_u16(body.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_envelope_carries_request_context() {
        let err = AppError::Forbidden(PermissionContext {
            method: "DELETE".to_string(),
            path: "/api/v1/emprunts/3".to_string(),
            permissions: vec!["IsAdminOrOwningMember".to_string()],
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn field_validation_maps_to_bad_request() {
        let mut fields = BTreeMap::new();
        fields.insert("isbn".to_string(), "must contain 13 digits".to_string());
        let response = AppError::FieldValidation(fields).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn method_not_allowed_lists_verbs() {
        let response =
            AppError::MethodNotAllowed(vec!["GET".to_string(), "POST".to_string()]).into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
