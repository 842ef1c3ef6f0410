//! API handlers for the library REST endpoints

pub mod auth;
pub mod auteurs;
pub mod avis;
pub mod categories;
pub mod emprunts;
pub mod health;
pub mod livres;
pub mod membres;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header::ALLOW, header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::user::UserClaims,
    permissions::Actor,
    AppState,
};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Extractor for endpoints open to anonymous callers. A present but invalid
/// token is still rejected.
pub struct OptionalUser(pub Option<UserClaims>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(claims_from_parts(parts, state)?))
    }
}

fn claims_from_parts(parts: &Parts, state: &AppState) -> AppResult<Option<UserClaims>> {
    let auth_header = match parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        Some(header) => header,
        None => return Ok(None),
    };

    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Authentication(
            "Invalid authorization header format".to_string(),
        ));
    }

    let token = &auth_header[7..];
    let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Authentication(e.to_string()))?;
    Ok(Some(claims))
}

/// Resolve the caller into a policy actor, membership included
pub async fn resolve_actor(state: &AppState, claims: Option<&UserClaims>) -> AppResult<Actor> {
    state.services.members.resolve_actor(claims).await
}

/// Paginated list envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Paginated<T> {
    /// Wrap one page of results, echoing the window actually used
    pub fn new(
        results: Vec<T>,
        total: i64,
        page: Option<i64>,
        page_size: Option<i64>,
        state: &AppState,
    ) -> Self {
        let (page, page_size, _) =
            crate::repository::page_window(page, page_size, &state.config.pagination);
        Self {
            results,
            total,
            page,
            page_size,
        }
    }
}

/// Rewrite axum's bare 405 responses into the JSON error envelope,
/// preserving the Allow header it computed.
pub async fn method_not_allowed(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allowed: Vec<String> = response
        .headers()
        .get(ALLOW)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .map(|method| method.trim().to_string())
                .filter(|method| !method.is_empty())
                .collect()
        })
        .unwrap_or_default();

    AppError::MethodNotAllowed(allowed).into_response()
}
