//! Author endpoints (admin only, reads included)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::auteur::{Auteur, AuteurQuery, CreateAuteur, UpdateAuteur},
    models::user::UserClaims,
    permissions::{authorize, Action, Resource},
    AppState,
};

use super::{resolve_actor, AuthenticatedUser, Paginated};

async fn require_admin(
    state: &AppState,
    claims: &UserClaims,
    action: Action,
    method: &str,
    path: &str,
) -> AppResult<()> {
    let actor = resolve_actor(state, Some(claims)).await?;
    authorize(&actor, Resource::Auteur, action, None).into_result(method, path)
}

/// List authors
#[utoipa::path(
    get,
    path = "/auteurs",
    tag = "auteurs",
    security(("bearer_auth" = [])),
    params(AuteurQuery),
    responses(
        (status = 200, description = "Paginated author list", body = Paginated<Auteur>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AuteurQuery>,
) -> AppResult<Json<Paginated<Auteur>>> {
    require_admin(&state, &claims, Action::List, "GET", "/api/v1/auteurs").await?;
    let (results, total) = state.services.catalog.list_auteurs(&query).await?;
    Ok(Json(Paginated::new(
        results,
        total,
        query.page,
        query.page_size,
        &state,
    )))
}

/// Get one author
#[utoipa::path(
    get,
    path = "/auteurs/{id}",
    tag = "auteurs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = Auteur),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Auteur>> {
    require_admin(
        &state,
        &claims,
        Action::Retrieve,
        "GET",
        &format!("/api/v1/auteurs/{}", id),
    )
    .await?;
    let auteur = state.services.catalog.get_auteur(id).await?;
    Ok(Json(auteur))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/auteurs",
    tag = "auteurs",
    security(("bearer_auth" = [])),
    request_body = CreateAuteur,
    responses(
        (status = 201, description = "Author created", body = Auteur),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateAuteur>,
) -> AppResult<(StatusCode, Json<Auteur>)> {
    require_admin(&state, &claims, Action::Create, "POST", "/api/v1/auteurs").await?;
    let auteur = state.services.catalog.create_auteur(request).await?;
    Ok((StatusCode::CREATED, Json(auteur)))
}

/// Replace an author
#[utoipa::path(
    put,
    path = "/auteurs/{id}",
    tag = "auteurs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = UpdateAuteur,
    responses(
        (status = 200, description = "Author replaced", body = Auteur),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_full(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateAuteur>,
) -> AppResult<Json<Auteur>> {
    require_admin(
        &state,
        &claims,
        Action::Update,
        "PUT",
        &format!("/api/v1/auteurs/{}", id),
    )
    .await?;
    let auteur = state.services.catalog.update_auteur_full(id, request).await?;
    Ok(Json(auteur))
}

/// Patch an author
#[utoipa::path(
    patch,
    path = "/auteurs/{id}",
    tag = "auteurs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = UpdateAuteur,
    responses(
        (status = 200, description = "Author updated", body = Auteur),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_partial(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateAuteur>,
) -> AppResult<Json<Auteur>> {
    require_admin(
        &state,
        &claims,
        Action::Update,
        "PATCH",
        &format!("/api/v1/auteurs/{}", id),
    )
    .await?;
    let auteur = state
        .services
        .catalog
        .update_auteur_partial(id, request)
        .await?;
    Ok(Json(auteur))
}

/// Delete an author. Their books stay, with the author reference cleared.
#[utoipa::path(
    delete,
    path = "/auteurs/{id}",
    tag = "auteurs",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_admin(
        &state,
        &claims,
        Action::Delete,
        "DELETE",
        &format!("/api/v1/auteurs/{}", id),
    )
    .await?;
    state.services.catalog.delete_auteur(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
