//! Category endpoints (admin only, reads included)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::categorie::{Categorie, CategorieQuery, CreateCategorie, UpdateCategorie},
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
    authorize(&actor, Resource::Categorie, action, None).into_result(method, path)
}

/// List categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(CategorieQuery),
    responses(
        (status = 200, description = "Paginated category list", body = Paginated<Categorie>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<CategorieQuery>,
) -> AppResult<Json<Paginated<Categorie>>> {
    require_admin(&state, &claims, Action::List, "GET", "/api/v1/categories").await?;
    let (results, total) = state.services.catalog.list_categories(&query).await?;
    Ok(Json(Paginated::new(
        results,
        total,
        query.page,
        query.page_size,
        &state,
    )))
}

/// Get one category
#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category details", body = Categorie),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Categorie>> {
    require_admin(
        &state,
        &claims,
        Action::Retrieve,
        "GET",
        &format!("/api/v1/categories/{}", id),
    )
    .await?;
    let categorie = state.services.catalog.get_categorie(id).await?;
    Ok(Json(categorie))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategorie,
    responses(
        (status = 201, description = "Category created", body = Categorie),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateCategorie>,
) -> AppResult<(StatusCode, Json<Categorie>)> {
    require_admin(&state, &claims, Action::Create, "POST", "/api/v1/categories").await?;
    let categorie = state.services.catalog.create_categorie(request).await?;
    Ok((StatusCode::CREATED, Json(categorie)))
}

/// Replace a category
#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategorie,
    responses(
        (status = 200, description = "Category replaced", body = Categorie),
        (status = 404, description = "Category not found")
    )
)]
pub async fn update_full(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCategorie>,
) -> AppResult<Json<Categorie>> {
    require_admin(
        &state,
        &claims,
        Action::Update,
        "PUT",
        &format!("/api/v1/categories/{}", id),
    )
    .await?;
    let categorie = state
        .services
        .catalog
        .update_categorie_full(id, request)
        .await?;
    Ok(Json(categorie))
}

/// Patch a category
#[utoipa::path(
    patch,
    path = "/categories/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategorie,
    responses(
        (status = 200, description = "Category updated", body = Categorie),
        (status = 404, description = "Category not found")
    )
)]
pub async fn update_partial(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCategorie>,
) -> AppResult<Json<Categorie>> {
    require_admin(
        &state,
        &claims,
        Action::Update,
        "PATCH",
        &format!("/api/v1/categories/{}", id),
    )
    .await?;
    let categorie = state
        .services
        .catalog
        .update_categorie_partial(id, request)
        .await?;
    Ok(Json(categorie))
}

/// Delete a category. Book associations are removed with it.
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found")
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
        &format!("/api/v1/categories/{}", id),
    )
    .await?;
    state.services.catalog.delete_categorie(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
