//! Book endpoints

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::livre::{CreateLivre, Livre, LivreQuery, UpdateLivre},
    permissions::{authorize, Action, Resource, Target},
    repository::livres::LivreScope,
    services::cache,
    AppState,
};

use super::{resolve_actor, AuthenticatedUser, Paginated};

/// List books with filters, ordering and pagination. Responses are served
/// from the cache when a previous identical request populated it.
#[utoipa::path(
    get,
    path = "/livres",
    tag = "livres",
    params(LivreQuery),
    responses(
        (status = 200, description = "Paginated book list", body = Paginated<Livre>),
        (status = 400, description = "Invalid filter or ordering")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<LivreQuery>,
) -> AppResult<Json<Value>> {
    let key = cache::build_key("livres", None, raw_query.as_deref().unwrap_or(""));
    if let Some(hit) = state.services.cache.get_json(&key).await {
        return Ok(Json(hit));
    }

    let (results, total) = state
        .services
        .catalog
        .list_livres(&query, &LivreScope::default())
        .await?;
    let payload = to_payload(Paginated::new(
        results,
        total,
        query.page,
        query.page_size,
        &state,
    ))?;
    state.services.cache.set_json(&key, &payload).await;
    Ok(Json(payload))
}

/// Books of one author
#[utoipa::path(
    get,
    path = "/auteurs/{id}/livres",
    tag = "livres",
    params(("id" = i32, Path, description = "Author ID"), LivreQuery),
    responses(
        (status = 200, description = "Paginated book list", body = Paginated<Livre>)
    )
)]
pub async fn list_by_auteur(
    State(state): State<AppState>,
    Path(auteur_id): Path<i32>,
    Query(query): Query<LivreQuery>,
) -> AppResult<Json<Paginated<Livre>>> {
    state.services.catalog.get_auteur(auteur_id).await?;
    let scope = LivreScope {
        auteur_id: Some(auteur_id),
        categorie_id: None,
    };
    let (results, total) = state.services.catalog.list_livres(&query, &scope).await?;
    Ok(Json(Paginated::new(
        results,
        total,
        query.page,
        query.page_size,
        &state,
    )))
}

/// Books of one category
#[utoipa::path(
    get,
    path = "/categories/{id}/livres",
    tag = "livres",
    params(("id" = i32, Path, description = "Category ID"), LivreQuery),
    responses(
        (status = 200, description = "Paginated book list", body = Paginated<Livre>)
    )
)]
pub async fn list_by_categorie(
    State(state): State<AppState>,
    Path(categorie_id): Path<i32>,
    Query(query): Query<LivreQuery>,
) -> AppResult<Json<Paginated<Livre>>> {
    state.services.catalog.get_categorie(categorie_id).await?;
    let scope = LivreScope {
        auteur_id: None,
        categorie_id: Some(categorie_id),
    };
    let (results, total) = state.services.catalog.list_livres(&query, &scope).await?;
    Ok(Json(Paginated::new(
        results,
        total,
        query.page,
        query.page_size,
        &state,
    )))
}

/// Get one book, cache included
#[utoipa::path(
    get,
    path = "/livres/{id}",
    tag = "livres",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Livre),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    let key = cache::build_key("livres", Some(id), "");
    if let Some(hit) = state.services.cache.get_json(&key).await {
        return Ok(Json(hit));
    }

    let livre = state.services.catalog.get_livre(id).await?;
    let payload = to_payload(livre)?;
    state.services.cache.set_json(&key, &payload).await;
    Ok(Json(payload))
}

/// Create a book. Any authenticated user; the caller becomes its creator.
#[utoipa::path(
    post,
    path = "/livres",
    tag = "livres",
    security(("bearer_auth" = [])),
    request_body = CreateLivre,
    responses(
        (status = 201, description = "Book created", body = Livre),
        (status = 400, description = "Invalid fields"),
        (status = 409, description = "Duplicate title/author or ISBN")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLivre>,
) -> AppResult<(StatusCode, Json<Livre>)> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Livre, Action::Create, None)
        .into_result("POST", "/api/v1/livres")?;

    let livre = state
        .services
        .catalog
        .create_livre(request, Some(claims.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(livre)))
}

/// Replace a book. Creator only, admins included in the restriction.
#[utoipa::path(
    put,
    path = "/livres/{id}",
    tag = "livres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateLivre,
    responses(
        (status = 200, description = "Book replaced", body = Livre),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_full(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateLivre>,
) -> AppResult<Json<Livre>> {
    authorize_write(&state, &claims, id, "PUT").await?;
    let livre = state.services.catalog.update_livre_full(id, request).await?;
    Ok(Json(livre))
}

/// Patch a book. Creator only.
#[utoipa::path(
    patch,
    path = "/livres/{id}",
    tag = "livres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateLivre,
    responses(
        (status = 200, description = "Book updated", body = Livre),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_partial(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateLivre>,
) -> AppResult<Json<Livre>> {
    authorize_write(&state, &claims, id, "PATCH").await?;
    let livre = state
        .services
        .catalog
        .update_livre_partial(id, request)
        .await?;
    Ok(Json(livre))
}

/// Delete a book. Creator only.
#[utoipa::path(
    delete,
    path = "/livres/{id}",
    tag = "livres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    authorize_write(&state, &claims, id, "DELETE").await?;
    state.services.catalog.delete_livre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set the book's author
#[utoipa::path(
    put,
    path = "/livres/{id}/auteur/{auteur_id}",
    tag = "livres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("auteur_id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author attached", body = Livre),
        (status = 404, description = "Book or author not found")
    )
)]
pub async fn attach_auteur(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, auteur_id)): Path<(i32, i32)>,
) -> AppResult<Json<Livre>> {
    authorize_write(&state, &claims, id, "PUT").await?;
    let livre = state.services.catalog.attach_auteur(id, auteur_id).await?;
    Ok(Json(livre))
}

/// Clear the book's author
#[utoipa::path(
    delete,
    path = "/livres/{id}/auteur",
    tag = "livres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Author detached", body = Livre),
        (status = 404, description = "Book not found")
    )
)]
pub async fn detach_auteur(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Livre>> {
    authorize_write(&state, &claims, id, "DELETE").await?;
    let livre = state.services.catalog.detach_auteur(id).await?;
    Ok(Json(livre))
}

/// Add a category to the book
#[utoipa::path(
    put,
    path = "/livres/{id}/categories/{categorie_id}",
    tag = "livres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("categorie_id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category attached", body = Livre),
        (status = 404, description = "Book or category not found")
    )
)]
pub async fn attach_categorie(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, categorie_id)): Path<(i32, i32)>,
) -> AppResult<Json<Livre>> {
    authorize_write(&state, &claims, id, "PUT").await?;
    let livre = state
        .services
        .catalog
        .attach_categorie(id, categorie_id)
        .await?;
    Ok(Json(livre))
}

/// Remove a category from the book
#[utoipa::path(
    delete,
    path = "/livres/{id}/categories/{categorie_id}",
    tag = "livres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("categorie_id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category detached", body = Livre),
        (status = 404, description = "Book not found")
    )
)]
pub async fn detach_categorie(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, categorie_id)): Path<(i32, i32)>,
) -> AppResult<Json<Livre>> {
    authorize_write(&state, &claims, id, "DELETE").await?;
    let livre = state
        .services
        .catalog
        .detach_categorie(id, categorie_id)
        .await?;
    Ok(Json(livre))
}

/// Writes are gated on the book's creator, so the target row is loaded
/// before the policy check.
async fn authorize_write(
    state: &AppState,
    claims: &crate::models::user::UserClaims,
    id: i32,
    method: &str,
) -> AppResult<()> {
    let actor = resolve_actor(state, Some(claims)).await?;
    let livre = state.services.catalog.get_livre(id).await?;
    let target = Target {
        createur_id: livre.createur_id,
        membre_id: None,
    };
    let action = if method == "DELETE" {
        Action::Delete
    } else {
        Action::Update
    };
    authorize(&actor, Resource::Livre, action, Some(&target))
        .into_result(method, &format!("/api/v1/livres/{}", id))
}

fn to_payload<T: serde::Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e)))
}
