//! Loan endpoints
//!
//! Lists are row-scoped: readers only ever see their own loans, admins see
//! everything. The cache key carries the scope so the two views never mix.

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::emprunt::{CreateEmprunt, Emprunt, EmpruntQuery, UpdateEmprunt},
    models::user::UserClaims,
    permissions::{authorize, Action, Actor, Resource, Target},
    repository::emprunts::EmpruntScope,
    services::cache,
    AppState,
};

use super::{resolve_actor, AuthenticatedUser, Paginated};

/// Row scope for the caller, or None when a reader has no member record
/// and therefore owns nothing.
fn list_scope(actor: &Actor) -> Option<EmpruntScope> {
    if actor.is_admin() {
        return Some(EmpruntScope::default());
    }
    actor.membre_id().map(|membre_id| EmpruntScope {
        membre_id: Some(membre_id),
        livre_id: None,
    })
}

/// List loans with filters, ordering and pagination
#[utoipa::path(
    get,
    path = "/emprunts",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    params(EmpruntQuery),
    responses(
        (status = 200, description = "Paginated loan list", body = Paginated<Emprunt>),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<EmpruntQuery>,
) -> AppResult<Json<Value>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Emprunt, Action::List, None)
        .into_result("GET", "/api/v1/emprunts")?;

    let Some(scope) = list_scope(&actor) else {
        // Reader without a member record: owns no loans
        return Ok(Json(to_payload(Paginated::<Emprunt>::new(
            Vec::new(),
            0,
            query.page,
            query.page_size,
            &state,
        ))?));
    };

    let mut key = cache::build_key("emprunts", None, raw_query.as_deref().unwrap_or(""));
    if let Some(membre_id) = scope.membre_id {
        key.push_str(&format!("#m{}", membre_id));
    }
    if let Some(hit) = state.services.cache.get_json(&key).await {
        return Ok(Json(hit));
    }

    let (results, total) = state.services.loans.list(&query, &scope).await?;
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

/// Loans of one book (admin view)
#[utoipa::path(
    get,
    path = "/livres/{id}/emprunts",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID"), EmpruntQuery),
    responses(
        (status = 200, description = "Paginated loan list", body = Paginated<Emprunt>)
    )
)]
pub async fn list_by_livre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(livre_id): Path<i32>,
    Query(query): Query<EmpruntQuery>,
) -> AppResult<Json<Paginated<Emprunt>>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Emprunt, Action::List, None)
        .into_result("GET", &format!("/api/v1/livres/{}/emprunts", livre_id))?;

    state.services.catalog.get_livre(livre_id).await?;
    let Some(mut scope) = list_scope(&actor) else {
        return Ok(Json(Paginated::new(
            Vec::new(),
            0,
            query.page,
            query.page_size,
            &state,
        )));
    };
    scope.livre_id = Some(livre_id);

    let (results, total) = state.services.loans.list(&query, &scope).await?;
    Ok(Json(Paginated::new(
        results,
        total,
        query.page,
        query.page_size,
        &state,
    )))
}

/// Get one loan. Admin, or the owning member.
#[utoipa::path(
    get,
    path = "/emprunts/{id}",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = Emprunt),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    let emprunt = state.services.loans.get(id).await?;
    let target = Target {
        createur_id: None,
        membre_id: emprunt.membre_id,
    };
    authorize(&actor, Resource::Emprunt, Action::Retrieve, Some(&target))
        .into_result("GET", &format!("/api/v1/emprunts/{}", id))?;

    let key = cache::build_key("emprunts", Some(id), "");
    if let Some(hit) = state.services.cache.get_json(&key).await {
        return Ok(Json(hit));
    }
    let payload = to_payload(emprunt)?;
    state.services.cache.set_json(&key, &payload).await;
    Ok(Json(payload))
}

/// Borrow a book. Readers borrow for themselves; admins may name a member.
#[utoipa::path(
    post,
    path = "/emprunts",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    request_body = CreateEmprunt,
    responses(
        (status = 201, description = "Loan created", body = Emprunt),
        (status = 403, description = "No member record"),
        (status = 422, description = "Book already borrowed")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateEmprunt>,
) -> AppResult<(StatusCode, Json<Emprunt>)> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Emprunt, Action::Create, None)
        .into_result("POST", "/api/v1/emprunts")?;

    let membre_id = if actor.is_admin() {
        request.membre_id.or(actor.membre_id())
    } else {
        actor.membre_id()
    };
    let emprunt = state.services.loans.create(request, membre_id).await?;
    Ok((StatusCode::CREATED, Json(emprunt)))
}

/// Replace a loan. Admin only.
#[utoipa::path(
    put,
    path = "/emprunts/{id}",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = UpdateEmprunt,
    responses(
        (status = 200, description = "Loan replaced", body = Emprunt),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn update_full(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateEmprunt>,
) -> AppResult<Json<Emprunt>> {
    require_update(&state, &claims, "PUT", &format!("/api/v1/emprunts/{}", id)).await?;
    let emprunt = state.services.loans.update_full(id, request).await?;
    Ok(Json(emprunt))
}

/// Patch a loan. Admin only.
#[utoipa::path(
    patch,
    path = "/emprunts/{id}",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = UpdateEmprunt,
    responses(
        (status = 200, description = "Loan updated", body = Emprunt),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn update_partial(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateEmprunt>,
) -> AppResult<Json<Emprunt>> {
    require_update(&state, &claims, "PATCH", &format!("/api/v1/emprunts/{}", id)).await?;
    let emprunt = state.services.loans.update_partial(id, request).await?;
    Ok(Json(emprunt))
}

/// Delete a loan. Admin, or the owning member.
#[utoipa::path(
    delete,
    path = "/emprunts/{id}",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    let emprunt = state.services.loans.get(id).await?;
    let target = Target {
        createur_id: None,
        membre_id: emprunt.membre_id,
    };
    authorize(&actor, Resource::Emprunt, Action::Delete, Some(&target))
        .into_result("DELETE", &format!("/api/v1/emprunts/{}", id))?;

    state.services.loans.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach the loan to a member. Admin only; conflicts when already owned.
#[utoipa::path(
    put,
    path = "/emprunts/{id}/membre/{membre_id}",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID"),
        ("membre_id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member attached", body = Emprunt),
        (status = 409, description = "Loan already owned")
    )
)]
pub async fn attach_membre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, membre_id)): Path<(i32, i32)>,
) -> AppResult<Json<Emprunt>> {
    require_update(
        &state,
        &claims,
        "PUT",
        &format!("/api/v1/emprunts/{}/membre/{}", id, membre_id),
    )
    .await?;
    let emprunt = state.services.loans.attach_membre(id, membre_id).await?;
    Ok(Json(emprunt))
}

/// Detach the loan from its member. Admin only.
#[utoipa::path(
    delete,
    path = "/emprunts/{id}/membre",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Member detached", body = Emprunt),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn detach_membre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Emprunt>> {
    require_update(
        &state,
        &claims,
        "DELETE",
        &format!("/api/v1/emprunts/{}/membre", id),
    )
    .await?;
    let emprunt = state.services.loans.detach_membre(id, None).await?;
    Ok(Json(emprunt))
}

/// Point the loan at a book. Admin only; open-loan rule applies.
#[utoipa::path(
    put,
    path = "/emprunts/{id}/livre/{livre_id}",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID"),
        ("livre_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book attached", body = Emprunt),
        (status = 422, description = "Book already borrowed")
    )
)]
pub async fn attach_livre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, livre_id)): Path<(i32, i32)>,
) -> AppResult<Json<Emprunt>> {
    require_update(
        &state,
        &claims,
        "PUT",
        &format!("/api/v1/emprunts/{}/livre/{}", id, livre_id),
    )
    .await?;
    let emprunt = state.services.loans.attach_livre(id, livre_id).await?;
    Ok(Json(emprunt))
}

/// Detach the loan from its book. Admin only.
#[utoipa::path(
    delete,
    path = "/emprunts/{id}/livre",
    tag = "emprunts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Book detached", body = Emprunt),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn detach_livre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Emprunt>> {
    require_update(
        &state,
        &claims,
        "DELETE",
        &format!("/api/v1/emprunts/{}/livre", id),
    )
    .await?;
    let emprunt = state.services.loans.detach_livre(id).await?;
    Ok(Json(emprunt))
}

async fn require_update(
    state: &AppState,
    claims: &UserClaims,
    method: &str,
    path: &str,
) -> AppResult<()> {
    let actor = resolve_actor(state, Some(claims)).await?;
    authorize(&actor, Resource::Emprunt, Action::Update, None).into_result(method, path)
}

fn to_payload<T: serde::Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize response: {}", e)))
}
