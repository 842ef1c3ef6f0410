//! Review endpoints
//!
//! Same row-scoping as loans: readers see and manage their own reviews,
//! admins see everything. Reviews are not cached.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::avis::{Avis, AvisQuery, CreateAvis, UpdateAvis},
    models::user::UserClaims,
    permissions::{authorize, Action, Actor, Resource, Target},
    repository::avis::AvisScope,
    AppState,
};

use super::{resolve_actor, AuthenticatedUser, Paginated};

fn list_scope(actor: &Actor) -> Option<AvisScope> {
    if actor.is_admin() {
        return Some(AvisScope::default());
    }
    actor.membre_id().map(|membre_id| AvisScope {
        membre_id: Some(membre_id),
        livre_id: None,
    })
}

/// List reviews with filters, ordering and pagination
#[utoipa::path(
    get,
    path = "/avis",
    tag = "avis",
    security(("bearer_auth" = [])),
    params(AvisQuery),
    responses(
        (status = 200, description = "Paginated review list", body = Paginated<Avis>),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AvisQuery>,
) -> AppResult<Json<Paginated<Avis>>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Avis, Action::List, None).into_result("GET", "/api/v1/avis")?;

    let Some(scope) = list_scope(&actor) else {
        return Ok(Json(Paginated::new(
            Vec::new(),
            0,
            query.page,
            query.page_size,
            &state,
        )));
    };
    let (results, total) = state.services.reviews.list(&query, &scope).await?;
    Ok(Json(Paginated::new(
        results,
        total,
        query.page,
        query.page_size,
        &state,
    )))
}

/// Reviews of one book
#[utoipa::path(
    get,
    path = "/livres/{id}/avis",
    tag = "avis",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID"), AvisQuery),
    responses(
        (status = 200, description = "Paginated review list", body = Paginated<Avis>)
    )
)]
pub async fn list_by_livre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(livre_id): Path<i32>,
    Query(query): Query<AvisQuery>,
) -> AppResult<Json<Paginated<Avis>>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Avis, Action::List, None)
        .into_result("GET", &format!("/api/v1/livres/{}/avis", livre_id))?;

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

    let (results, total) = state.services.reviews.list(&query, &scope).await?;
    Ok(Json(Paginated::new(
        results,
        total,
        query.page,
        query.page_size,
        &state,
    )))
}

/// Get one review. Admin, or the owning member.
#[utoipa::path(
    get,
    path = "/avis/{id}",
    tag = "avis",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review details", body = Avis),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Avis>> {
    let (_, avis) = load_authorized(&state, &claims, id, Action::Retrieve, "GET").await?;
    Ok(Json(avis))
}

/// Write a review. Readers review as themselves; admins may name a member.
#[utoipa::path(
    post,
    path = "/avis",
    tag = "avis",
    security(("bearer_auth" = [])),
    request_body = CreateAvis,
    responses(
        (status = 201, description = "Review created", body = Avis),
        (status = 403, description = "No member record")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateAvis>,
) -> AppResult<(StatusCode, Json<Avis>)> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Avis, Action::Create, None).into_result("POST", "/api/v1/avis")?;

    let membre_id = if actor.is_admin() {
        request.membre_id.or(actor.membre_id())
    } else {
        actor.membre_id()
    };
    let avis = state.services.reviews.create(request, membre_id).await?;
    Ok((StatusCode::CREATED, Json(avis)))
}

/// Replace a review. Admin, or the owning member.
#[utoipa::path(
    put,
    path = "/avis/{id}",
    tag = "avis",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    request_body = UpdateAvis,
    responses(
        (status = 200, description = "Review replaced", body = Avis),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn update_full(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateAvis>,
) -> AppResult<Json<Avis>> {
    load_authorized(&state, &claims, id, Action::Update, "PUT").await?;
    let avis = state.services.reviews.update_full(id, request).await?;
    Ok(Json(avis))
}

/// Patch a review. Admin, or the owning member.
#[utoipa::path(
    patch,
    path = "/avis/{id}",
    tag = "avis",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    request_body = UpdateAvis,
    responses(
        (status = 200, description = "Review updated", body = Avis),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn update_partial(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateAvis>,
) -> AppResult<Json<Avis>> {
    load_authorized(&state, &claims, id, Action::Update, "PATCH").await?;
    let avis = state.services.reviews.update_partial(id, request).await?;
    Ok(Json(avis))
}

/// Delete a review. Admin, or the owning member.
#[utoipa::path(
    delete,
    path = "/avis/{id}",
    tag = "avis",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    load_authorized(&state, &claims, id, Action::Delete, "DELETE").await?;
    state.services.reviews.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach the review to a member. Only orphan reviews can be claimed, and
/// only an admin passes the ownership gate for them.
#[utoipa::path(
    put,
    path = "/avis/{id}/membre/{membre_id}",
    tag = "avis",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Review ID"),
        ("membre_id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member attached", body = Avis),
        (status = 409, description = "Review already owned")
    )
)]
pub async fn attach_membre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, membre_id)): Path<(i32, i32)>,
) -> AppResult<Json<Avis>> {
    load_authorized(&state, &claims, id, Action::Update, "PUT").await?;
    let avis = state.services.reviews.attach_membre(id, membre_id).await?;
    Ok(Json(avis))
}

/// Detach the review from its member
#[utoipa::path(
    delete,
    path = "/avis/{id}/membre",
    tag = "avis",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Member detached", body = Avis),
        (status = 404, description = "Review not found")
    )
)]
pub async fn detach_membre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Avis>> {
    load_authorized(&state, &claims, id, Action::Update, "DELETE").await?;
    let avis = state.services.reviews.detach_membre(id, None).await?;
    Ok(Json(avis))
}

/// Point the review at a book
#[utoipa::path(
    put,
    path = "/avis/{id}/livre/{livre_id}",
    tag = "avis",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Review ID"),
        ("livre_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book attached", body = Avis),
        (status = 409, description = "Review already concerns a book")
    )
)]
pub async fn attach_livre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, livre_id)): Path<(i32, i32)>,
) -> AppResult<Json<Avis>> {
    load_authorized(&state, &claims, id, Action::Update, "PUT").await?;
    let avis = state.services.reviews.attach_livre(id, livre_id).await?;
    Ok(Json(avis))
}

/// Detach the review from its book
#[utoipa::path(
    delete,
    path = "/avis/{id}/livre",
    tag = "avis",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Book detached", body = Avis),
        (status = 404, description = "Review not found")
    )
)]
pub async fn detach_livre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Avis>> {
    load_authorized(&state, &claims, id, Action::Update, "DELETE").await?;
    let avis = state.services.reviews.detach_livre(id).await?;
    Ok(Json(avis))
}

/// Load the review and run the ownership-aware policy check
async fn load_authorized(
    state: &AppState,
    claims: &UserClaims,
    id: i32,
    action: Action,
    method: &str,
) -> AppResult<(Actor, Avis)> {
    let actor = resolve_actor(state, Some(claims)).await?;
    let avis = state.services.reviews.get(id).await?;
    let target = Target {
        createur_id: None,
        membre_id: avis.membre_id,
    };
    authorize(&actor, Resource::Avis, action, Some(&target))
        .into_result(method, &format!("/api/v1/avis/{}", id))?;
    Ok((actor, avis))
}
