//! Member endpoints (admin-only CRUD plus member-side relation routes)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::avis::{Avis, AvisQuery},
    models::emprunt::{Emprunt, EmpruntQuery},
    models::membre::{CreateMembre, Membre, MembreQuery, UpdateMembre},
    models::user::UserClaims,
    permissions::{authorize, Action, Resource, Target},
    repository::{avis::AvisScope, emprunts::EmpruntScope},
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
    authorize(&actor, Resource::Membre, action, None).into_result(method, path)
}

/// List members
#[utoipa::path(
    get,
    path = "/membres",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(MembreQuery),
    responses(
        (status = 200, description = "Paginated member list", body = Paginated<Membre>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<MembreQuery>,
) -> AppResult<Json<Paginated<Membre>>> {
    require_admin(&state, &claims, Action::List, "GET", "/api/v1/membres").await?;
    let (results, total) = state.services.members.list(&query).await?;
    Ok(Json(Paginated::new(
        results,
        total,
        query.page,
        query.page_size,
        &state,
    )))
}

/// Get one member
#[utoipa::path(
    get,
    path = "/membres/{id}",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member details", body = Membre),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Membre>> {
    require_admin(
        &state,
        &claims,
        Action::Retrieve,
        "GET",
        &format!("/api/v1/membres/{}", id),
    )
    .await?;
    let membre = state.services.members.get(id).await?;
    Ok(Json(membre))
}

/// Register a member record for an existing user
#[utoipa::path(
    post,
    path = "/membres",
    tag = "membres",
    security(("bearer_auth" = [])),
    request_body = CreateMembre,
    responses(
        (status = 201, description = "Member created", body = Membre),
        (status = 409, description = "User already registered")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateMembre>,
) -> AppResult<(StatusCode, Json<Membre>)> {
    require_admin(&state, &claims, Action::Create, "POST", "/api/v1/membres").await?;
    let membre = state.services.members.create(request).await?;
    Ok((StatusCode::CREATED, Json(membre)))
}

/// Replace a member's contact details
#[utoipa::path(
    put,
    path = "/membres/{id}",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    request_body = UpdateMembre,
    responses(
        (status = 200, description = "Member replaced", body = Membre),
        (status = 404, description = "Member not found")
    )
)]
pub async fn update_full(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateMembre>,
) -> AppResult<Json<Membre>> {
    require_admin(
        &state,
        &claims,
        Action::Update,
        "PUT",
        &format!("/api/v1/membres/{}", id),
    )
    .await?;
    let membre = state.services.members.update_full(id, request).await?;
    Ok(Json(membre))
}

/// Patch a member's contact details
#[utoipa::path(
    patch,
    path = "/membres/{id}",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    request_body = UpdateMembre,
    responses(
        (status = 200, description = "Member updated", body = Membre),
        (status = 404, description = "Member not found")
    )
)]
pub async fn update_partial(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateMembre>,
) -> AppResult<Json<Membre>> {
    require_admin(
        &state,
        &claims,
        Action::Update,
        "PATCH",
        &format!("/api/v1/membres/{}", id),
    )
    .await?;
    let membre = state.services.members.update_partial(id, request).await?;
    Ok(Json(membre))
}

/// Delete a member. Their loans and reviews survive without an owner.
#[utoipa::path(
    delete,
    path = "/membres/{id}",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 404, description = "Member not found")
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
        &format!("/api/v1/membres/{}", id),
    )
    .await?;
    state.services.members.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Loans of one member. Admin, or the member themself.
#[utoipa::path(
    get,
    path = "/membres/{id}/emprunts",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID"), EmpruntQuery),
    responses(
        (status = 200, description = "Paginated loan list", body = Paginated<Emprunt>),
        (status = 403, description = "Not this member")
    )
)]
pub async fn list_emprunts(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(query): Query<EmpruntQuery>,
) -> AppResult<Json<Paginated<Emprunt>>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    let target = Target {
        createur_id: None,
        membre_id: Some(id),
    };
    authorize(&actor, Resource::Emprunt, Action::Retrieve, Some(&target))
        .into_result("GET", &format!("/api/v1/membres/{}/emprunts", id))?;

    state.services.members.get(id).await?;
    let scope = EmpruntScope {
        membre_id: Some(id),
        livre_id: None,
    };
    let (results, total) = state.services.loans.list(&query, &scope).await?;
    Ok(Json(Paginated::new(
        results,
        total,
        query.page,
        query.page_size,
        &state,
    )))
}

/// Reviews of one member. Admin, or the member themself.
#[utoipa::path(
    get,
    path = "/membres/{id}/avis",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID"), AvisQuery),
    responses(
        (status = 200, description = "Paginated review list", body = Paginated<Avis>),
        (status = 403, description = "Not this member")
    )
)]
pub async fn list_avis(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(query): Query<AvisQuery>,
) -> AppResult<Json<Paginated<Avis>>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    let target = Target {
        createur_id: None,
        membre_id: Some(id),
    };
    authorize(&actor, Resource::Avis, Action::Retrieve, Some(&target))
        .into_result("GET", &format!("/api/v1/membres/{}/avis", id))?;

    state.services.members.get(id).await?;
    let scope = AvisScope {
        membre_id: Some(id),
        livre_id: None,
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

/// Attach a loan to this member. Rejected when the loan already has one.
#[utoipa::path(
    put,
    path = "/membres/{id}/emprunts/{emprunt_id}",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID"),
        ("emprunt_id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan attached", body = Emprunt),
        (status = 409, description = "Loan already owned")
    )
)]
pub async fn attach_emprunt(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, emprunt_id)): Path<(i32, i32)>,
) -> AppResult<Json<Emprunt>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Emprunt, Action::Update, None).into_result(
        "PUT",
        &format!("/api/v1/membres/{}/emprunts/{}", id, emprunt_id),
    )?;
    let emprunt = state.services.loans.attach_membre(emprunt_id, id).await?;
    Ok(Json(emprunt))
}

/// Detach a loan from this member
#[utoipa::path(
    delete,
    path = "/membres/{id}/emprunts/{emprunt_id}",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID"),
        ("emprunt_id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan detached", body = Emprunt),
        (status = 400, description = "Loan does not belong to this member")
    )
)]
pub async fn detach_emprunt(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, emprunt_id)): Path<(i32, i32)>,
) -> AppResult<Json<Emprunt>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Emprunt, Action::Update, None).into_result(
        "DELETE",
        &format!("/api/v1/membres/{}/emprunts/{}", id, emprunt_id),
    )?;
    let emprunt = state
        .services
        .loans
        .detach_membre(emprunt_id, Some(id))
        .await?;
    Ok(Json(emprunt))
}

/// Attach a review to this member. Rejected when the review already has one.
#[utoipa::path(
    put,
    path = "/membres/{id}/avis/{avis_id}",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID"),
        ("avis_id" = i32, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Review attached", body = Avis),
        (status = 409, description = "Review already owned")
    )
)]
pub async fn attach_avis(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, avis_id)): Path<(i32, i32)>,
) -> AppResult<Json<Avis>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Membre, Action::Update, None).into_result(
        "PUT",
        &format!("/api/v1/membres/{}/avis/{}", id, avis_id),
    )?;
    let avis = state.services.reviews.attach_membre(avis_id, id).await?;
    Ok(Json(avis))
}

/// Detach a review from this member
#[utoipa::path(
    delete,
    path = "/membres/{id}/avis/{avis_id}",
    tag = "membres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Member ID"),
        ("avis_id" = i32, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Review detached", body = Avis),
        (status = 400, description = "Review does not belong to this member")
    )
)]
pub async fn detach_avis(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, avis_id)): Path<(i32, i32)>,
) -> AppResult<Json<Avis>> {
    let actor = resolve_actor(&state, Some(&claims)).await?;
    authorize(&actor, Resource::Membre, Action::Update, None).into_result(
        "DELETE",
        &format!("/api/v1/membres/{}/avis/{}", id, avis_id),
    )?;
    let avis = state
        .services
        .reviews
        .detach_membre(avis_id, Some(id))
        .await?;
    Ok(Json(avis))
}
