//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, auteurs, avis, categories, emprunts, health, livres, membres};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblio API",
        version = "1.0.0",
        description = "Library lending catalog REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::register,
        auth::me,
        // Books
        livres::list,
        livres::list_by_auteur,
        livres::list_by_categorie,
        livres::get,
        livres::create,
        livres::update_full,
        livres::update_partial,
        livres::delete,
        livres::attach_auteur,
        livres::detach_auteur,
        livres::attach_categorie,
        livres::detach_categorie,
        // Authors
        auteurs::list,
        auteurs::get,
        auteurs::create,
        auteurs::update_full,
        auteurs::update_partial,
        auteurs::delete,
        // Categories
        categories::list,
        categories::get,
        categories::create,
        categories::update_full,
        categories::update_partial,
        categories::delete,
        // Members
        membres::list,
        membres::get,
        membres::create,
        membres::update_full,
        membres::update_partial,
        membres::delete,
        membres::list_emprunts,
        membres::list_avis,
        membres::attach_emprunt,
        membres::detach_emprunt,
        membres::attach_avis,
        membres::detach_avis,
        // Loans
        emprunts::list,
        emprunts::list_by_livre,
        emprunts::get,
        emprunts::create,
        emprunts::update_full,
        emprunts::update_partial,
        emprunts::delete,
        emprunts::attach_membre,
        emprunts::detach_membre,
        emprunts::attach_livre,
        emprunts::detach_livre,
        // Reviews
        avis::list,
        avis::list_by_livre,
        avis::get,
        avis::create,
        avis::update_full,
        avis::update_partial,
        avis::delete,
        avis::attach_membre,
        avis::detach_membre,
        avis::attach_livre,
        avis::detach_livre,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::User,
            crate::models::user::UserPublic,
            crate::models::user::CreateUser,
            crate::models::user::Role,
            // Books
            crate::models::livre::Livre,
            crate::models::livre::LivreShort,
            crate::models::livre::CreateLivre,
            crate::models::livre::UpdateLivre,
            crate::models::livre::LivreQuery,
            // Authors
            crate::models::auteur::Auteur,
            crate::models::auteur::CreateAuteur,
            crate::models::auteur::UpdateAuteur,
            crate::models::auteur::AuteurQuery,
            // Categories
            crate::models::categorie::Categorie,
            crate::models::categorie::CreateCategorie,
            crate::models::categorie::UpdateCategorie,
            crate::models::categorie::CategorieQuery,
            // Members
            crate::models::membre::Membre,
            crate::models::membre::MembreShort,
            crate::models::membre::CreateMembre,
            crate::models::membre::UpdateMembre,
            crate::models::membre::MembreQuery,
            // Loans
            crate::models::emprunt::Emprunt,
            crate::models::emprunt::CreateEmprunt,
            crate::models::emprunt::UpdateEmprunt,
            crate::models::emprunt::EmpruntQuery,
            // Reviews
            crate::models::avis::Avis,
            crate::models::avis::CreateAvis,
            crate::models::avis::UpdateAvis,
            crate::models::avis::AvisQuery,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "livres", description = "Book catalog"),
        (name = "auteurs", description = "Author management"),
        (name = "categories", description = "Category management"),
        (name = "membres", description = "Member management"),
        (name = "emprunts", description = "Loan tracking"),
        (name = "avis", description = "Book reviews")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
