//! Biblio server binary

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use biblio_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{cache::CacheService, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("biblio_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Biblio Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Initialize the Redis-backed response cache
    let cache_service = CacheService::new(&config.redis.url, config.cache.ttl_seconds)
        .await
        .expect("Failed to connect to Redis");

    tracing::info!("Connected to Redis");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(
        repository,
        config.auth.clone(),
        cache_service,
        config.pagination.clone(),
    );

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/register", post(api::auth::register))
        .route("/auth/me", get(api::auth::me))
        // Books
        .route("/livres", get(api::livres::list).post(api::livres::create))
        .route(
            "/livres/:id",
            get(api::livres::get)
                .put(api::livres::update_full)
                .patch(api::livres::update_partial)
                .delete(api::livres::delete),
        )
        .route("/livres/:id/auteur/:auteur_id", put(api::livres::attach_auteur))
        .route("/livres/:id/auteur", delete(api::livres::detach_auteur))
        .route(
            "/livres/:id/categories/:categorie_id",
            put(api::livres::attach_categorie).delete(api::livres::detach_categorie),
        )
        .route("/livres/:id/emprunts", get(api::emprunts::list_by_livre))
        .route("/livres/:id/avis", get(api::avis::list_by_livre))
        // Authors
        .route("/auteurs", get(api::auteurs::list).post(api::auteurs::create))
        .route(
            "/auteurs/:id",
            get(api::auteurs::get)
                .put(api::auteurs::update_full)
                .patch(api::auteurs::update_partial)
                .delete(api::auteurs::delete),
        )
        .route("/auteurs/:id/livres", get(api::livres::list_by_auteur))
        // Categories
        .route(
            "/categories",
            get(api::categories::list).post(api::categories::create),
        )
        .route(
            "/categories/:id",
            get(api::categories::get)
                .put(api::categories::update_full)
                .patch(api::categories::update_partial)
                .delete(api::categories::delete),
        )
        .route("/categories/:id/livres", get(api::livres::list_by_categorie))
        // Members
        .route("/membres", get(api::membres::list).post(api::membres::create))
        .route(
            "/membres/:id",
            get(api::membres::get)
                .put(api::membres::update_full)
                .patch(api::membres::update_partial)
                .delete(api::membres::delete),
        )
        .route("/membres/:id/emprunts", get(api::membres::list_emprunts))
        .route("/membres/:id/avis", get(api::membres::list_avis))
        .route(
            "/membres/:id/emprunts/:emprunt_id",
            put(api::membres::attach_emprunt).delete(api::membres::detach_emprunt),
        )
        .route(
            "/membres/:id/avis/:avis_id",
            put(api::membres::attach_avis).delete(api::membres::detach_avis),
        )
        // Loans
        .route("/emprunts", get(api::emprunts::list).post(api::emprunts::create))
        .route(
            "/emprunts/:id",
            get(api::emprunts::get)
                .put(api::emprunts::update_full)
                .patch(api::emprunts::update_partial)
                .delete(api::emprunts::delete),
        )
        .route(
            "/emprunts/:id/membre/:membre_id",
            put(api::emprunts::attach_membre),
        )
        .route("/emprunts/:id/membre", delete(api::emprunts::detach_membre))
        .route(
            "/emprunts/:id/livre/:livre_id",
            put(api::emprunts::attach_livre),
        )
        .route("/emprunts/:id/livre", delete(api::emprunts::detach_livre))
        // Reviews
        .route("/avis", get(api::avis::list).post(api::avis::create))
        .route(
            "/avis/:id",
            get(api::avis::get)
                .put(api::avis::update_full)
                .patch(api::avis::update_partial)
                .delete(api::avis::delete),
        )
        .route("/avis/:id/membre/:membre_id", put(api::avis::attach_membre))
        .route("/avis/:id/membre", delete(api::avis::detach_membre))
        .route("/avis/:id/livre/:livre_id", put(api::avis::attach_livre))
        .route("/avis/:id/livre", delete(api::avis::detach_livre))
        .layer(middleware::from_fn(api::method_not_allowed))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
