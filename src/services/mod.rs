//! Business logic services

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod loans;
pub mod members;
pub mod reviews;

use crate::{
    config::{AuthConfig, PaginationConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub members: members::MembersService,
    pub reviews: reviews::ReviewsService,
    pub cache: cache::CacheService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        cache_service: cache::CacheService,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            repository: repository.clone(),
            catalog: catalog::CatalogService::new(
                repository.clone(),
                cache_service.clone(),
                pagination.clone(),
            ),
            loans: loans::LoansService::new(
                repository.clone(),
                cache_service.clone(),
                pagination.clone(),
            ),
            members: members::MembersService::new(
                repository.clone(),
                cache_service.clone(),
                pagination.clone(),
            ),
            reviews: reviews::ReviewsService::new(repository, pagination),
            cache: cache_service,
        }
    }
}
