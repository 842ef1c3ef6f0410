//! Member management service, and actor resolution for access control

use validator::Validate;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        membre::{CreateMembre, Membre, MembreQuery, UpdateMembre},
        user::UserClaims,
    },
    permissions::Actor,
    repository::Repository,
};

use super::cache::CacheService;

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
    cache: CacheService,
    pagination: PaginationConfig,
}

impl MembersService {
    pub fn new(repository: Repository, cache: CacheService, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            cache,
            pagination,
        }
    }

    /// Turn optional JWT claims into an actor. Membership is looked up in
    /// the membres table on every request: a user without a member record
    /// acts as a plain authenticated user.
    pub async fn resolve_actor(&self, claims: Option<&UserClaims>) -> AppResult<Actor> {
        match claims {
            None => Ok(Actor::Anonymous),
            Some(claims) => {
                let membre_id = self
                    .repository
                    .membres
                    .get_by_user_id(claims.user_id)
                    .await?
                    .map(|membre| membre.id);
                Ok(Actor::Authenticated {
                    user_id: claims.user_id,
                    role: claims.role,
                    membre_id,
                })
            }
        }
    }

    pub async fn list(&self, query: &MembreQuery) -> AppResult<(Vec<Membre>, i64)> {
        self.repository.membres.search(query, &self.pagination).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Membre> {
        self.repository.membres.get_by_id(id).await
    }

    pub async fn create(&self, membre: CreateMembre) -> AppResult<Membre> {
        membre.validate()?;
        self.repository.users.get_by_id(membre.user_id).await?;
        if let Some(existing) = self.repository.membres.get_by_user_id(membre.user_id).await? {
            return Err(AppError::Conflict(format!(
                "User {} is already membre {}",
                membre.user_id, existing.id
            )));
        }
        self.repository.membres.create(&membre).await
    }

    pub async fn update_full(&self, id: i32, membre: UpdateMembre) -> AppResult<Membre> {
        membre.validate()?;
        self.repository
            .membres
            .update_full(id, membre.adresse.as_deref(), membre.telephone.as_deref())
            .await?;
        self.invalidate().await;
        self.repository.membres.get_by_id(id).await
    }

    pub async fn update_partial(&self, id: i32, membre: UpdateMembre) -> AppResult<Membre> {
        membre.validate()?;
        self.repository
            .membres
            .update_partial(id, membre.adresse.as_deref(), membre.telephone.as_deref())
            .await?;
        self.invalidate().await;
        self.repository.membres.get_by_id(id).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.membres.delete(id).await?;
        self.invalidate().await;
        Ok(())
    }

    // Member summaries are embedded in loan payloads
    async fn invalidate(&self) {
        self.cache.invalidate_resource("emprunts").await;
    }
}
