//! Review management service

use validator::Validate;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::avis::{Avis, AvisQuery, CreateAvis, UpdateAvis},
    repository::{avis::AvisScope, Repository},
};

#[derive(Clone)]
pub struct ReviewsService {
    repository: Repository,
    pagination: PaginationConfig,
}

impl ReviewsService {
    pub fn new(repository: Repository, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            pagination,
        }
    }

    pub async fn list(&self, query: &AvisQuery, scope: &AvisScope) -> AppResult<(Vec<Avis>, i64)> {
        self.repository
            .avis
            .search(query, scope, &self.pagination)
            .await
    }

    pub async fn get(&self, id: i32) -> AppResult<Avis> {
        self.repository.avis.get_by_id(id).await
    }

    /// Create a review. `membre_id` has already been resolved by the
    /// caller, same convention as loans.
    pub async fn create(&self, avis: CreateAvis, membre_id: Option<i32>) -> AppResult<Avis> {
        avis.validate()?;
        if let Some(livre_id) = avis.livre_id {
            self.repository.livres.get_by_id(livre_id).await?;
        }
        if let Some(membre_id) = membre_id {
            self.repository.membres.get_by_id(membre_id).await?;
        }
        self.repository
            .avis
            .create(membre_id, avis.livre_id, avis.note, avis.commentaire.as_deref())
            .await
    }

    /// Full replacement: absent fields are cleared
    pub async fn update_full(&self, id: i32, avis: UpdateAvis) -> AppResult<Avis> {
        avis.validate()?;
        self.repository
            .avis
            .update_full(id, avis.note, avis.commentaire.as_deref())
            .await?;
        self.repository.avis.get_by_id(id).await
    }

    /// Partial update: absent fields keep their value
    pub async fn update_partial(&self, id: i32, avis: UpdateAvis) -> AppResult<Avis> {
        avis.validate()?;
        self.repository
            .avis
            .update_partial(id, avis.note, avis.commentaire.as_deref())
            .await?;
        self.repository.avis.get_by_id(id).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.avis.delete(id).await
    }

    /// Give an orphan review to a member
    pub async fn attach_membre(&self, avis_id: i32, membre_id: i32) -> AppResult<Avis> {
        let avis = self.repository.avis.get_by_id(avis_id).await?;
        if let Some(owner) = avis.membre_id {
            if owner != membre_id {
                return Err(AppError::Conflict(format!(
                    "Avis {} already belongs to membre {}",
                    avis_id, owner
                )));
            }
            return Ok(avis);
        }
        self.repository.membres.get_by_id(membre_id).await?;
        self.repository.avis.set_membre(avis_id, Some(membre_id)).await?;
        self.repository.avis.get_by_id(avis_id).await
    }

    /// Detach a review from its member. When the caller names an expected
    /// member (member-side route), ownership is checked first.
    pub async fn detach_membre(
        &self,
        avis_id: i32,
        expected_membre: Option<i32>,
    ) -> AppResult<Avis> {
        let avis = self.repository.avis.get_by_id(avis_id).await?;
        if let Some(expected) = expected_membre {
            if avis.membre_id != Some(expected) {
                return Err(AppError::BadRequest(format!(
                    "Avis {} does not belong to membre {}",
                    avis_id, expected
                )));
            }
        }
        self.repository.avis.set_membre(avis_id, None).await?;
        self.repository.avis.get_by_id(avis_id).await
    }

    /// Point an orphan review at a book
    pub async fn attach_livre(&self, avis_id: i32, livre_id: i32) -> AppResult<Avis> {
        let avis = self.repository.avis.get_by_id(avis_id).await?;
        if let Some(current) = avis.livre_id {
            if current != livre_id {
                return Err(AppError::Conflict(format!(
                    "Avis {} already concerns livre {}",
                    avis_id, current
                )));
            }
            return Ok(avis);
        }
        self.repository.livres.get_by_id(livre_id).await?;
        self.repository.avis.set_livre(avis_id, Some(livre_id)).await?;
        self.repository.avis.get_by_id(avis_id).await
    }

    pub async fn detach_livre(&self, avis_id: i32) -> AppResult<Avis> {
        self.repository.avis.get_by_id(avis_id).await?;
        self.repository.avis.set_livre(avis_id, None).await?;
        self.repository.avis.get_by_id(avis_id).await
    }
}
