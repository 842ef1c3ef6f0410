//! Loan management service
//!
//! The one business rule here: a book can only be out once. Any write that
//! would leave two open loans on the same book is rejected.

use validator::Validate;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::emprunt::{CreateEmprunt, Emprunt, EmpruntQuery, UpdateEmprunt},
    repository::{emprunts::EmpruntScope, Repository},
};

use super::cache::CacheService;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    cache: CacheService,
    pagination: PaginationConfig,
}

impl LoansService {
    pub fn new(repository: Repository, cache: CacheService, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            cache,
            pagination,
        }
    }

    pub async fn list(
        &self,
        query: &EmpruntQuery,
        scope: &EmpruntScope,
    ) -> AppResult<(Vec<Emprunt>, i64)> {
        self.repository
            .emprunts
            .search(query, scope, &self.pagination)
            .await
    }

    pub async fn get(&self, id: i32) -> AppResult<Emprunt> {
        self.repository.emprunts.get_by_id(id).await
    }

    /// Create a loan. `membre_id` has already been resolved by the caller:
    /// readers always borrow for themselves, admins may name any member.
    pub async fn create(&self, emprunt: CreateEmprunt, membre_id: Option<i32>) -> AppResult<Emprunt> {
        emprunt.validate()?;
        if let Some(membre_id) = membre_id {
            self.repository.membres.get_by_id(membre_id).await?;
        }
        if let Some(livre_id) = emprunt.livre_id {
            self.repository.livres.get_by_id(livre_id).await?;
            if emprunt.retourne.is_none()
                && self.repository.emprunts.has_open_loan(livre_id, None).await?
            {
                return Err(AppError::BusinessRule(
                    "This livre is already borrowed".to_string(),
                ));
            }
        }

        let created = self
            .repository
            .emprunts
            .create(
                membre_id,
                emprunt.livre_id,
                emprunt.date_emp,
                emprunt.date_ret,
                emprunt.retourne,
            )
            .await?;
        self.invalidate().await;
        Ok(created)
    }

    /// Full replacement: absent fields are cleared
    pub async fn update_full(&self, id: i32, emprunt: UpdateEmprunt) -> AppResult<Emprunt> {
        emprunt.validate()?;
        let current = self.repository.emprunts.get_by_id(id).await?;
        let date_emp = emprunt
            .date_emp
            .ok_or_else(|| AppError::Validation("date_emp is required".to_string()))?;
        let date_ret = emprunt
            .date_ret
            .ok_or_else(|| AppError::Validation("date_ret is required".to_string()))?;

        self.check_open_loan(emprunt.livre_id, emprunt.retourne.is_none(), current.id)
            .await?;
        self.check_refs(emprunt.membre_id, emprunt.livre_id).await?;

        self.repository
            .emprunts
            .update_full(
                id,
                emprunt.membre_id,
                emprunt.livre_id,
                date_emp,
                date_ret,
                emprunt.retourne,
            )
            .await?;
        self.invalidate().await;
        self.repository.emprunts.get_by_id(id).await
    }

    /// Partial update: absent fields keep their value
    pub async fn update_partial(&self, id: i32, emprunt: UpdateEmprunt) -> AppResult<Emprunt> {
        emprunt.validate()?;
        let current = self.repository.emprunts.get_by_id(id).await?;

        let livre_id = emprunt.livre_id.or(current.livre_id);
        let stays_open = emprunt.retourne.or(current.retourne).is_none();
        if emprunt.livre_id.is_some() && emprunt.livre_id != current.livre_id {
            self.check_open_loan(livre_id, stays_open, current.id).await?;
        }
        self.check_refs(emprunt.membre_id, emprunt.livre_id).await?;

        self.repository
            .emprunts
            .update_partial(
                id,
                emprunt.membre_id,
                emprunt.livre_id,
                emprunt.date_emp,
                emprunt.date_ret,
                emprunt.retourne,
            )
            .await?;
        self.invalidate().await;
        self.repository.emprunts.get_by_id(id).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.emprunts.delete(id).await?;
        self.invalidate().await;
        Ok(())
    }

    /// Give an orphan loan to a member. A loan that already belongs to
    /// someone is a conflict, not a silent transfer.
    pub async fn attach_membre(&self, emprunt_id: i32, membre_id: i32) -> AppResult<Emprunt> {
        let emprunt = self.repository.emprunts.get_by_id(emprunt_id).await?;
        if let Some(owner) = emprunt.membre_id {
            if owner != membre_id {
                return Err(AppError::Conflict(format!(
                    "Emprunt {} already belongs to membre {}",
                    emprunt_id, owner
                )));
            }
            return Ok(emprunt);
        }
        self.repository.membres.get_by_id(membre_id).await?;
        self.repository
            .emprunts
            .set_membre(emprunt_id, Some(membre_id))
            .await?;
        self.invalidate().await;
        self.repository.emprunts.get_by_id(emprunt_id).await
    }

    /// Detach a loan from its member. When the caller names an expected
    /// member (member-side route), ownership is checked first.
    pub async fn detach_membre(
        &self,
        emprunt_id: i32,
        expected_membre: Option<i32>,
    ) -> AppResult<Emprunt> {
        let emprunt = self.repository.emprunts.get_by_id(emprunt_id).await?;
        if let Some(expected) = expected_membre {
            if emprunt.membre_id != Some(expected) {
                return Err(AppError::BadRequest(format!(
                    "Emprunt {} does not belong to membre {}",
                    emprunt_id, expected
                )));
            }
        }
        self.repository.emprunts.set_membre(emprunt_id, None).await?;
        self.invalidate().await;
        self.repository.emprunts.get_by_id(emprunt_id).await
    }

    pub async fn attach_livre(&self, emprunt_id: i32, livre_id: i32) -> AppResult<Emprunt> {
        let emprunt = self.repository.emprunts.get_by_id(emprunt_id).await?;
        if let Some(current) = emprunt.livre_id {
            if current != livre_id {
                return Err(AppError::Conflict(format!(
                    "Emprunt {} already concerns livre {}",
                    emprunt_id, current
                )));
            }
            return Ok(emprunt);
        }
        self.repository.livres.get_by_id(livre_id).await?;
        self.check_open_loan(Some(livre_id), emprunt.is_open(), emprunt_id)
            .await?;
        self.repository
            .emprunts
            .set_livre(emprunt_id, Some(livre_id))
            .await?;
        self.invalidate().await;
        self.repository.emprunts.get_by_id(emprunt_id).await
    }

    pub async fn detach_livre(&self, emprunt_id: i32) -> AppResult<Emprunt> {
        self.repository.emprunts.get_by_id(emprunt_id).await?;
        self.repository.emprunts.set_livre(emprunt_id, None).await?;
        self.invalidate().await;
        self.repository.emprunts.get_by_id(emprunt_id).await
    }

    async fn check_refs(&self, membre_id: Option<i32>, livre_id: Option<i32>) -> AppResult<()> {
        if let Some(membre_id) = membre_id {
            self.repository.membres.get_by_id(membre_id).await?;
        }
        if let Some(livre_id) = livre_id {
            self.repository.livres.get_by_id(livre_id).await?;
        }
        Ok(())
    }

    async fn check_open_loan(
        &self,
        livre_id: Option<i32>,
        stays_open: bool,
        exclude_id: i32,
    ) -> AppResult<()> {
        if let Some(livre_id) = livre_id {
            if stays_open
                && self
                    .repository
                    .emprunts
                    .has_open_loan(livre_id, Some(exclude_id))
                    .await?
            {
                return Err(AppError::BusinessRule(
                    "This livre is already borrowed".to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn invalidate(&self) {
        self.cache.invalidate_resource("emprunts").await;
    }
}
