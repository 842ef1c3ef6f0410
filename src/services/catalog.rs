//! Catalog service: books, authors and categories

use validator::Validate;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        auteur::{Auteur, AuteurQuery, CreateAuteur, UpdateAuteur},
        categorie::{Categorie, CategorieQuery, CreateCategorie, UpdateCategorie},
        livre::{CreateLivre, Livre, LivreQuery, UpdateLivre},
    },
    repository::{livres::LivreScope, Repository},
};

use super::cache::CacheService;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    cache: CacheService,
    pagination: PaginationConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, cache: CacheService, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            cache,
            pagination,
        }
    }

    // Books

    pub async fn list_livres(
        &self,
        query: &LivreQuery,
        scope: &LivreScope,
    ) -> AppResult<(Vec<Livre>, i64)> {
        self.repository
            .livres
            .search(query, scope, &self.pagination)
            .await
    }

    pub async fn get_livre(&self, id: i32) -> AppResult<Livre> {
        self.repository.livres.get_by_id(id).await
    }

    pub async fn create_livre(
        &self,
        livre: CreateLivre,
        createur_id: Option<i32>,
    ) -> AppResult<Livre> {
        livre.validate()?;
        livre.check_domain()?;
        self.check_livre_unique(livre.titre.as_deref(), livre.auteur_id, livre.isbn.as_deref(), None)
            .await?;
        self.check_auteur_ref(livre.auteur_id).await?;
        for categorie_id in &livre.categorie_ids {
            self.repository.categories.get_by_id(*categorie_id).await?;
        }

        let created = self.repository.livres.create(&livre, createur_id).await?;
        self.invalidate_livres().await;
        Ok(created)
    }

    /// Full replacement: absent fields are cleared
    pub async fn update_livre_full(&self, id: i32, livre: UpdateLivre) -> AppResult<Livre> {
        livre.validate()?;
        livre.check_domain()?;
        self.repository.livres.get_by_id(id).await?;

        self.check_livre_unique(
            livre.titre.as_deref(),
            livre.auteur_id,
            livre.isbn.as_deref(),
            Some(id),
        )
        .await?;
        self.check_auteur_ref(livre.auteur_id).await?;

        self.repository
            .livres
            .update_full(
                id,
                livre.titre.as_deref(),
                livre.date_publication,
                livre.isbn.as_deref(),
                livre.auteur_id,
            )
            .await?;
        if let Some(ref categorie_ids) = livre.categorie_ids {
            self.repository
                .livres
                .replace_categories(id, categorie_ids)
                .await?;
        }
        self.invalidate_livres().await;
        self.repository.livres.get_by_id(id).await
    }

    /// Partial update: absent fields keep their value
    pub async fn update_livre_partial(&self, id: i32, livre: UpdateLivre) -> AppResult<Livre> {
        livre.validate()?;
        livre.check_domain()?;
        let current = self.repository.livres.get_by_id(id).await?;

        let titre = livre.titre.clone().or(current.titre);
        let auteur_id = livre.auteur_id.or(current.auteur_id);
        self.check_livre_unique(titre.as_deref(), auteur_id, livre.isbn.as_deref(), Some(id))
            .await?;
        self.check_auteur_ref(livre.auteur_id).await?;

        self.repository
            .livres
            .update_partial(
                id,
                livre.titre.as_deref(),
                livre.date_publication,
                livre.isbn.as_deref(),
                livre.auteur_id,
            )
            .await?;
        if let Some(ref categorie_ids) = livre.categorie_ids {
            self.repository
                .livres
                .replace_categories(id, categorie_ids)
                .await?;
        }
        self.invalidate_livres().await;
        self.repository.livres.get_by_id(id).await
    }

    pub async fn delete_livre(&self, id: i32) -> AppResult<()> {
        self.repository.livres.delete(id).await?;
        self.invalidate_livres().await;
        Ok(())
    }

    pub async fn attach_auteur(&self, livre_id: i32, auteur_id: i32) -> AppResult<Livre> {
        self.repository.auteurs.get_by_id(auteur_id).await?;
        self.repository.livres.set_auteur(livre_id, auteur_id).await?;
        self.invalidate_livres().await;
        self.repository.livres.get_by_id(livre_id).await
    }

    pub async fn detach_auteur(&self, livre_id: i32) -> AppResult<Livre> {
        self.repository.livres.get_by_id(livre_id).await?;
        self.repository.livres.remove_auteur(livre_id).await?;
        self.invalidate_livres().await;
        self.repository.livres.get_by_id(livre_id).await
    }

    pub async fn attach_categorie(&self, livre_id: i32, categorie_id: i32) -> AppResult<Livre> {
        self.repository.livres.get_by_id(livre_id).await?;
        self.repository.categories.get_by_id(categorie_id).await?;
        self.repository
            .livres
            .add_categorie(livre_id, categorie_id)
            .await?;
        self.invalidate_livres().await;
        self.repository.livres.get_by_id(livre_id).await
    }

    pub async fn detach_categorie(&self, livre_id: i32, categorie_id: i32) -> AppResult<Livre> {
        self.repository.livres.get_by_id(livre_id).await?;
        self.repository
            .livres
            .remove_categorie(livre_id, categorie_id)
            .await?;
        self.invalidate_livres().await;
        self.repository.livres.get_by_id(livre_id).await
    }

    async fn check_livre_unique(
        &self,
        titre: Option<&str>,
        auteur_id: Option<i32>,
        isbn: Option<&str>,
        exclude_id: Option<i32>,
    ) -> AppResult<()> {
        if let Some(titre) = titre {
            if self
                .repository
                .livres
                .titre_auteur_exists(titre, auteur_id, exclude_id)
                .await?
            {
                return Err(AppError::Conflict(format!(
                    "A livre titled '{}' already exists for this auteur",
                    titre
                )));
            }
        }
        if let Some(isbn) = isbn {
            if self.repository.livres.isbn_exists(isbn, exclude_id).await? {
                return Err(AppError::Conflict(format!(
                    "A livre with ISBN {} already exists",
                    isbn
                )));
            }
        }
        Ok(())
    }

    async fn check_auteur_ref(&self, auteur_id: Option<i32>) -> AppResult<()> {
        if let Some(auteur_id) = auteur_id {
            self.repository.auteurs.get_by_id(auteur_id).await?;
        }
        Ok(())
    }

    /// Book payloads embed author, creator and categories, and loans embed
    /// book summaries, so both cached resources are dropped together.
    async fn invalidate_livres(&self) {
        self.cache.invalidate_resource("livres").await;
        self.cache.invalidate_resource("emprunts").await;
    }

    // Authors

    pub async fn list_auteurs(&self, query: &AuteurQuery) -> AppResult<(Vec<Auteur>, i64)> {
        self.repository.auteurs.search(query, &self.pagination).await
    }

    pub async fn get_auteur(&self, id: i32) -> AppResult<Auteur> {
        self.repository.auteurs.get_by_id(id).await
    }

    pub async fn create_auteur(&self, auteur: CreateAuteur) -> AppResult<Auteur> {
        auteur.validate()?;
        let created = self.repository.auteurs.create(&auteur).await?;
        self.invalidate_livres().await;
        Ok(created)
    }

    pub async fn update_auteur_full(&self, id: i32, auteur: UpdateAuteur) -> AppResult<Auteur> {
        auteur.validate()?;
        self.repository
            .auteurs
            .update_full(
                id,
                auteur.nom.as_deref(),
                auteur.prenom.as_deref(),
                auteur.date_naissance,
            )
            .await?;
        self.invalidate_livres().await;
        self.repository.auteurs.get_by_id(id).await
    }

    pub async fn update_auteur_partial(&self, id: i32, auteur: UpdateAuteur) -> AppResult<Auteur> {
        auteur.validate()?;
        self.repository
            .auteurs
            .update_partial(
                id,
                auteur.nom.as_deref(),
                auteur.prenom.as_deref(),
                auteur.date_naissance,
            )
            .await?;
        self.invalidate_livres().await;
        self.repository.auteurs.get_by_id(id).await
    }

    pub async fn delete_auteur(&self, id: i32) -> AppResult<()> {
        self.repository.auteurs.delete(id).await?;
        self.invalidate_livres().await;
        Ok(())
    }

    // Categories

    pub async fn list_categories(
        &self,
        query: &CategorieQuery,
    ) -> AppResult<(Vec<Categorie>, i64)> {
        self.repository
            .categories
            .search(query, &self.pagination)
            .await
    }

    pub async fn get_categorie(&self, id: i32) -> AppResult<Categorie> {
        self.repository.categories.get_by_id(id).await
    }

    pub async fn create_categorie(&self, categorie: CreateCategorie) -> AppResult<Categorie> {
        categorie.validate()?;
        let created = self.repository.categories.create(&categorie).await?;
        self.invalidate_livres().await;
        Ok(created)
    }

    pub async fn update_categorie_full(
        &self,
        id: i32,
        categorie: UpdateCategorie,
    ) -> AppResult<Categorie> {
        categorie.validate()?;
        self.repository
            .categories
            .update_full(id, categorie.nom.as_deref(), categorie.description.as_deref())
            .await?;
        self.invalidate_livres().await;
        self.repository.categories.get_by_id(id).await
    }

    pub async fn update_categorie_partial(
        &self,
        id: i32,
        categorie: UpdateCategorie,
    ) -> AppResult<Categorie> {
        categorie.validate()?;
        self.repository
            .categories
            .update_partial(id, categorie.nom.as_deref(), categorie.description.as_deref())
            .await?;
        self.invalidate_livres().await;
        self.repository.categories.get_by_id(id).await
    }

    pub async fn delete_categorie(&self, id: i32) -> AppResult<()> {
        self.repository.categories.delete(id).await?;
        self.invalidate_livres().await;
        Ok(())
    }
}
