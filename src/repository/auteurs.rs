//! Authors repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::auteur::{Auteur, AuteurQuery, CreateAuteur},
};

use super::{like_condition, order_clause, page_window};

const ORDERING_FIELDS: &[(&str, &str)] = &[
    ("nom", "nom"),
    ("prenom", "prenom"),
    ("date_naissance", "date_naissance"),
];

#[derive(Clone)]
pub struct AuteursRepository {
    pool: Pool<Postgres>,
}

impl AuteursRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn search(
        &self,
        query: &AuteurQuery,
        pagination: &PaginationConfig,
    ) -> AppResult<(Vec<Auteur>, i64)> {
        let mut conditions = vec!["1=1".to_string()];
        if let Some(ref nom) = query.nom {
            conditions.push(like_condition("nom", nom));
        }
        if let Some(ref prenom) = query.prenom {
            conditions.push(like_condition("prenom", prenom));
        }
        let where_clause = conditions.join(" AND ");
        let order = order_clause(query.ordering.as_deref(), ORDERING_FIELDS, "id ASC")?;
        let (_, page_size, offset) = page_window(query.page, query.page_size, pagination);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM auteurs WHERE {}", where_clause))
                .fetch_one(&self.pool)
                .await?;

        let auteurs = sqlx::query_as::<_, Auteur>(&format!(
            "SELECT id, nom, prenom, date_naissance FROM auteurs WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            where_clause, order, page_size, offset
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok((auteurs, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Auteur> {
        sqlx::query_as::<_, Auteur>(
            "SELECT id, nom, prenom, date_naissance FROM auteurs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Auteur with id {} not found", id)))
    }

    pub async fn create(&self, auteur: &CreateAuteur) -> AppResult<Auteur> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO auteurs (nom, prenom, date_naissance) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&auteur.nom)
        .bind(&auteur.prenom)
        .bind(auteur.date_naissance)
        .fetch_one(&self.pool)
        .await?;
        self.get_by_id(id).await
    }

    pub async fn update_full(
        &self,
        id: i32,
        nom: Option<&str>,
        prenom: Option<&str>,
        date_naissance: Option<chrono::NaiveDate>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE auteurs SET nom = $2, prenom = $3, date_naissance = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(nom)
        .bind(prenom)
        .bind(date_naissance)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Auteur with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn update_partial(
        &self,
        id: i32,
        nom: Option<&str>,
        prenom: Option<&str>,
        date_naissance: Option<chrono::NaiveDate>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE auteurs
            SET nom = COALESCE($2, nom),
                prenom = COALESCE($3, prenom),
                date_naissance = COALESCE($4, date_naissance)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(nom)
        .bind(prenom)
        .bind(date_naissance)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Auteur with id {} not found", id)));
        }
        Ok(())
    }

    /// Deleting an author leaves its books in place: the livres.auteur_id
    /// foreign key is ON DELETE SET NULL.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM auteurs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Auteur with id {} not found", id)));
        }
        Ok(())
    }
}
