//! Categories repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::categorie::{Categorie, CategorieQuery, CreateCategorie},
};

use super::{like_condition, order_clause, page_window};

const ORDERING_FIELDS: &[(&str, &str)] = &[("nom", "nom")];

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn search(
        &self,
        query: &CategorieQuery,
        pagination: &PaginationConfig,
    ) -> AppResult<(Vec<Categorie>, i64)> {
        let mut conditions = vec!["1=1".to_string()];
        if let Some(ref nom) = query.nom {
            conditions.push(like_condition("nom", nom));
        }
        let where_clause = conditions.join(" AND ");
        let order = order_clause(query.ordering.as_deref(), ORDERING_FIELDS, "id ASC")?;
        let (_, page_size, offset) = page_window(query.page, query.page_size, pagination);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM categories WHERE {}",
            where_clause
        ))
        .fetch_one(&self.pool)
        .await?;

        let categories = sqlx::query_as::<_, Categorie>(&format!(
            "SELECT id, nom, description FROM categories WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            where_clause, order, page_size, offset
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok((categories, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Categorie> {
        sqlx::query_as::<_, Categorie>("SELECT id, nom, description FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Categorie with id {} not found", id)))
    }

    pub async fn create(&self, categorie: &CreateCategorie) -> AppResult<Categorie> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO categories (nom, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(&categorie.nom)
        .bind(&categorie.description)
        .fetch_one(&self.pool)
        .await?;
        self.get_by_id(id).await
    }

    pub async fn update_full(
        &self,
        id: i32,
        nom: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE categories SET nom = $2, description = $3 WHERE id = $1")
            .bind(id)
            .bind(nom)
            .bind(description)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Categorie with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn update_partial(
        &self,
        id: i32,
        nom: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE categories
            SET nom = COALESCE($2, nom),
                description = COALESCE($3, description)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(nom)
        .bind(description)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Categorie with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Categorie with id {} not found", id)));
        }
        Ok(())
    }
}
