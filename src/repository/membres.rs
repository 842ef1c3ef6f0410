//! Members repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        membre::{CreateMembre, Membre, MembreQuery},
        user::UserPublic,
    },
};

use super::{like_condition, order_clause, page_window};

const ORDERING_FIELDS: &[(&str, &str)] = &[
    ("nom", "u.nom"),
    ("prenom", "u.prenom"),
    ("adresse", "m.adresse"),
];

#[derive(Clone)]
pub struct MembresRepository {
    pool: Pool<Postgres>,
}

impl MembresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn search(
        &self,
        query: &MembreQuery,
        pagination: &PaginationConfig,
    ) -> AppResult<(Vec<Membre>, i64)> {
        let mut conditions = vec!["1=1".to_string()];
        if let Some(ref nom) = query.nom {
            conditions.push(like_condition("u.nom", nom));
        }
        if let Some(ref prenom) = query.prenom {
            conditions.push(like_condition("u.prenom", prenom));
        }
        if let Some(ref adresse) = query.adresse {
            conditions.push(like_condition("m.adresse", adresse));
        }
        if let Some(ref telephone) = query.telephone {
            conditions.push(like_condition("m.telephone", telephone));
        }
        let where_clause = conditions.join(" AND ");
        let order = order_clause(query.ordering.as_deref(), ORDERING_FIELDS, "m.id ASC")?;
        let (_, page_size, offset) = page_window(query.page, query.page_size, pagination);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM membres m JOIN users u ON u.id = m.user_id WHERE {}",
            where_clause
        ))
        .fetch_one(&self.pool)
        .await?;

        let mut membres = sqlx::query_as::<_, Membre>(&format!(
            r#"
            SELECT m.id, m.user_id, m.adresse, m.telephone
            FROM membres m
            JOIN users u ON u.id = m.user_id
            WHERE {}
            ORDER BY {}
            LIMIT {} OFFSET {}
            "#,
            where_clause, order, page_size, offset
        ))
        .fetch_all(&self.pool)
        .await?;

        for membre in &mut membres {
            self.hydrate(membre).await?;
        }

        Ok((membres, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Membre> {
        let mut membre = sqlx::query_as::<_, Membre>(
            "SELECT id, user_id, adresse, telephone FROM membres WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Membre with id {} not found", id)))?;

        self.hydrate(&mut membre).await?;
        Ok(membre)
    }

    /// Resolve the member record of a user account. A missing record is a
    /// plain None, not an error: membership checks downstream fail closed.
    pub async fn get_by_user_id(&self, user_id: i32) -> AppResult<Option<Membre>> {
        let membre = sqlx::query_as::<_, Membre>(
            "SELECT id, user_id, adresse, telephone FROM membres WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membre)
    }

    async fn hydrate(&self, membre: &mut Membre) -> AppResult<()> {
        membre.user = sqlx::query_as::<_, UserPublic>(
            "SELECT id, prenom, nom, email FROM users WHERE id = $1",
        )
        .bind(membre.user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn create(&self, membre: &CreateMembre) -> AppResult<Membre> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO membres (user_id, adresse, telephone) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(membre.user_id)
        .bind(&membre.adresse)
        .bind(&membre.telephone)
        .fetch_one(&self.pool)
        .await?;
        self.get_by_id(id).await
    }

    pub async fn update_full(
        &self,
        id: i32,
        adresse: Option<&str>,
        telephone: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE membres SET adresse = $2, telephone = $3 WHERE id = $1")
            .bind(id)
            .bind(adresse)
            .bind(telephone)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Membre with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn update_partial(
        &self,
        id: i32,
        adresse: Option<&str>,
        telephone: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE membres
            SET adresse = COALESCE($2, adresse),
                telephone = COALESCE($3, telephone)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(adresse)
        .bind(telephone)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Membre with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM membres WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Membre with id {} not found", id)));
        }
        Ok(())
    }
}
