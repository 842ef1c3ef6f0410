//! Reviews repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        avis::{Avis, AvisQuery},
        livre::LivreShort,
        membre::MembreShort,
    },
};

use super::{like_condition, order_clause, page_window};

const ORDERING_FIELDS: &[(&str, &str)] = &[("note", "a.note"), ("livre_titre", "l.titre")];

/// Scope applied before filtering, same shape as the loans one: nested
/// routes pin a member or a book.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvisScope {
    pub membre_id: Option<i32>,
    pub livre_id: Option<i32>,
}

#[derive(Clone)]
pub struct AvisRepository {
    pool: Pool<Postgres>,
}

impl AvisRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn conditions(query: &AvisQuery, scope: &AvisScope) -> Vec<String> {
        let mut conditions = vec!["1=1".to_string()];

        if let Some(note) = query.note {
            conditions.push(format!("a.note = {}", note));
        }
        if let Some(ref commentaire) = query.commentaire {
            conditions.push(like_condition("a.commentaire", commentaire));
        }
        if let Some(ref titre) = query.livre_titre {
            conditions.push(like_condition("l.titre", titre));
        }
        if let Some(membre) = query.membre {
            conditions.push(format!("a.membre_id = {}", membre));
        }
        if let Some(membre_id) = scope.membre_id {
            conditions.push(format!("a.membre_id = {}", membre_id));
        }
        if let Some(livre_id) = scope.livre_id {
            conditions.push(format!("a.livre_id = {}", livre_id));
        }

        conditions
    }

    pub async fn search(
        &self,
        query: &AvisQuery,
        scope: &AvisScope,
        pagination: &PaginationConfig,
    ) -> AppResult<(Vec<Avis>, i64)> {
        let where_clause = Self::conditions(query, scope).join(" AND ");
        let order = order_clause(query.ordering.as_deref(), ORDERING_FIELDS, "a.id ASC")?;
        let (_, page_size, offset) = page_window(query.page, query.page_size, pagination);

        let from_clause = r#"
            FROM avis a
            LEFT JOIN livres l ON l.id = a.livre_id
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) {} WHERE {}",
            from_clause, where_clause
        ))
        .fetch_one(&self.pool)
        .await?;

        let mut avis = sqlx::query_as::<_, Avis>(&format!(
            r#"
            SELECT a.id, a.membre_id, a.livre_id, a.note, a.commentaire
            {}
            WHERE {}
            ORDER BY {}
            LIMIT {} OFFSET {}
            "#,
            from_clause, where_clause, order, page_size, offset
        ))
        .fetch_all(&self.pool)
        .await?;

        for item in &mut avis {
            self.hydrate(item).await?;
        }

        Ok((avis, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Avis> {
        let mut avis = sqlx::query_as::<_, Avis>(
            "SELECT id, membre_id, livre_id, note, commentaire FROM avis WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Avis with id {} not found", id)))?;

        self.hydrate(&mut avis).await?;
        Ok(avis)
    }

    async fn hydrate(&self, avis: &mut Avis) -> AppResult<()> {
        if let Some(membre_id) = avis.membre_id {
            avis.membre = sqlx::query_as::<_, MembreShort>(
                "SELECT id, adresse, telephone FROM membres WHERE id = $1",
            )
            .bind(membre_id)
            .fetch_optional(&self.pool)
            .await?;
        }
        if let Some(livre_id) = avis.livre_id {
            avis.livre = sqlx::query_as::<_, LivreShort>(
                "SELECT id, titre, date_publication, isbn FROM livres WHERE id = $1",
            )
            .bind(livre_id)
            .fetch_optional(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn create(
        &self,
        membre_id: Option<i32>,
        livre_id: Option<i32>,
        note: Option<i32>,
        commentaire: Option<&str>,
    ) -> AppResult<Avis> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO avis (membre_id, livre_id, note, commentaire)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(membre_id)
        .bind(livre_id)
        .bind(note)
        .bind(commentaire)
        .fetch_one(&self.pool)
        .await?;
        self.get_by_id(id).await
    }

    pub async fn update_full(
        &self,
        id: i32,
        note: Option<i32>,
        commentaire: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE avis SET note = $2, commentaire = $3 WHERE id = $1")
            .bind(id)
            .bind(note)
            .bind(commentaire)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Avis with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn update_partial(
        &self,
        id: i32,
        note: Option<i32>,
        commentaire: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE avis
            SET note = COALESCE($2, note),
                commentaire = COALESCE($3, commentaire)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(note)
        .bind(commentaire)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Avis with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM avis WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Avis with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn set_membre(&self, id: i32, membre_id: Option<i32>) -> AppResult<()> {
        let result = sqlx::query("UPDATE avis SET membre_id = $2 WHERE id = $1")
            .bind(id)
            .bind(membre_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Avis with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn set_livre(&self, id: i32, livre_id: Option<i32>) -> AppResult<()> {
        let result = sqlx::query("UPDATE avis SET livre_id = $2 WHERE id = $1")
            .bind(id)
            .bind(livre_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Avis with id {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_filter_is_exact() {
        let query = AvisQuery {
            note: Some(4),
            ..Default::default()
        };
        let conditions = AvisRepository::conditions(&query, &AvisScope::default());
        assert!(conditions.contains(&"a.note = 4".to_string()));
    }

    #[test]
    fn comment_filter_is_a_substring_match() {
        let query = AvisQuery {
            commentaire: Some("Superbe".to_string()),
            ..Default::default()
        };
        let conditions = AvisRepository::conditions(&query, &AvisScope::default());
        assert!(conditions.contains(&"LOWER(a.commentaire) LIKE '%superbe%'".to_string()));
    }

    #[test]
    fn book_scope_pins_the_review_list() {
        let scope = AvisScope {
            membre_id: None,
            livre_id: Some(7),
        };
        let conditions = AvisRepository::conditions(&AvisQuery::default(), &scope);
        assert!(conditions.contains(&"a.livre_id = 7".to_string()));
    }
}
