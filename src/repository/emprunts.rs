//! Loans repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        emprunt::{Emprunt, EmpruntQuery},
        livre::LivreShort,
        membre::MembreShort,
    },
};

use super::{like_condition, order_clause, page_window};

const ORDERING_FIELDS: &[(&str, &str)] = &[
    ("date_emp", "e.date_emp"),
    ("date_ret", "e.date_ret"),
    ("retourne", "e.retourne"),
];

/// Scope applied before filtering: nested routes pin a member or a book,
/// and non-admin callers are always pinned to their own member id.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmpruntScope {
    pub membre_id: Option<i32>,
    pub livre_id: Option<i32>,
}

#[derive(Clone)]
pub struct EmpruntsRepository {
    pool: Pool<Postgres>,
}

impl EmpruntsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn conditions(query: &EmpruntQuery, scope: &EmpruntScope) -> Vec<String> {
        let mut conditions = vec!["1=1".to_string()];

        if let Some(ref titre) = query.livre_titre {
            conditions.push(like_condition("l.titre", titre));
        }
        if let Some(min) = query.date_emp_min {
            conditions.push(format!("e.date_emp >= '{}'", min));
        }
        if let Some(max) = query.date_emp_max {
            conditions.push(format!("e.date_emp <= '{}'", max));
        }
        if let Some(min) = query.date_ret_min {
            conditions.push(format!("e.date_ret >= '{}'", min));
        }
        if let Some(max) = query.date_ret_max {
            conditions.push(format!("e.date_ret <= '{}'", max));
        }
        if let Some(min) = query.retourne_min {
            conditions.push(format!("e.retourne >= '{}'", min));
        }
        if let Some(max) = query.retourne_max {
            conditions.push(format!("e.retourne <= '{}'", max));
        }
        if let Some(ref nom) = query.membre_nom {
            conditions.push(like_condition("u.nom", nom));
        }
        if let Some(ref prenom) = query.membre_prenom {
            conditions.push(like_condition("u.prenom", prenom));
        }
        if let Some(membre_id) = scope.membre_id {
            conditions.push(format!("e.membre_id = {}", membre_id));
        }
        if let Some(livre_id) = scope.livre_id {
            conditions.push(format!("e.livre_id = {}", livre_id));
        }

        conditions
    }

    pub async fn search(
        &self,
        query: &EmpruntQuery,
        scope: &EmpruntScope,
        pagination: &PaginationConfig,
    ) -> AppResult<(Vec<Emprunt>, i64)> {
        let where_clause = Self::conditions(query, scope).join(" AND ");
        let order = order_clause(query.ordering.as_deref(), ORDERING_FIELDS, "e.id ASC")?;
        let (_, page_size, offset) = page_window(query.page, query.page_size, pagination);

        let from_clause = r#"
            FROM emprunts e
            LEFT JOIN livres l ON l.id = e.livre_id
            LEFT JOIN membres m ON m.id = e.membre_id
            LEFT JOIN users u ON u.id = m.user_id
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) {} WHERE {}",
            from_clause, where_clause
        ))
        .fetch_one(&self.pool)
        .await?;

        let mut emprunts = sqlx::query_as::<_, Emprunt>(&format!(
            r#"
            SELECT e.id, e.membre_id, e.livre_id, e.date_emp, e.date_ret, e.retourne
            {}
            WHERE {}
            ORDER BY {}
            LIMIT {} OFFSET {}
            "#,
            from_clause, where_clause, order, page_size, offset
        ))
        .fetch_all(&self.pool)
        .await?;

        for emprunt in &mut emprunts {
            self.hydrate(emprunt).await?;
        }

        Ok((emprunts, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Emprunt> {
        let mut emprunt = sqlx::query_as::<_, Emprunt>(
            "SELECT id, membre_id, livre_id, date_emp, date_ret, retourne FROM emprunts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Emprunt with id {} not found", id)))?;

        self.hydrate(&mut emprunt).await?;
        Ok(emprunt)
    }

    async fn hydrate(&self, emprunt: &mut Emprunt) -> AppResult<()> {
        if let Some(membre_id) = emprunt.membre_id {
            emprunt.membre = sqlx::query_as::<_, MembreShort>(
                "SELECT id, adresse, telephone FROM membres WHERE id = $1",
            )
            .bind(membre_id)
            .fetch_optional(&self.pool)
            .await?;
        }
        if let Some(livre_id) = emprunt.livre_id {
            emprunt.livre = sqlx::query_as::<_, LivreShort>(
                "SELECT id, titre, date_publication, isbn FROM livres WHERE id = $1",
            )
            .bind(livre_id)
            .fetch_optional(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// True when the book has a loan that has not been returned yet
    pub async fn has_open_loan(&self, livre_id: i32, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM emprunts
                WHERE livre_id = $1
                  AND retourne IS NULL
                  AND ($2::int IS NULL OR id != $2)
            )
            "#,
        )
        .bind(livre_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(
        &self,
        membre_id: Option<i32>,
        livre_id: Option<i32>,
        date_emp: NaiveDate,
        date_ret: NaiveDate,
        retourne: Option<NaiveDate>,
    ) -> AppResult<Emprunt> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO emprunts (membre_id, livre_id, date_emp, date_ret, retourne)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(membre_id)
        .bind(livre_id)
        .bind(date_emp)
        .bind(date_ret)
        .bind(retourne)
        .fetch_one(&self.pool)
        .await?;
        self.get_by_id(id).await
    }

    pub async fn update_full(
        &self,
        id: i32,
        membre_id: Option<i32>,
        livre_id: Option<i32>,
        date_emp: NaiveDate,
        date_ret: NaiveDate,
        retourne: Option<NaiveDate>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE emprunts
            SET membre_id = $2, livre_id = $3, date_emp = $4, date_ret = $5, retourne = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(membre_id)
        .bind(livre_id)
        .bind(date_emp)
        .bind(date_ret)
        .bind(retourne)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Emprunt with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn update_partial(
        &self,
        id: i32,
        membre_id: Option<i32>,
        livre_id: Option<i32>,
        date_emp: Option<NaiveDate>,
        date_ret: Option<NaiveDate>,
        retourne: Option<NaiveDate>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE emprunts
            SET membre_id = COALESCE($2, membre_id),
                livre_id = COALESCE($3, livre_id),
                date_emp = COALESCE($4, date_emp),
                date_ret = COALESCE($5, date_ret),
                retourne = COALESCE($6, retourne)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(membre_id)
        .bind(livre_id)
        .bind(date_emp)
        .bind(date_ret)
        .bind(retourne)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Emprunt with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM emprunts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Emprunt with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn set_membre(&self, id: i32, membre_id: Option<i32>) -> AppResult<()> {
        let result = sqlx::query("UPDATE emprunts SET membre_id = $2 WHERE id = $1")
            .bind(id)
            .bind(membre_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Emprunt with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn set_livre(&self, id: i32, livre_id: Option<i32>) -> AppResult<()> {
        let result = sqlx::query("UPDATE emprunts SET livre_id = $2 WHERE id = $1")
            .bind(id)
            .bind(livre_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Emprunt with id {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_bounds_are_inclusive() {
        let query = EmpruntQuery {
            date_emp_min: NaiveDate::from_ymd_opt(2025, 4, 1),
            retourne_max: NaiveDate::from_ymd_opt(2025, 5, 1),
            ..Default::default()
        };
        let conditions = EmpruntsRepository::conditions(&query, &EmpruntScope::default());
        assert!(conditions.contains(&"e.date_emp >= '2025-04-01'".to_string()));
        assert!(conditions.contains(&"e.retourne <= '2025-05-01'".to_string()));
    }

    #[test]
    fn row_scope_pins_the_member() {
        let scope = EmpruntScope {
            membre_id: Some(20),
            livre_id: None,
        };
        let conditions = EmpruntsRepository::conditions(&EmpruntQuery::default(), &scope);
        assert!(conditions.contains(&"e.membre_id = 20".to_string()));
    }

    #[test]
    fn book_title_filter_reaches_the_join() {
        let query = EmpruntQuery {
            livre_titre: Some("Titre1".to_string()),
            ..Default::default()
        };
        let conditions = EmpruntsRepository::conditions(&query, &EmpruntScope::default());
        assert!(conditions.contains(&"LOWER(l.titre) LIKE '%titre1%'".to_string()));
    }
}
