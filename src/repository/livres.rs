//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        auteur::Auteur,
        categorie::Categorie,
        livre::{CreateLivre, Livre, LivreQuery},
        user::UserPublic,
    },
};

use super::{like_condition, order_clause, page_window};

const ORDERING_FIELDS: &[(&str, &str)] = &[
    ("titre", "l.titre"),
    ("date_publication", "l.date_publication"),
    ("auteur_nom", "a.nom"),
];

/// Scope applied by nested list routes (books of one author or category)
#[derive(Debug, Clone, Copy, Default)]
pub struct LivreScope {
    pub auteur_id: Option<i32>,
    pub categorie_id: Option<i32>,
}

#[derive(Clone)]
pub struct LivresRepository {
    pool: Pool<Postgres>,
}

impl LivresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn conditions(query: &LivreQuery, scope: &LivreScope) -> Vec<String> {
        let mut conditions = vec!["1=1".to_string()];

        if let Some(ref titre) = query.titre {
            conditions.push(like_condition("l.titre", titre));
        }
        if let Some(ref nom) = query.auteur_nom {
            conditions.push(like_condition("a.nom", nom));
        }
        if let Some(ref prenom) = query.auteur_prenom {
            conditions.push(like_condition("a.prenom", prenom));
        }
        if let Some(ref nom) = query.categorie_nom {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM livre_categories lc JOIN categories c ON c.id = lc.categorie_id \
                 WHERE lc.livre_id = l.id AND {})",
                like_condition("c.nom", nom)
            ));
        }
        if let Some(min) = query.date_publication_min {
            conditions.push(format!("l.date_publication >= '{}'", min));
        }
        if let Some(max) = query.date_publication_max {
            conditions.push(format!("l.date_publication <= '{}'", max));
        }
        if let Some(auteur_id) = scope.auteur_id {
            conditions.push(format!("l.auteur_id = {}", auteur_id));
        }
        if let Some(categorie_id) = scope.categorie_id {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM livre_categories lc \
                 WHERE lc.livre_id = l.id AND lc.categorie_id = {})",
                categorie_id
            ));
        }

        conditions
    }

    /// Search books with filters, ordering and pagination
    pub async fn search(
        &self,
        query: &LivreQuery,
        scope: &LivreScope,
        pagination: &PaginationConfig,
    ) -> AppResult<(Vec<Livre>, i64)> {
        let where_clause = Self::conditions(query, scope).join(" AND ");
        let order = order_clause(query.ordering.as_deref(), ORDERING_FIELDS, "l.id ASC")?;
        let (_, page_size, offset) = page_window(query.page, query.page_size, pagination);

        let count_query = format!(
            "SELECT COUNT(*) FROM livres l LEFT JOIN auteurs a ON a.id = l.auteur_id WHERE {}",
            where_clause
        );
        let total: i64 = sqlx::query_scalar(&count_query).fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT l.id, l.titre, l.date_publication, l.isbn, l.auteur_id, l.createur_id
            FROM livres l
            LEFT JOIN auteurs a ON a.id = l.auteur_id
            WHERE {}
            ORDER BY {}
            LIMIT {} OFFSET {}
            "#,
            where_clause, order, page_size, offset
        );

        let mut livres = sqlx::query_as::<_, Livre>(&select_query)
            .fetch_all(&self.pool)
            .await?;

        for livre in &mut livres {
            self.hydrate(livre).await?;
        }

        Ok((livres, total))
    }

    /// Get a book by ID with its relations
    pub async fn get_by_id(&self, id: i32) -> AppResult<Livre> {
        let mut livre = sqlx::query_as::<_, Livre>(
            "SELECT id, titre, date_publication, isbn, auteur_id, createur_id FROM livres WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Livre with id {} not found", id)))?;

        self.hydrate(&mut livre).await?;
        Ok(livre)
    }

    /// Load author, creator and categories
    async fn hydrate(&self, livre: &mut Livre) -> AppResult<()> {
        if let Some(auteur_id) = livre.auteur_id {
            livre.auteur = sqlx::query_as::<_, Auteur>(
                "SELECT id, nom, prenom, date_naissance FROM auteurs WHERE id = $1",
            )
            .bind(auteur_id)
            .fetch_optional(&self.pool)
            .await?;
        }
        if let Some(createur_id) = livre.createur_id {
            livre.createur = sqlx::query_as::<_, UserPublic>(
                "SELECT id, prenom, nom, email FROM users WHERE id = $1",
            )
            .bind(createur_id)
            .fetch_optional(&self.pool)
            .await?;
        }
        livre.categories = sqlx::query_as::<_, Categorie>(
            r#"
            SELECT c.id, c.nom, c.description
            FROM categories c
            JOIN livre_categories lc ON lc.categorie_id = c.id
            WHERE lc.livre_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(livre.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(())
    }

    /// Create a new book, recording its creator
    pub async fn create(&self, livre: &CreateLivre, createur_id: Option<i32>) -> AppResult<Livre> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO livres (titre, date_publication, isbn, auteur_id, createur_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&livre.titre)
        .bind(livre.date_publication)
        .bind(&livre.isbn)
        .bind(livre.auteur_id)
        .bind(createur_id)
        .fetch_one(&self.pool)
        .await?;

        for categorie_id in &livre.categorie_ids {
            self.add_categorie(id, *categorie_id).await?;
        }

        self.get_by_id(id).await
    }

    /// Full update: every column is overwritten, absent values become NULL
    pub async fn update_full(
        &self,
        id: i32,
        titre: Option<&str>,
        date_publication: Option<chrono::NaiveDate>,
        isbn: Option<&str>,
        auteur_id: Option<i32>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE livres SET titre = $2, date_publication = $3, isbn = $4, auteur_id = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(titre)
        .bind(date_publication)
        .bind(isbn)
        .bind(auteur_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Livre with id {} not found", id)));
        }
        Ok(())
    }

    /// Partial update: absent values keep their current column value
    pub async fn update_partial(
        &self,
        id: i32,
        titre: Option<&str>,
        date_publication: Option<chrono::NaiveDate>,
        isbn: Option<&str>,
        auteur_id: Option<i32>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE livres
            SET titre = COALESCE($2, titre),
                date_publication = COALESCE($3, date_publication),
                isbn = COALESCE($4, isbn),
                auteur_id = COALESCE($5, auteur_id)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(titre)
        .bind(date_publication)
        .bind(isbn)
        .bind(auteur_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Livre with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM livres WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Livre with id {} not found", id)));
        }
        Ok(())
    }

    /// True when another book already uses this (titre, auteur) pair
    pub async fn titre_auteur_exists(
        &self,
        titre: &str,
        auteur_id: Option<i32>,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM livres
                WHERE titre = $1
                  AND auteur_id IS NOT DISTINCT FROM $2
                  AND ($3::int IS NULL OR id != $3)
            )
            "#,
        )
        .bind(titre)
        .bind(auteur_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// True when another book already uses this ISBN
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM livres WHERE isbn = $1 AND ($2::int IS NULL OR id != $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn set_auteur(&self, livre_id: i32, auteur_id: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE livres SET auteur_id = $2 WHERE id = $1")
            .bind(livre_id)
            .bind(auteur_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Livre with id {} not found", livre_id)));
        }
        Ok(())
    }

    pub async fn remove_auteur(&self, livre_id: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE livres SET auteur_id = NULL WHERE id = $1")
            .bind(livre_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Livre with id {} not found", livre_id)));
        }
        Ok(())
    }

    pub async fn add_categorie(&self, livre_id: i32, categorie_id: i32) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO livre_categories (livre_id, categorie_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(livre_id)
        .bind(categorie_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_categorie(&self, livre_id: i32, categorie_id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM livre_categories WHERE livre_id = $1 AND categorie_id = $2")
            .bind(livre_id)
            .bind(categorie_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace all category associations of a book
    pub async fn replace_categories(&self, livre_id: i32, categorie_ids: &[i32]) -> AppResult<()> {
        sqlx::query("DELETE FROM livre_categories WHERE livre_id = $1")
            .bind(livre_id)
            .execute(&self.pool)
            .await?;
        for categorie_id in categorie_ids {
            self.add_categorie(livre_id, *categorie_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_filter_builds_substring_predicate() {
        let query = LivreQuery {
            titre: Some("1".to_string()),
            ..Default::default()
        };
        let conditions = LivresRepository::conditions(&query, &LivreScope::default());
        assert!(conditions.contains(&"LOWER(l.titre) LIKE '%1%'".to_string()));
    }

    #[test]
    fn date_range_filters_are_inclusive() {
        let query = LivreQuery {
            date_publication_min: chrono::NaiveDate::from_ymd_opt(2020, 1, 1),
            date_publication_max: chrono::NaiveDate::from_ymd_opt(2020, 12, 31),
            ..Default::default()
        };
        let conditions = LivresRepository::conditions(&query, &LivreScope::default());
        assert!(conditions.contains(&"l.date_publication >= '2020-01-01'".to_string()));
        assert!(conditions.contains(&"l.date_publication <= '2020-12-31'".to_string()));
    }

    #[test]
    fn nested_scopes_constrain_the_query() {
        let scope = LivreScope {
            auteur_id: Some(4),
            categorie_id: Some(7),
        };
        let conditions = LivresRepository::conditions(&LivreQuery::default(), &scope);
        assert!(conditions.iter().any(|c| c == "l.auteur_id = 4"));
        assert!(conditions.iter().any(|c| c.contains("lc.categorie_id = 7")));
    }

    #[test]
    fn relation_filters_touch_the_joined_tables() {
        let query = LivreQuery {
            auteur_nom: Some("Hugo".to_string()),
            categorie_nom: Some("roman".to_string()),
            ..Default::default()
        };
        let conditions = LivresRepository::conditions(&query, &LivreScope::default());
        assert!(conditions.contains(&"LOWER(a.nom) LIKE '%hugo%'".to_string()));
        assert!(conditions.iter().any(|c| c.contains("LOWER(c.nom) LIKE '%roman%'")));
    }
}
