//! Repository layer for database operations

pub mod auteurs;
pub mod avis;
pub mod categories;
pub mod emprunts;
pub mod livres;
pub mod membres;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::config::PaginationConfig;
use crate::error::{AppError, AppResult};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub auteurs: auteurs::AuteursRepository,
    pub avis: avis::AvisRepository,
    pub categories: categories::CategoriesRepository,
    pub emprunts: emprunts::EmpruntsRepository,
    pub livres: livres::LivresRepository,
    pub membres: membres::MembresRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            auteurs: auteurs::AuteursRepository::new(pool.clone()),
            avis: avis::AvisRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            emprunts: emprunts::EmpruntsRepository::new(pool.clone()),
            livres: livres::LivresRepository::new(pool.clone()),
            membres: membres::MembresRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Case-insensitive substring predicate on a text column
pub(crate) fn like_condition(column: &str, value: &str) -> String {
    format!(
        "LOWER({}) LIKE '%{}%'",
        column,
        value.to_lowercase().replace('\'', "''").replace('%', "").replace('\\', "")
    )
}

/// Translate an `ordering` query parameter against a per-resource allow-list
/// of (parameter name, SQL column) pairs. A `-` prefix means descending.
/// Ascending orders put NULLs first (matches the API's observed behavior on
/// nullable date columns).
pub(crate) fn order_clause(
    ordering: Option<&str>,
    allowed: &[(&str, &str)],
    default: &str,
) -> AppResult<String> {
    let raw = match ordering {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(default.to_string()),
    };

    let (field, descending) = match raw.strip_prefix('-') {
        Some(field) => (field, true),
        None => (raw, false),
    };

    let column = allowed
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| *column)
        .ok_or_else(|| AppError::Validation(format!("Cannot order by '{}'", field)))?;

    if descending {
        Ok(format!("{} DESC NULLS LAST", column))
    } else {
        Ok(format!("{} ASC NULLS FIRST", column))
    }
}

/// Resolve the page window: returns (page, page_size, offset), clamping the
/// requested page size to the configured maximum.
pub(crate) fn page_window(
    page: Option<i64>,
    page_size: Option<i64>,
    pagination: &PaginationConfig,
) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(pagination.default_page_size)
        .clamp(1, pagination.max_page_size);
    let offset = (page - 1) * page_size;
    (page, page_size, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[(&str, &str)] = &[
        ("titre", "l.titre"),
        ("date_publication", "l.date_publication"),
        ("auteur_nom", "a.nom"),
    ];

    #[test]
    fn like_condition_lowercases_and_strips_quotes() {
        assert_eq!(
            like_condition("l.titre", "Titre1"),
            "LOWER(l.titre) LIKE '%titre1%'"
        );
        assert_eq!(
            like_condition("l.titre", "o'brien"),
            "LOWER(l.titre) LIKE '%o''brien%'"
        );
    }

    #[test]
    fn ordering_ascending_puts_nulls_first() {
        let clause = order_clause(Some("date_publication"), ALLOWED, "l.id ASC").unwrap();
        assert_eq!(clause, "l.date_publication ASC NULLS FIRST");
    }

    #[test]
    fn ordering_descending_with_prefix() {
        let clause = order_clause(Some("-titre"), ALLOWED, "l.id ASC").unwrap();
        assert_eq!(clause, "l.titre DESC NULLS LAST");
    }

    #[test]
    fn ordering_falls_back_to_default() {
        assert_eq!(order_clause(None, ALLOWED, "l.id ASC").unwrap(), "l.id ASC");
        assert_eq!(order_clause(Some(""), ALLOWED, "l.id ASC").unwrap(), "l.id ASC");
    }

    #[test]
    fn ordering_rejects_unknown_fields() {
        assert!(order_clause(Some("isbn"), ALLOWED, "l.id ASC").is_err());
        assert!(order_clause(Some("-createur_id"), ALLOWED, "l.id ASC").is_err());
    }

    #[test]
    fn page_window_clamps_to_configured_maximum() {
        let pagination = PaginationConfig {
            default_page_size: 10,
            max_page_size: 50,
        };
        assert_eq!(page_window(None, None, &pagination), (1, 10, 0));
        assert_eq!(page_window(Some(3), Some(20), &pagination), (3, 20, 40));
        assert_eq!(page_window(Some(2), Some(500), &pagination), (2, 50, 50));
        assert_eq!(page_window(Some(0), Some(0), &pagination), (1, 1, 0));
    }
}
