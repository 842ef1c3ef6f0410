//! Loan (emprunt) model and related types
//!
//! An emprunt is open while `retourne` is NULL.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::livre::LivreShort;
use super::membre::MembreShort;

/// Full loan model from database. Relations are loaded separately.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Emprunt {
    pub id: i32,
    pub membre_id: Option<i32>,
    pub livre_id: Option<i32>,
    pub date_emp: NaiveDate,
    pub date_ret: NaiveDate,
    pub retourne: Option<NaiveDate>,
    #[sqlx(skip)]
    #[serde(default)]
    pub membre: Option<MembreShort>,
    #[sqlx(skip)]
    #[serde(default)]
    pub livre: Option<LivreShort>,
}

impl Emprunt {
    /// Open means the book has not been returned yet
    pub fn is_open(&self) -> bool {
        self.retourne.is_none()
    }
}

/// Create loan request. `membre_id` is ignored for non-admin callers, who
/// can only borrow for themselves.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEmprunt {
    pub membre_id: Option<i32>,
    pub livre_id: Option<i32>,
    pub date_emp: NaiveDate,
    pub date_ret: NaiveDate,
    pub retourne: Option<NaiveDate>,
}

/// Update loan request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEmprunt {
    pub membre_id: Option<i32>,
    pub livre_id: Option<i32>,
    pub date_emp: Option<NaiveDate>,
    pub date_ret: Option<NaiveDate>,
    pub retourne: Option<NaiveDate>,
}

/// Loan list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct EmpruntQuery {
    /// Substring match on the related book's title
    pub livre_titre: Option<String>,
    pub date_emp_min: Option<NaiveDate>,
    pub date_emp_max: Option<NaiveDate>,
    pub date_ret_min: Option<NaiveDate>,
    pub date_ret_max: Option<NaiveDate>,
    pub retourne_min: Option<NaiveDate>,
    pub retourne_max: Option<NaiveDate>,
    /// Substring match on the owning member's last name
    pub membre_nom: Option<String>,
    /// Substring match on the owning member's first name
    pub membre_prenom: Option<String>,
    /// Sort field, `-` prefix for descending (date_emp, date_ret, retourne)
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_status_follows_return_date() {
        let mut emprunt = Emprunt {
            id: 1,
            membre_id: Some(1),
            livre_id: Some(1),
            date_emp: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            date_ret: NaiveDate::from_ymd_opt(2025, 4, 22).unwrap(),
            retourne: None,
            membre: None,
            livre: None,
        };
        assert!(emprunt.is_open());
        emprunt.retourne = NaiveDate::from_ymd_opt(2025, 4, 20);
        assert!(!emprunt.is_open());
    }
}
