//! Book (livre) model, validation rules and related types

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::auteur::Auteur;
use super::categorie::Categorie;
use super::user::UserPublic;
use crate::error::AppError;

/// Full book model (DB + API). Relations are loaded separately.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Livre {
    pub id: i32,
    pub titre: Option<String>,
    pub date_publication: Option<NaiveDate>,
    pub isbn: Option<String>,
    pub auteur_id: Option<i32>,
    pub createur_id: Option<i32>,
    #[sqlx(skip)]
    #[serde(default)]
    pub auteur: Option<Auteur>,
    #[sqlx(skip)]
    #[serde(default)]
    pub createur: Option<UserPublic>,
    #[sqlx(skip)]
    #[serde(default)]
    pub categories: Vec<Categorie>,
}

/// Short book representation embedded in loan and review payloads
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LivreShort {
    pub id: i32,
    pub titre: Option<String>,
    pub date_publication: Option<NaiveDate>,
    pub isbn: Option<String>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLivre {
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub titre: Option<String>,
    pub date_publication: Option<NaiveDate>,
    pub isbn: Option<String>,
    pub auteur_id: Option<i32>,
    #[serde(default)]
    pub categorie_ids: Vec<i32>,
}

/// Update book request (PATCH leaves absent fields untouched; the PUT
/// handler fills absent fields with NULL before calling the service)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLivre {
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub titre: Option<String>,
    pub date_publication: Option<NaiveDate>,
    pub isbn: Option<String>,
    pub auteur_id: Option<i32>,
    pub categorie_ids: Option<Vec<i32>>,
}

/// Book list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LivreQuery {
    /// Substring match on the title
    pub titre: Option<String>,
    /// Substring match on the related author's last name
    pub auteur_nom: Option<String>,
    /// Substring match on the related author's first name
    pub auteur_prenom: Option<String>,
    /// Substring match on a related category name
    pub categorie_nom: Option<String>,
    /// Inclusive lower bound on publication date
    pub date_publication_min: Option<NaiveDate>,
    /// Inclusive upper bound on publication date
    pub date_publication_max: Option<NaiveDate>,
    /// Sort field, `-` prefix for descending (titre, date_publication, auteur_nom)
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// ISBN must be exactly 13 ASCII digits
pub fn validate_isbn(value: &str) -> Result<(), String> {
    if value.len() != 13 {
        return Err(format!("{} size is not correct", value));
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("{} is incorrect. It must contain numbers only", value));
    }
    Ok(())
}

/// Publication date must not be in the future
pub fn validate_date_publication(value: NaiveDate) -> Result<(), String> {
    if value > Utc::now().date_naive() {
        return Err(format!("{} is in the future", value));
    }
    Ok(())
}

fn domain_checks(
    isbn: Option<&str>,
    date_publication: Option<NaiveDate>,
) -> Result<(), AppError> {
    let mut fields = BTreeMap::new();
    if let Some(isbn) = isbn {
        if let Err(message) = validate_isbn(isbn) {
            fields.insert("isbn".to_string(), message);
        }
    }
    if let Some(date) = date_publication {
        if let Err(message) = validate_date_publication(date) {
            fields.insert("date_publication".to_string(), message);
        }
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(AppError::FieldValidation(fields))
    }
}

impl CreateLivre {
    /// Field-level checks beyond the derive: ISBN shape, publication date
    pub fn check_domain(&self) -> Result<(), AppError> {
        domain_checks(self.isbn.as_deref(), self.date_publication)
    }
}

impl UpdateLivre {
    pub fn check_domain(&self) -> Result<(), AppError> {
        domain_checks(self.isbn.as_deref(), self.date_publication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isbn_must_be_13_digits() {
        assert!(validate_isbn("1234567890098").is_ok());
        // contains letters
        assert!(validate_isbn("29s8d3798a137").is_err());
        // letters only
        assert!(validate_isbn("dazdijaodijaz").is_err());
        // over 13 digits
        assert!(validate_isbn("238710398120398230981230283").is_err());
        // below 13 digits
        assert!(validate_isbn("123").is_err());
    }

    #[test]
    fn publication_date_must_not_be_in_the_future() {
        let today = Utc::now().date_naive();
        assert!(validate_date_publication(today).is_ok());
        assert!(validate_date_publication(today - chrono::Duration::days(1)).is_ok());
        assert!(validate_date_publication(today + chrono::Duration::days(1)).is_err());
    }

    #[test]
    fn create_request_reports_invalid_fields_together() {
        let request = CreateLivre {
            titre: Some("titre 1".to_string()),
            date_publication: Some(Utc::now().date_naive() + chrono::Duration::days(30)),
            isbn: Some("1234567890oii".to_string()),
            auteur_id: None,
            categorie_ids: vec![],
        };
        match request.check_domain() {
            Err(AppError::FieldValidation(fields)) => {
                assert!(fields.contains_key("isbn"));
                assert!(fields.contains_key("date_publication"));
            }
            other => panic!("expected field validation error, got {:?}", other.err()),
        }
    }

    #[test]
    fn valid_create_request_passes() {
        let request = CreateLivre {
            titre: Some("titre 1".to_string()),
            date_publication: Some(NaiveDate::from_ymd_opt(2020, 1, 12).unwrap()),
            isbn: Some("1234567890111".to_string()),
            auteur_id: None,
            categorie_ids: vec![],
        };
        assert!(request.check_domain().is_ok());
        assert!(request.validate().is_ok());
    }
}
