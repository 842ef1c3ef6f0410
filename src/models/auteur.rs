//! Author (auteur) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Auteur {
    pub id: i32,
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub date_naissance: Option<NaiveDate>,
}

/// Create author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuteur {
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub nom: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub prenom: Option<String>,
    pub date_naissance: Option<NaiveDate>,
}

/// Update author request (full and partial updates share this shape)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAuteur {
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub nom: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub prenom: Option<String>,
    pub date_naissance: Option<NaiveDate>,
}

/// Author list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AuteurQuery {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn nom_over_255_characters_is_rejected() {
        let auteur = CreateAuteur {
            nom: Some("x".repeat(256)),
            prenom: Some("JL".to_string()),
            date_naissance: None,
        };
        assert!(auteur.validate().is_err());

        let auteur = CreateAuteur {
            nom: Some("S".to_string()),
            prenom: Some("JL".to_string()),
            date_naissance: None,
        };
        assert!(auteur.validate().is_ok());
    }

    #[test]
    fn prenom_over_255_characters_is_rejected() {
        let auteur = CreateAuteur {
            nom: Some("S".to_string()),
            prenom: Some("x".repeat(256)),
            date_naissance: None,
        };
        assert!(auteur.validate().is_err());
    }
}
