//! Review (avis) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::livre::LivreShort;
use super::membre::MembreShort;

/// Full review model from database. Relations are loaded separately.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Avis {
    pub id: i32,
    pub membre_id: Option<i32>,
    pub livre_id: Option<i32>,
    pub note: Option<i32>,
    pub commentaire: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub membre: Option<MembreShort>,
    #[sqlx(skip)]
    #[serde(default)]
    pub livre: Option<LivreShort>,
}

/// Create review request. `membre_id` is ignored for non-admin callers.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAvis {
    pub membre_id: Option<i32>,
    pub livre_id: Option<i32>,
    #[validate(range(min = 0, max = 5, message = "must be between 0 and 5"))]
    pub note: Option<i32>,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub commentaire: Option<String>,
}

/// Update review request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAvis {
    #[validate(range(min = 0, max = 5, message = "must be between 0 and 5"))]
    pub note: Option<i32>,
    #[validate(length(max = 5000, message = "must be at most 5000 characters"))]
    pub commentaire: Option<String>,
}

/// Review list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AvisQuery {
    /// Exact match on the rating
    pub note: Option<i32>,
    /// Substring match on the comment
    pub commentaire: Option<String>,
    /// Substring match on the related book's title
    pub livre_titre: Option<String>,
    /// Exact match on the owning member id
    pub membre: Option<i32>,
    /// Sort field, `-` prefix for descending (note, livre_titre)
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn note_is_bounded() {
        let avis = CreateAvis {
            membre_id: None,
            livre_id: Some(1),
            note: Some(6),
            commentaire: None,
        };
        assert!(avis.validate().is_err());

        let avis = CreateAvis {
            membre_id: None,
            livre_id: Some(1),
            note: Some(5),
            commentaire: Some("excellent".to_string()),
        };
        assert!(avis.validate().is_ok());
    }

    #[test]
    fn commentaire_is_capped() {
        let avis = CreateAvis {
            membre_id: None,
            livre_id: Some(1),
            note: Some(3),
            commentaire: Some("x".repeat(5001)),
        };
        assert!(avis.validate().is_err());
    }
}
