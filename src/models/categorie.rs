//! Category (categorie) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Full category model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Categorie {
    pub id: i32,
    pub nom: Option<String>,
    pub description: Option<String>,
}

/// Create category request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategorie {
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub nom: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub description: Option<String>,
}

/// Update category request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategorie {
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub nom: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub description: Option<String>,
}

/// Category list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CategorieQuery {
    pub nom: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn nom_and_description_length_bounds() {
        let categorie = CreateCategorie {
            nom: Some("x".repeat(256)),
            description: Some("roman".to_string()),
        };
        assert!(categorie.validate().is_err());

        let categorie = CreateCategorie {
            nom: Some("policier".to_string()),
            description: Some("x".repeat(256)),
        };
        assert!(categorie.validate().is_err());

        let categorie = CreateCategorie {
            nom: Some("policier".to_string()),
            description: Some("roman".to_string()),
        };
        assert!(categorie.validate().is_ok());
    }
}
