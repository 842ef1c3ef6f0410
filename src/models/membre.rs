//! Member (membre) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::user::UserPublic;

/// Full member model from database. One-to-one with a user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Membre {
    pub id: i32,
    pub user_id: i32,
    pub adresse: Option<String>,
    pub telephone: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub user: Option<UserPublic>,
}

/// Short member representation embedded in loan and review payloads
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MembreShort {
    pub id: i32,
    pub adresse: Option<String>,
    pub telephone: Option<String>,
}

/// Create member request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMembre {
    pub user_id: i32,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub adresse: Option<String>,
    #[validate(length(max = 10, message = "must be at most 10 characters"))]
    pub telephone: Option<String>,
}

/// Update member request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMembre {
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub adresse: Option<String>,
    #[validate(length(max = 10, message = "must be at most 10 characters"))]
    pub telephone: Option<String>,
}

/// Member list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct MembreQuery {
    /// Substring match on the linked user's last name
    pub nom: Option<String>,
    /// Substring match on the linked user's first name
    pub prenom: Option<String>,
    /// Substring match on the address
    pub adresse: Option<String>,
    pub telephone: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn telephone_is_capped_at_ten_characters() {
        let membre = CreateMembre {
            user_id: 1,
            adresse: Some("3 rue des Lilas".to_string()),
            telephone: Some("01234567890".to_string()),
        };
        assert!(membre.validate().is_err());

        let membre = CreateMembre {
            user_id: 1,
            adresse: Some("3 rue des Lilas".to_string()),
            telephone: Some("0123456789".to_string()),
        };
        assert!(membre.validate().is_ok());
    }
}
