//! Permission resolver
//!
//! Decides, per (actor, resource, action, target ownership), whether a
//! request is allowed. Rule names mirror the permission classes the API
//! documents in denial responses.

use crate::error::{AppError, PermissionContext};
use crate::models::user::Role;

/// The requesting actor, with its member record already resolved.
/// A missing member record is a plain fact here; membership checks
/// against it fail closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Authenticated {
        user_id: i32,
        role: Role,
        membre_id: Option<i32>,
    },
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Actor::Authenticated {
                role: Role::Admin,
                ..
            }
        )
    }

    pub fn user_id(&self) -> Option<i32> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated { user_id, .. } => Some(*user_id),
        }
    }

    pub fn membre_id(&self) -> Option<i32> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated { membre_id, .. } => *membre_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Livre,
    Auteur,
    Categorie,
    Membre,
    Emprunt,
    Avis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Action {
    fn is_read(&self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

/// Ownership facts about the target object, when there is one
#[derive(Debug, Clone, Copy, Default)]
pub struct Target {
    /// Book creator (user id)
    pub createur_id: Option<i32>,
    /// Owning member of a loan or review
    pub membre_id: Option<i32>,
}

/// Outcome of a policy decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// The actor must authenticate first
    RequireAuthentication,
    /// The actor is known but lacks rights; carries the rule names consulted
    Deny(Vec<&'static str>),
}

impl Decision {
    /// Convert into a handler result, attaching the request context to denials
    pub fn into_result(self, method: &str, path: &str) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::RequireAuthentication => {
                Err(AppError::Authentication("authentication required".to_string()))
            }
            Decision::Deny(rules) => Err(AppError::Forbidden(PermissionContext {
                method: method.to_string(),
                path: path.to_string(),
                permissions: rules.iter().map(|r| r.to_string()).collect(),
            })),
        }
    }
}

fn deny_or_login(actor: &Actor, rules: Vec<&'static str>) -> Decision {
    match actor {
        Actor::Anonymous => Decision::RequireAuthentication,
        Actor::Authenticated { .. } => Decision::Deny(rules),
    }
}

/// The policy table. Pure: no IO, no clock.
pub fn authorize(
    actor: &Actor,
    resource: Resource,
    action: Action,
    target: Option<&Target>,
) -> Decision {
    match resource {
        Resource::Livre => authorize_livre(actor, action, target),
        Resource::Auteur | Resource::Categorie | Resource::Membre => {
            // Admin-only resources, every verb
            if actor.is_admin() {
                Decision::Allow
            } else {
                deny_or_login(actor, vec!["IsAdminUser"])
            }
        }
        Resource::Emprunt => authorize_emprunt(actor, action, target),
        Resource::Avis => authorize_avis(actor, action, target),
    }
}

fn authorize_livre(actor: &Actor, action: Action, target: Option<&Target>) -> Decision {
    match action {
        // Books are world-readable
        Action::List | Action::Retrieve => Decision::Allow,
        Action::Create => match actor {
            Actor::Anonymous => Decision::RequireAuthentication,
            Actor::Authenticated { .. } => Decision::Allow,
        },
        Action::Update | Action::Delete => {
            let user_id = match actor.user_id() {
                Some(id) => id,
                None => return Decision::RequireAuthentication,
            };
            let createur = target.and_then(|t| t.createur_id);
            // Only the creator may modify a book; a book without a creator
            // is locked for everyone
            if createur == Some(user_id) {
                Decision::Allow
            } else {
                Decision::Deny(vec!["IsCreateurOrReadOnly"])
            }
        }
    }
}

fn authorize_emprunt(actor: &Actor, action: Action, target: Option<&Target>) -> Decision {
    match action {
        Action::List => match actor {
            Actor::Anonymous => Decision::RequireAuthentication,
            // Non-admin results are row-scoped to the caller's member id
            Actor::Authenticated { .. } => Decision::Allow,
        },
        Action::Retrieve => {
            if actor.is_admin() {
                return Decision::Allow;
            }
            owner_only(actor, target, vec!["IsAdminOrEmpruntBelongsToMember"])
        }
        Action::Create => {
            // Borrowing requires a registered member record, admins included
            match actor {
                Actor::Anonymous => Decision::RequireAuthentication,
                Actor::Authenticated { membre_id, .. } => {
                    if membre_id.is_some() {
                        Decision::Allow
                    } else {
                        Decision::Deny(vec!["IsRegisteredMembre"])
                    }
                }
            }
        }
        Action::Update => {
            if actor.is_admin() {
                Decision::Allow
            } else {
                deny_or_login(actor, vec!["IsAdminUser"])
            }
        }
        Action::Delete => {
            if actor.is_admin() {
                return Decision::Allow;
            }
            owner_only(actor, target, vec!["IsAdminOrEmpruntBelongsToMember"])
        }
    }
}

fn authorize_avis(actor: &Actor, action: Action, target: Option<&Target>) -> Decision {
    match action {
        Action::List => match actor {
            Actor::Anonymous => Decision::RequireAuthentication,
            Actor::Authenticated { .. } => Decision::Allow,
        },
        Action::Retrieve => {
            if actor.is_admin() {
                return Decision::Allow;
            }
            owner_only(actor, target, vec!["IsAdminOrAvisBelongsToMember"])
        }
        Action::Create => match actor {
            Actor::Anonymous => Decision::RequireAuthentication,
            Actor::Authenticated { membre_id, .. } => {
                if membre_id.is_some() {
                    Decision::Allow
                } else {
                    Decision::Deny(vec!["IsRegisteredMembre"])
                }
            }
        },
        Action::Update | Action::Delete => {
            if actor.is_admin() {
                return Decision::Allow;
            }
            owner_only(actor, target, vec!["IsAdminOrAvisBelongsToMember"])
        }
    }
}

/// Allow only when the caller's member record owns the target.
/// Both sides must be present: missing membership or ownerless targets deny.
fn owner_only(actor: &Actor, target: Option<&Target>, rules: Vec<&'static str>) -> Decision {
    match actor {
        Actor::Anonymous => Decision::RequireAuthentication,
        Actor::Authenticated { membre_id, .. } => {
            let owner = target.and_then(|t| t.membre_id);
            match (membre_id, owner) {
                (Some(mine), Some(theirs)) if *mine == theirs => Decision::Allow,
                _ => Decision::Deny(rules),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Actor {
        Actor::Authenticated {
            user_id: 1,
            role: Role::Admin,
            membre_id: Some(10),
        }
    }

    fn membre(user_id: i32, membre_id: i32) -> Actor {
        Actor::Authenticated {
            user_id,
            role: Role::Reader,
            membre_id: Some(membre_id),
        }
    }

    fn reader_without_membre(user_id: i32) -> Actor {
        Actor::Authenticated {
            user_id,
            role: Role::Reader,
            membre_id: None,
        }
    }

    #[test]
    fn livres_are_world_readable() {
        for action in [Action::List, Action::Retrieve] {
            assert_eq!(
                authorize(&Actor::Anonymous, Resource::Livre, action, None),
                Decision::Allow
            );
        }
    }

    #[test]
    fn livre_create_requires_authentication() {
        assert_eq!(
            authorize(&Actor::Anonymous, Resource::Livre, Action::Create, None),
            Decision::RequireAuthentication
        );
        assert_eq!(
            authorize(&reader_without_membre(2), Resource::Livre, Action::Create, None),
            Decision::Allow
        );
    }

    #[test]
    fn livre_writes_are_creator_only() {
        let target = Target {
            createur_id: Some(2),
            membre_id: None,
        };
        assert_eq!(
            authorize(&membre(2, 20), Resource::Livre, Action::Update, Some(&target)),
            Decision::Allow
        );
        // Even an admin is not the creator
        assert!(matches!(
            authorize(&admin(), Resource::Livre, Action::Delete, Some(&target)),
            Decision::Deny(_)
        ));
        // A book without a creator cannot be modified
        let orphan = Target::default();
        assert!(matches!(
            authorize(&membre(2, 20), Resource::Livre, Action::Update, Some(&orphan)),
            Decision::Deny(_)
        ));
    }

    #[test]
    fn auteurs_and_categories_are_admin_only() {
        for resource in [Resource::Auteur, Resource::Categorie, Resource::Membre] {
            for action in [
                Action::List,
                Action::Retrieve,
                Action::Create,
                Action::Update,
                Action::Delete,
            ] {
                assert_eq!(authorize(&admin(), resource, action, None), Decision::Allow);
                assert!(matches!(
                    authorize(&membre(2, 20), resource, action, None),
                    Decision::Deny(_)
                ));
                assert_eq!(
                    authorize(&Actor::Anonymous, resource, action, None),
                    Decision::RequireAuthentication
                );
            }
        }
    }

    #[test]
    fn emprunt_reads_are_scoped() {
        assert_eq!(
            authorize(&Actor::Anonymous, Resource::Emprunt, Action::List, None),
            Decision::RequireAuthentication
        );
        let own = Target {
            createur_id: None,
            membre_id: Some(20),
        };
        assert_eq!(
            authorize(&membre(2, 20), Resource::Emprunt, Action::Retrieve, Some(&own)),
            Decision::Allow
        );
        let other = Target {
            createur_id: None,
            membre_id: Some(21),
        };
        assert!(matches!(
            authorize(&membre(2, 20), Resource::Emprunt, Action::Retrieve, Some(&other)),
            Decision::Deny(_)
        ));
        assert_eq!(
            authorize(&admin(), Resource::Emprunt, Action::Retrieve, Some(&other)),
            Decision::Allow
        );
    }

    #[test]
    fn emprunt_create_requires_membership() {
        assert_eq!(
            authorize(&membre(2, 20), Resource::Emprunt, Action::Create, None),
            Decision::Allow
        );
        // Fails closed when the actor has no member record
        assert!(matches!(
            authorize(&reader_without_membre(2), Resource::Emprunt, Action::Create, None),
            Decision::Deny(_)
        ));
    }

    #[test]
    fn emprunt_update_is_admin_only_but_delete_allows_owner() {
        let own = Target {
            createur_id: None,
            membre_id: Some(20),
        };
        assert!(matches!(
            authorize(&membre(2, 20), Resource::Emprunt, Action::Update, Some(&own)),
            Decision::Deny(_)
        ));
        assert_eq!(
            authorize(&membre(2, 20), Resource::Emprunt, Action::Delete, Some(&own)),
            Decision::Allow
        );
        let other = Target {
            createur_id: None,
            membre_id: Some(21),
        };
        assert!(matches!(
            authorize(&membre(2, 20), Resource::Emprunt, Action::Delete, Some(&other)),
            Decision::Deny(_)
        ));
        assert_eq!(
            authorize(&admin(), Resource::Emprunt, Action::Update, Some(&other)),
            Decision::Allow
        );
    }

    #[test]
    fn avis_ownership_rules() {
        let own = Target {
            createur_id: None,
            membre_id: Some(20),
        };
        let other = Target {
            createur_id: None,
            membre_id: Some(21),
        };
        assert_eq!(
            authorize(&membre(2, 20), Resource::Avis, Action::Update, Some(&own)),
            Decision::Allow
        );
        assert!(matches!(
            authorize(&membre(2, 20), Resource::Avis, Action::Delete, Some(&other)),
            Decision::Deny(_)
        ));
        assert_eq!(
            authorize(&admin(), Resource::Avis, Action::Delete, Some(&other)),
            Decision::Allow
        );
        assert!(matches!(
            authorize(&reader_without_membre(2), Resource::Avis, Action::Create, None),
            Decision::Deny(_)
        ));
    }

    #[test]
    fn denial_carries_request_context() {
        let decision = authorize(&membre(2, 20), Resource::Membre, Action::List, None);
        let err = decision.into_result("GET", "/api/v1/membres").unwrap_err();
        match err {
            AppError::Forbidden(context) => {
                assert_eq!(context.method, "GET");
                assert_eq!(context.path, "/api/v1/membres");
                assert_eq!(context.permissions, vec!["IsAdminUser".to_string()]);
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }
}
