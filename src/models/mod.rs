//! Data models for the Biblio server

pub mod auteur;
pub mod avis;
pub mod categorie;
pub mod emprunt;
pub mod livre;
pub mod membre;
pub mod user;

// Re-export commonly used types
pub use auteur::Auteur;
pub use avis::Avis;
pub use categorie::Categorie;
pub use emprunt::Emprunt;
pub use livre::{Livre, LivreShort};
pub use membre::{Membre, MembreShort};
pub use user::{Role, User, UserClaims, UserPublic};
