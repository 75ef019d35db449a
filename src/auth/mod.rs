mod manager;
mod persistence;
mod store;
pub mod token;

pub use manager::*;
pub use persistence::{KeyPersistence, TomlKeyFile};
pub use store::CredentialStore;
pub use token::{Claims, TokenError};
