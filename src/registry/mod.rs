mod files;
mod index;
pub mod models;
pub mod naming;
pub mod token;

pub use index::{Registry, RegistryError};
pub use models::FileRecord;
pub use token::{RandomTokens, TokenError, TokenSource};
