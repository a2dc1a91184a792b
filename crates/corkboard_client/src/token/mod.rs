//! Token cache and the fetch adapters the collaboration framework consumes.
//!
//! The identity flow populates the cache with one bearer token per downstream
//! service (storage and real-time messaging); the framework's document-service
//! factory pulls them back out through [`TokenProvider::fetch_storage_token`]
//! and [`TokenProvider::fetch_messaging_token`].

mod cache;
mod identity;
mod provider;

pub use cache::{TokenCache, TokenKind, TokenRecord};
pub use identity::{AuthBundle, AuthMode, IdentityError, IdentityFlow};
pub use provider::{TokenFetchRequest, TokenProvider, TokenResponse};
