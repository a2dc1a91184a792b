//! Identity-provider seam.
//!
//! The actual token-acquisition protocol (popup login, silent refresh,
//! scope negotiation) lives in the embedding application. This crate only
//! needs one operation and one signal: "authenticate, possibly prompting",
//! and "silent acquisition won't do, ask interactively".

use async_trait::async_trait;
use thiserror::Error;

/// Whether the identity flow may prompt the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Acquire tokens without user interaction. May fail with
    /// [`IdentityError::InteractionRequired`].
    Silent,
    /// Acquire tokens through an interactive prompt. Unbounded wait; no
    /// timeout is enforced by this crate.
    Interactive,
}

/// Everything one successful authentication yields.
#[derive(Debug, Clone)]
pub struct AuthBundle {
    /// Bearer token for the document-storage backend.
    pub storage_token: String,
    /// Bearer token for the real-time messaging service.
    pub messaging_token: String,
    /// Bearer token for the directory/profile API.
    pub graph_token: String,
    /// Display name of the signed-in user.
    pub user_name: String,
}

/// Identity-flow failures.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Silent acquisition is not possible; the caller should repeat the
    /// same call with [`AuthMode::Interactive`].
    #[error("user interaction required to acquire tokens")]
    InteractionRequired,

    /// The provider rejected the request. Terminal for this session.
    #[error("identity provider rejected the request: {0}")]
    Rejected(String),
}

/// The external identity flow.
#[async_trait]
pub trait IdentityFlow: Send + Sync {
    /// Run one authentication in the given mode.
    ///
    /// Interactive calls suspend until the user completes or abandons the
    /// prompt.
    async fn authenticate(&self, mode: AuthMode) -> Result<AuthBundle, IdentityError>;
}
