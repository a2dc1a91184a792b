//! Error taxonomy for the bootstrap layer.
//!
//! Everything here propagates unhandled to the top-level bootstrap caller;
//! nothing is retried automatically. The embedding application logs the
//! error and presents a failure state instead of mounting the view.

use thiserror::Error;

use crate::loader::{AttachState, LoaderError};
use crate::token::TokenKind;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// A fatal bootstrap failure.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The identity flow rejected the silent request and the interactive
    /// fallback also failed. Surfaced to the user, never retried.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A joined-member event lacked a display name. Fatal for that event
    /// only; the member is dropped from the presence list and the session
    /// continues.
    #[error("member record for user {0:?} has no display name")]
    MalformedMemberRecord(String),

    /// Attach was attempted on a handle that is not detached. This is a
    /// bootstrap ordering bug, not a runtime condition, and must fail fast.
    #[error("cannot attach container: handle is {state:?}, not detached")]
    AttachStateViolation {
        /// The attach state the handle was actually in.
        state: AttachState,
    },

    /// The join path's identifier did not resolve to an existing document
    /// (bad or expired link, deleted document, permission denial).
    #[error("could not resolve board document: {0}")]
    ResolveFailed(String),

    /// The framework returned no resolved identifier after attach. Without
    /// it the document can be neither shared nor reloaded.
    #[error("attached container returned no resolved identifier")]
    ResolvedUrlMissing,

    /// A fetch adapter found no cached token even after a refresh completed.
    /// Indicates a service-contract violation in the identity flow.
    #[error("no {0} token available after refresh")]
    TokenUnavailable(TokenKind),

    /// A collaboration-framework loader failure outside the cases above.
    #[error(transparent)]
    Loader(#[from] LoaderError),
}
