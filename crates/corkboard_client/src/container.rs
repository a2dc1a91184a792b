//! Checked wrapper over a framework document handle.
//!
//! The framework performs the attach itself but does not enforce the
//! contract around it; that lives here: attach only from the detached
//! state, and an attached document must come back with a resolved
//! identifier or it can never be shared or reloaded.

use std::sync::Arc;

use crate::error::{BootstrapError, Result};
use crate::loader::{
    AttachState, ConnectionState, CreateContainerRequest, DocumentHandle, LoaderError,
    ResolvedContainer,
};

/// One live board document, with the bootstrap's contract checks applied.
pub struct BoardContainer {
    handle: Arc<dyn DocumentHandle>,
}

impl std::fmt::Debug for BoardContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardContainer").finish_non_exhaustive()
    }
}

impl BoardContainer {
    /// Wrap a handle produced by the framework loader.
    pub fn new(handle: Arc<dyn DocumentHandle>) -> Self {
        Self { handle }
    }

    /// The underlying framework handle, shared with the view layer.
    pub fn handle(&self) -> &Arc<dyn DocumentHandle> {
        &self.handle
    }

    /// Current attachment state.
    pub fn attach_state(&self) -> AttachState {
        self.handle.attach_state()
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.handle.connection_state()
    }

    /// Attach a detached document by submitting its create request.
    ///
    /// Fails fast with [`BootstrapError::AttachStateViolation`] when the
    /// handle is not detached; that is a bootstrap ordering bug and the
    /// handle's state is left untouched. After a successful attach the
    /// framework must report resolved identifiers, otherwise
    /// [`BootstrapError::ResolvedUrlMissing`].
    pub async fn attach(&self, request: &CreateContainerRequest) -> Result<ResolvedContainer> {
        let state = self.handle.attach_state();
        if state != AttachState::Detached {
            return Err(BootstrapError::AttachStateViolation { state });
        }
        self.handle.attach(request).await?;
        self.handle
            .resolved()
            .ok_or(BootstrapError::ResolvedUrlMissing)
    }

    /// Wait until the document reports [`ConnectionState::Connected`].
    ///
    /// One-shot event subscription, not a poll: returns immediately when
    /// already connected, otherwise suspends on the handle's state channel.
    /// The view shell awaits this before first render.
    pub async fn connected(&self) -> Result<()> {
        let mut changes = self.handle.connection_changes();
        changes
            .wait_for(|state| *state == ConnectionState::Connected)
            .await
            .map_err(|_| {
                BootstrapError::Loader(LoaderError::ConnectionLost(
                    "connection state channel closed before connect".into(),
                ))
            })?;
        Ok(())
    }
}
