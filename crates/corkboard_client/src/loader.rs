//! Collaboration-framework seam.
//!
//! The external framework owns document replay, operation merging, and the
//! attach/connection lifecycle internals. This crate talks to it through two
//! traits: [`ContainerLoader`] (produce a handle, detached or resolved) and
//! [`DocumentHandle`] (one live, shared, synchronized document). Test fakes
//! and the embedding application's real driver both implement them.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::watch;

use crate::audience::RawClientRecord;

/// Attachment state of a document handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachState {
    /// Local-only; nothing durably stored yet.
    Detached,
    /// Attach in flight.
    Attaching,
    /// Durably stored and shareable.
    Attached,
}

/// Connection state of a document handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to the service.
    Disconnected,
    /// Connection in flight.
    Connecting,
    /// Live and receiving operations.
    Connected,
    /// Graceful teardown in flight.
    Disconnecting,
}

/// Kinds of initial shared objects a new document can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedObjectKind {
    /// A keyed map of JSON-ish values.
    Map,
    /// A hierarchical directory of maps.
    Directory,
    /// A collaborative text sequence.
    Text,
}

/// Named initial shared objects for a new document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerSchema {
    /// Shared objects created with the document, in declaration order.
    pub initial_objects: IndexMap<String, SharedObjectKind>,
}

/// Everything the storage driver needs to create a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateContainerRequest {
    /// Site the document is created under.
    pub site_url: String,
    /// Drive within the site.
    pub drive_id: String,
    /// Folder path within the drive.
    pub folder_path: String,
    /// File name of the new document.
    pub document_name: String,
}

/// Request to resolve an existing document by its sharing link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Full sharing URL of the document.
    pub url: String,
}

/// Identifiers of an attached document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContainer {
    /// Framework-level container id.
    pub container_id: String,
    /// Storage-backend item id.
    pub item_id: String,
    /// Full sharing URL other clients can resolve.
    pub sharing_url: String,
}

/// A membership change in the document's session audience.
#[derive(Debug, Clone)]
pub enum MembershipEvent {
    /// A client connection joined the session.
    Joined {
        /// Raw, service-specific user record carried by the event.
        record: RawClientRecord,
        /// Connection that joined (one user may hold several).
        connection_id: String,
    },
    /// A client connection left the session.
    Left {
        /// User the connection belonged to.
        user_id: String,
        /// Connection that left.
        connection_id: String,
    },
}

/// Callback for membership events. One callback at a time; setting a new
/// one replaces the previous.
pub type MembershipCallback = Arc<dyn Fn(MembershipEvent) + Send + Sync>;

/// Failures surfaced by the framework loader and driver.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The request descriptor did not resolve to an existing document.
    #[error("resolve failed: {0}")]
    ResolveFailed(String),
    /// The create/attach network operation failed.
    #[error("attach failed: {0}")]
    AttachFailed(String),
    /// The service connection dropped mid-operation.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

/// One live collaboration document.
#[async_trait]
pub trait DocumentHandle: Send + Sync {
    /// Current attachment state.
    fn attach_state(&self) -> AttachState;

    /// Current connection state.
    fn connection_state(&self) -> ConnectionState;

    /// Submit the create request, transitioning the document from local-only
    /// to durably stored.
    ///
    /// This is the raw framework operation; the detached-state precondition
    /// is enforced by [`crate::container::BoardContainer::attach`], not here.
    async fn attach(&self, request: &CreateContainerRequest) -> Result<(), LoaderError>;

    /// Resolved identifiers, present once the document is attached.
    fn resolved(&self) -> Option<ResolvedContainer>;

    /// Watch connection-state transitions. The receiver's current value is
    /// the present state, so subscribers cannot miss a transition that
    /// happened just before they subscribed.
    fn connection_changes(&self) -> watch::Receiver<ConnectionState>;

    /// Register the membership-event callback for this handle.
    fn set_on_membership(&self, callback: MembershipCallback);
}

/// The framework's loader: produces document handles.
#[async_trait]
pub trait ContainerLoader: Send + Sync {
    /// Create a new document in the [`AttachState::Detached`] state.
    async fn create_detached(
        &self,
        schema: &ContainerSchema,
    ) -> Result<Arc<dyn DocumentHandle>, LoaderError>;

    /// Resolve an existing document directly into an attached handle.
    async fn resolve(
        &self,
        request: &ResolveRequest,
    ) -> Result<Arc<dyn DocumentHandle>, LoaderError>;
}
