//! Container bootstrap: create or join the shared board document.
//!
//! One page load runs [`BoardBootstrap::run`] exactly once. It primes the
//! token provider, reads the page fragment to decide between the create and
//! join paths, drives the framework loader to a live attached handle, and
//! derives the [`BoardServices`] façade the view layer consumes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use url::Url;
use uuid::Uuid;

use crate::audience::Audience;
use crate::container::BoardContainer;
use crate::error::{BootstrapError, Result};
use crate::loader::{
    ContainerLoader, ContainerSchema, CreateContainerRequest, ResolveRequest, ResolvedContainer,
};
use crate::token::TokenProvider;

/// Client-local persistent map seam.
///
/// Remembers the mapping from a short item identifier to a full sharing
/// link across reloads. Nothing else is ever stored here.
pub trait LinkStore: Send + Sync {
    /// The stored sharing link for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Store or overwrite the sharing link for `key`.
    fn set(&self, key: &str, value: &str);
}

/// In-memory [`LinkStore`] for tests and embeddings without local storage.
#[derive(Default)]
pub struct MemoryLinkStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLinkStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinkStore for MemoryLinkStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

/// Addressable page-location seam.
///
/// Read once at startup to decide create-vs-join; written after create so a
/// reload or shared link reaches the join path.
pub trait PageLocation: Send + Sync {
    /// Current fragment, with or without its leading `#`.
    fn fragment(&self) -> String;
    /// Replace the fragment.
    fn set_fragment(&self, fragment: &str);
}

/// In-memory [`PageLocation`] for tests and non-browser embeddings.
#[derive(Default)]
pub struct MemoryPageLocation {
    fragment: Mutex<String>,
}

impl MemoryPageLocation {
    /// Create a location with an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a location whose fragment is already set.
    pub fn with_fragment(fragment: &str) -> Self {
        Self {
            fragment: Mutex::new(fragment.to_string()),
        }
    }
}

impl PageLocation for MemoryPageLocation {
    fn fragment(&self) -> String {
        self.fragment.lock().unwrap().clone()
    }

    fn set_fragment(&self, fragment: &str) {
        *self.fragment.lock().unwrap() = fragment.to_string();
    }
}

/// Fixed site/drive configuration for new documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Site URL representing the storage resource location.
    pub site_url: String,
    /// Drive id of the tenant where documents are created.
    pub drive_id: String,
    /// Folder the board documents live under.
    pub folder_path: String,
}

/// Everything needed to create one new document. Immutable once built and
/// owned by the bootstrap for the duration of one container's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Site URL representing the storage resource location.
    pub site_url: String,
    /// Drive id of the tenant where documents are created.
    pub drive_id: String,
    /// Folder the board documents live under.
    pub folder_path: String,
    /// Freshly generated unique name for the new document.
    pub document_name: String,
}

impl ConnectionConfig {
    /// Build a config for a new document with a freshly generated name.
    pub fn for_new_document(site: &SiteConfig) -> Self {
        Self {
            site_url: site.site_url.clone(),
            drive_id: site.drive_id.clone(),
            folder_path: site.folder_path.clone(),
            document_name: Uuid::new_v4().to_string(),
        }
    }

    /// The driver-level create request for this document.
    pub fn create_request(&self) -> CreateContainerRequest {
        CreateContainerRequest {
            site_url: self.site_url.clone(),
            drive_id: self.drive_id.clone(),
            folder_path: self.folder_path.clone(),
            document_name: self.document_name.clone(),
        }
    }
}

/// The create-vs-join decision. Made once per page load, never re-evaluated,
/// and never retried on the other path after a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapPath {
    /// No fragment: create a new board document.
    Create,
    /// Fragment present: join an existing document via its sharing link.
    Join {
        /// The sharing URL to resolve.
        sharing_url: String,
    },
}

/// Decide the bootstrap path from the page fragment and the link store.
///
/// An empty fragment means create. Otherwise the fragment is an item id to
/// look up in the store; when the store has no mapping (a link shared to a
/// client that never created the board), the fragment itself is taken as
/// the sharing link.
pub fn decide_path(fragment: &str, links: &dyn LinkStore) -> BootstrapPath {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    if fragment.is_empty() {
        return BootstrapPath::Create;
    }
    let sharing_url = links
        .get(fragment)
        .unwrap_or_else(|| fragment.to_string());
    BootstrapPath::Join { sharing_url }
}

/// Extract the storage item id from a sharing URL's `itemId` query
/// parameter.
fn item_id_from_sharing_url(sharing_url: &str) -> Option<String> {
    let parsed = Url::parse(sharing_url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "itemId")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

/// Service façade handed to the view layer.
///
/// An immutable view over the identifiers captured when the document was
/// created or resolved, plus the audience bound to the handle's membership
/// stream.
pub struct BoardServices {
    resolved: ResolvedContainer,
    item_id: String,
    /// Audience of this document session.
    pub audience: Arc<Audience>,
}

impl std::fmt::Debug for BoardServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardServices")
            .field("resolved", &self.resolved)
            .field("item_id", &self.item_id)
            .finish_non_exhaustive()
    }
}

impl BoardServices {
    fn new(resolved: ResolvedContainer, audience: Arc<Audience>) -> Result<Self> {
        // Some driver variants leave item_id empty and only encode it in the
        // sharing URL; either source will do, but one of them must have it.
        let item_id = if !resolved.item_id.is_empty() {
            resolved.item_id.clone()
        } else {
            item_id_from_sharing_url(&resolved.sharing_url)
                .ok_or(BootstrapError::ResolvedUrlMissing)?
        };
        Ok(Self {
            resolved,
            item_id,
            audience,
        })
    }

    /// Full sharing URL other clients can use to join.
    pub fn sharing_url(&self) -> &str {
        &self.resolved.sharing_url
    }

    /// Storage-backend item id of the document.
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    /// Framework-level container id of the document.
    pub fn container_id(&self) -> &str {
        &self.resolved.container_id
    }
}

/// Result of one bootstrap run.
#[derive(Debug)]
pub struct BootstrapOutcome {
    /// The live, attached board document.
    pub container: BoardContainer,
    /// Façade over the document's identifiers and audience.
    pub services: BoardServices,
    /// Whether this run created the document (vs. joined an existing one).
    pub created: bool,
}

/// The bootstrap orchestrator.
pub struct BoardBootstrap {
    site: SiteConfig,
    schema: ContainerSchema,
    loader: Arc<dyn ContainerLoader>,
    tokens: Arc<TokenProvider>,
    links: Arc<dyn LinkStore>,
    location: Arc<dyn PageLocation>,
}

impl BoardBootstrap {
    /// Wire a bootstrap from its collaborators.
    pub fn new(
        site: SiteConfig,
        schema: ContainerSchema,
        loader: Arc<dyn ContainerLoader>,
        tokens: Arc<TokenProvider>,
        links: Arc<dyn LinkStore>,
        location: Arc<dyn PageLocation>,
    ) -> Self {
        Self {
            site,
            schema,
            loader,
            tokens,
            links,
            location,
        }
    }

    /// Create or join the board document for this page load.
    ///
    /// Any error aborts the sequence before the view mounts; nothing is
    /// retried and a half-created document is not rolled back.
    pub async fn run(&self) -> Result<BootstrapOutcome> {
        // Tokens must be obtainable before the loader's first network call;
        // this is also where an interactive login happens, if one is needed.
        self.tokens.prime().await?;

        match decide_path(&self.location.fragment(), self.links.as_ref()) {
            BootstrapPath::Create => self.create_board().await,
            BootstrapPath::Join { sharing_url } => self.join_board(&sharing_url).await,
        }
    }

    async fn create_board(&self) -> Result<BootstrapOutcome> {
        let config = ConnectionConfig::for_new_document(&self.site);
        let request = config.create_request();
        log::info!(
            "[Bootstrap] Creating board document {}",
            config.document_name
        );

        let handle = self.loader.create_detached(&self.schema).await?;
        let container = BoardContainer::new(handle);
        let resolved = container.attach(&request).await?;

        let audience = Audience::bind(container.handle().as_ref());
        let services = BoardServices::new(resolved, audience)?;

        // Make the new document reachable by reload or shared link.
        self.links.set(services.item_id(), services.sharing_url());
        self.location.set_fragment(services.item_id());
        log::info!("[Bootstrap] Board created, item id {}", services.item_id());

        Ok(BootstrapOutcome {
            container,
            services,
            created: true,
        })
    }

    async fn join_board(&self, sharing_url: &str) -> Result<BootstrapOutcome> {
        log::info!("[Bootstrap] Joining board via sharing link");
        let request = ResolveRequest {
            url: sharing_url.to_string(),
        };
        let handle = self
            .loader
            .resolve(&request)
            .await
            .map_err(|e| BootstrapError::ResolveFailed(e.to_string()))?;

        let container = BoardContainer::new(handle);
        let resolved = container
            .handle()
            .resolved()
            .ok_or(BootstrapError::ResolvedUrlMissing)?;

        let audience = Audience::bind(container.handle().as_ref());
        let services = BoardServices::new(resolved, audience)?;

        Ok(BootstrapOutcome {
            container,
            services,
            created: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fragment_means_create() {
        let links = MemoryLinkStore::new();
        assert_eq!(decide_path("", &links), BootstrapPath::Create);
        assert_eq!(decide_path("#", &links), BootstrapPath::Create);
    }

    #[test]
    fn test_mapped_fragment_joins_with_stored_link() {
        let links = MemoryLinkStore::new();
        links.set("abc123", "https://contoso.sharepoint.com/share?itemId=abc123");
        assert_eq!(
            decide_path("#abc123", &links),
            BootstrapPath::Join {
                sharing_url: "https://contoso.sharepoint.com/share?itemId=abc123".to_string()
            }
        );
    }

    #[test]
    fn test_unmapped_fragment_is_taken_as_the_link_itself() {
        let links = MemoryLinkStore::new();
        assert_eq!(
            decide_path("#https://contoso.sharepoint.com/share?itemId=xyz", &links),
            BootstrapPath::Join {
                sharing_url: "https://contoso.sharepoint.com/share?itemId=xyz".to_string()
            }
        );
    }

    #[test]
    fn test_item_id_extraction_from_sharing_url() {
        assert_eq!(
            item_id_from_sharing_url("https://contoso.sharepoint.com/share?driveId=d1&itemId=item42"),
            Some("item42".to_string())
        );
        assert_eq!(
            item_id_from_sharing_url("https://contoso.sharepoint.com/share?driveId=d1"),
            None
        );
        assert_eq!(item_id_from_sharing_url("not a url"), None);
    }

    #[test]
    fn test_new_document_names_are_unique() {
        let site = SiteConfig {
            site_url: "https://contoso.sharepoint.com/sites/board".into(),
            drive_id: "drive-1".into(),
            folder_path: "corkboard".into(),
        };
        let first = ConnectionConfig::for_new_document(&site);
        let second = ConnectionConfig::for_new_document(&site);
        assert_ne!(first.document_name, second.document_name);
        assert_eq!(first.site_url, second.site_url);
    }

    #[test]
    fn test_services_fall_back_to_url_item_id() {
        let resolved = ResolvedContainer {
            container_id: "c1".into(),
            item_id: String::new(),
            sharing_url: "https://contoso.sharepoint.com/share?itemId=item-9".into(),
        };
        let services = BoardServices::new(resolved, Arc::new(Audience::default())).unwrap();
        assert_eq!(services.item_id(), "item-9");
    }

    #[test]
    fn test_services_without_any_item_id_fail() {
        let resolved = ResolvedContainer {
            container_id: "c1".into(),
            item_id: String::new(),
            sharing_url: "https://contoso.sharepoint.com/share".into(),
        };
        let err = BoardServices::new(resolved, Arc::new(Audience::default())).unwrap_err();
        assert!(matches!(err, BootstrapError::ResolvedUrlMissing));
    }
}
