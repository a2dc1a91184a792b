//! Token fetch adapters.
//!
//! These satisfy the collaboration framework's token-provider contract: one
//! fetch function per downstream service, each returning the token string
//! plus a metadata echo of the request. On a cache miss the identity flow is
//! run once (silent first, interactively when the provider asks for it) and
//! populates both cache entries, so the usual sequence is one login followed
//! by cache hits for the rest of the session.

use std::sync::Arc;

use crate::error::{BootstrapError, Result};

use super::cache::{TokenCache, TokenKind, TokenRecord};
use super::identity::{AuthMode, IdentityError, IdentityFlow};

/// What the framework tells us about the token it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFetchRequest {
    /// Site the token will be presented to.
    pub site_url: String,
    /// Item the request is scoped to, when already known.
    pub item_id: Option<String>,
    /// Whether the framework believes the current token is stale.
    pub refresh: bool,
}

/// The shape the framework expects back from a token fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// The bearer token string.
    pub token: String,
    /// Echo of the requested site.
    pub site_url: String,
    /// Whether this fetch ran the identity flow (vs. a plain cache hit).
    pub refreshed: bool,
}

/// Cache-backed token provider for the two downstream services.
///
/// Performs no retry of its own: when the identity flow fails, the fetch
/// fails and the framework's document-service factory surfaces a connection
/// failure upward.
pub struct TokenProvider {
    cache: Arc<TokenCache>,
    identity: Arc<dyn IdentityFlow>,
    // Single-flight guard: concurrent cache misses must not each run the
    // identity flow (which may pop an interactive prompt).
    refresh_lock: tokio::sync::Mutex<()>,
}

impl TokenProvider {
    /// Create a provider over an injected cache and identity flow.
    pub fn new(cache: Arc<TokenCache>, identity: Arc<dyn IdentityFlow>) -> Self {
        Self {
            cache,
            identity,
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The cache this provider reads and refreshes.
    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    /// Make sure valid tokens are obtainable before the framework performs
    /// its first network operation.
    ///
    /// The bootstrap calls this ahead of any resolve/attach so an
    /// interactive login cannot end up interleaved with a network call.
    pub async fn prime(&self) -> Result<()> {
        self.token_for(TokenKind::Storage, false).await?;
        Ok(())
    }

    /// Fetch the storage-service token.
    pub async fn fetch_storage_token(&self, request: &TokenFetchRequest) -> Result<TokenResponse> {
        self.fetch(TokenKind::Storage, request).await
    }

    /// Fetch the messaging-service token.
    pub async fn fetch_messaging_token(
        &self,
        request: &TokenFetchRequest,
    ) -> Result<TokenResponse> {
        self.fetch(TokenKind::Messaging, request).await
    }

    async fn fetch(&self, kind: TokenKind, request: &TokenFetchRequest) -> Result<TokenResponse> {
        let had_token = self.cache.contains(kind);
        let record = self.token_for(kind, request.refresh).await?;
        Ok(TokenResponse {
            token: record.value,
            site_url: request.site_url.clone(),
            refreshed: request.refresh || !had_token,
        })
    }

    async fn token_for(&self, kind: TokenKind, force_refresh: bool) -> Result<TokenRecord> {
        if !force_refresh {
            if let Some(record) = self.cache.get(kind) {
                return Ok(record);
            }
        }

        let _guard = self.refresh_lock.lock().await;
        // A concurrent fetch may have refreshed while we waited on the lock.
        if !force_refresh {
            if let Some(record) = self.cache.get(kind) {
                return Ok(record);
            }
        }

        self.refresh().await?;
        self.cache
            .get(kind)
            .ok_or(BootstrapError::TokenUnavailable(kind))
    }

    /// Run the identity flow once and populate both cache entries.
    async fn refresh(&self) -> Result<()> {
        let bundle = match self.identity.authenticate(AuthMode::Silent).await {
            Ok(bundle) => bundle,
            Err(IdentityError::InteractionRequired) => {
                log::info!("[TokenProvider] Silent auth requires interaction, prompting");
                self.identity
                    .authenticate(AuthMode::Interactive)
                    .await
                    .map_err(|e| BootstrapError::AuthenticationFailed(e.to_string()))?
            }
            Err(e) => return Err(BootstrapError::AuthenticationFailed(e.to_string())),
        };

        log::debug!(
            "[TokenProvider] Tokens refreshed for user {}",
            bundle.user_name
        );
        self.cache.set(TokenKind::Storage, bundle.storage_token);
        self.cache.set(TokenKind::Messaging, bundle.messaging_token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::token::AuthBundle;

    struct CountingIdentity {
        calls: AtomicUsize,
        silent_fails_with: Option<fn() -> IdentityError>,
        interactive_fails: bool,
    }

    impl CountingIdentity {
        fn succeeding() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                silent_fails_with: None,
                interactive_fails: false,
            }
        }
    }

    #[async_trait]
    impl IdentityFlow for CountingIdentity {
        async fn authenticate(&self, mode: AuthMode) -> std::result::Result<AuthBundle, IdentityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if mode == AuthMode::Silent {
                if let Some(make_error) = self.silent_fails_with {
                    return Err(make_error());
                }
            } else if self.interactive_fails {
                return Err(IdentityError::Rejected("user closed the prompt".into()));
            }
            Ok(AuthBundle {
                storage_token: "sp-token".into(),
                messaging_token: "push-token".into(),
                graph_token: "graph-token".into(),
                user_name: "Test User".into(),
            })
        }
    }

    fn request() -> TokenFetchRequest {
        TokenFetchRequest {
            site_url: "https://contoso.sharepoint.com/sites/board".into(),
            item_id: None,
            refresh: false,
        }
    }

    fn provider(identity: CountingIdentity) -> TokenProvider {
        TokenProvider::new(Arc::new(TokenCache::new()), Arc::new(identity))
    }

    #[tokio::test]
    async fn test_miss_runs_identity_flow_and_fills_both_kinds() {
        let provider = provider(CountingIdentity::succeeding());
        let response = provider.fetch_storage_token(&request()).await.unwrap();
        assert_eq!(response.token, "sp-token");
        assert!(response.refreshed);
        assert_eq!(response.site_url, request().site_url);
        // One login filled the messaging slot too.
        assert!(provider.cache().contains(TokenKind::Messaging));
    }

    #[tokio::test]
    async fn test_second_fetch_is_a_cache_hit() {
        let identity = Arc::new(CountingIdentity::succeeding());
        let provider = TokenProvider::new(Arc::new(TokenCache::new()), identity.clone());
        provider.fetch_storage_token(&request()).await.unwrap();
        let response = provider.fetch_messaging_token(&request()).await.unwrap();
        assert_eq!(response.token, "push-token");
        assert!(!response.refreshed);
        // Only the first fetch authenticated.
        assert_eq!(identity.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_invoke_identity_once() {
        let identity = Arc::new(CountingIdentity::succeeding());
        let provider = TokenProvider::new(Arc::new(TokenCache::new()), identity.clone());
        let storage_request = request();
        let messaging_request = request();
        let (storage, messaging) = tokio::join!(
            provider.fetch_storage_token(&storage_request),
            provider.fetch_messaging_token(&messaging_request),
        );
        storage.unwrap();
        messaging.unwrap();
        assert_eq!(identity.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_interaction_required_falls_back_to_interactive() {
        let identity = Arc::new(CountingIdentity {
            calls: AtomicUsize::new(0),
            silent_fails_with: Some(|| IdentityError::InteractionRequired),
            interactive_fails: false,
        });
        let provider = TokenProvider::new(Arc::new(TokenCache::new()), identity.clone());
        let response = provider.fetch_storage_token(&request()).await.unwrap();
        assert_eq!(response.token, "sp-token");
        // Silent attempt plus interactive fallback.
        assert_eq!(identity.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_interactive_failure_is_authentication_failed() {
        let provider = provider(CountingIdentity {
            calls: AtomicUsize::new(0),
            silent_fails_with: Some(|| IdentityError::InteractionRequired),
            interactive_fails: true,
        });
        let err = provider.fetch_storage_token(&request()).await.unwrap_err();
        assert!(matches!(err, BootstrapError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn test_silent_rejection_is_terminal_without_fallback() {
        let identity = Arc::new(CountingIdentity {
            calls: AtomicUsize::new(0),
            silent_fails_with: Some(|| IdentityError::Rejected("tenant blocked".into())),
            interactive_fails: false,
        });
        let provider = TokenProvider::new(Arc::new(TokenCache::new()), identity.clone());
        let err = provider.fetch_storage_token(&request()).await.unwrap_err();
        assert!(matches!(err, BootstrapError::AuthenticationFailed(_)));
        // No interactive attempt for a non-interaction error.
        assert_eq!(identity.calls.load(Ordering::SeqCst), 1);
    }
}
