//! In-memory bearer-token cache.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// The downstream service a token authenticates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// The cloud document-storage backend.
    Storage,
    /// The real-time messaging (ordering) service.
    Messaging,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Storage => write!(f, "storage"),
            TokenKind::Messaging => write!(f, "messaging"),
        }
    }
}

/// The most recently obtained bearer token for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// The raw bearer token string.
    pub value: String,
    /// When the identity flow produced this value.
    pub obtained_at: DateTime<Utc>,
}

/// Last-write-wins cache of the current bearer token per service.
///
/// Constructor-injected rather than ambient process-global state, so multiple
/// boards opened in one process cannot leak credentials across sessions and
/// the bootstrap stays testable. Starts empty; never persisted, so a new
/// process always re-runs the identity flow.
///
/// Each kind has its own lock. A refresh racing a fetch can therefore never
/// yield a half-written record: readers see either the old value or the new
/// one, whole.
#[derive(Debug, Default)]
pub struct TokenCache {
    storage: Mutex<Option<TokenRecord>>,
    messaging: Mutex<Option<TokenRecord>>,
}

impl TokenCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: TokenKind) -> &Mutex<Option<TokenRecord>> {
        match kind {
            TokenKind::Storage => &self.storage,
            TokenKind::Messaging => &self.messaging,
        }
    }

    /// Overwrite the token for `kind` unconditionally.
    pub fn set(&self, kind: TokenKind, value: String) {
        let record = TokenRecord {
            value,
            obtained_at: Utc::now(),
        };
        *self.slot(kind).lock().unwrap() = Some(record);
    }

    /// The current token for `kind`, or `None` when the identity flow has
    /// not populated it yet.
    pub fn get(&self, kind: TokenKind) -> Option<TokenRecord> {
        self.slot(kind).lock().unwrap().clone()
    }

    /// Whether a token for `kind` is present.
    pub fn contains(&self, kind: TokenKind) -> bool {
        self.slot(kind).lock().unwrap().is_some()
    }
}
