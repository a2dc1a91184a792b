//! Session audience: who is connected to this board right now.
//!
//! The collaboration framework delivers join/leave events carrying a raw,
//! duck-typed user record. [`member_from_raw`] is the validated parse step
//! that turns one into a [`BoardMember`] or rejects it, and [`Audience`]
//! keeps the roster for the presence list.

use std::sync::{Arc, Mutex, RwLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};
use crate::loader::{DocumentHandle, MembershipEvent};

/// Identifier of one client connection. A user editing in two tabs holds
/// two connections under one member record.
pub type ConnectionId = String;

/// Raw user record attached to a membership event by the service.
///
/// Deliberately lenient: unknown fields are ignored and the known ones are
/// all optional, because the shape is owned by the remote service, not by
/// us. Validation happens in [`member_from_raw`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawClientRecord {
    /// Directory object identifier of the user.
    #[serde(default)]
    pub oid: String,
    /// Display name. Required by contract; its absence is a violation.
    #[serde(default)]
    pub name: Option<String>,
    /// Email address, when the service provides one.
    #[serde(default)]
    pub email: Option<String>,
}

/// A validated member of the board session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMember {
    /// Stable user identifier (the directory object id).
    pub user_id: String,
    /// Display name shown in the presence list.
    pub name: String,
    /// Email address; empty when the service omitted it.
    pub email: String,
    /// Live connections held by this member, in join order.
    pub connections: Vec<ConnectionId>,
}

/// Parse a raw service record into a [`BoardMember`].
///
/// Pure and deterministic: the same record always produces the same member.
/// A missing or empty display name fails with
/// [`BootstrapError::MalformedMemberRecord`]; that is a service-contract
/// violation upstream and is terminal for the event, not for the session.
pub fn member_from_raw(raw: &RawClientRecord) -> Result<BoardMember> {
    match raw.name.as_deref() {
        Some(name) if !name.is_empty() => Ok(BoardMember {
            user_id: raw.oid.clone(),
            name: name.to_string(),
            email: raw.email.clone().unwrap_or_default(),
            connections: Vec::new(),
        }),
        _ => Err(BootstrapError::MalformedMemberRecord(raw.oid.clone())),
    }
}

/// Callback invoked with a roster snapshot after every membership change.
pub type AudienceCallback = Arc<dyn Fn(Vec<BoardMember>) + Send + Sync>;

/// Roster of members currently connected to one document session.
///
/// Bound to a single handle's membership event stream via [`Audience::bind`].
/// Join events with malformed records are logged and dropped; the member
/// simply never appears in the roster.
#[derive(Default)]
pub struct Audience {
    members: Mutex<IndexMap<String, BoardMember>>,
    on_change: RwLock<Option<AudienceCallback>>,
}

impl Audience {
    /// Create an audience bound to `handle`'s membership events.
    pub fn bind(handle: &dyn DocumentHandle) -> Arc<Self> {
        let audience = Arc::new(Self::default());
        let sink = Arc::clone(&audience);
        handle.set_on_membership(Arc::new(move |event| sink.apply(event)));
        audience
    }

    /// Apply one membership event to the roster.
    pub fn apply(&self, event: MembershipEvent) {
        match event {
            MembershipEvent::Joined {
                record,
                connection_id,
            } => match member_from_raw(&record) {
                Ok(member) => {
                    let mut members = self.members.lock().unwrap();
                    let entry = members.entry(member.user_id.clone()).or_insert(member);
                    if !entry.connections.contains(&connection_id) {
                        entry.connections.push(connection_id);
                    }
                }
                Err(e) => {
                    log::warn!("[Audience] Dropping malformed member record: {}", e);
                    return;
                }
            },
            MembershipEvent::Left {
                user_id,
                connection_id,
            } => {
                let mut members = self.members.lock().unwrap();
                if let Some(member) = members.get_mut(&user_id) {
                    member.connections.retain(|c| c != &connection_id);
                    if member.connections.is_empty() {
                        members.shift_remove(&user_id);
                    }
                }
            }
        }
        self.notify();
    }

    /// Snapshot of the current roster, in join order.
    pub fn members(&self) -> Vec<BoardMember> {
        self.members.lock().unwrap().values().cloned().collect()
    }

    /// Look up one member by user id.
    pub fn member(&self, user_id: &str) -> Option<BoardMember> {
        self.members.lock().unwrap().get(user_id).cloned()
    }

    /// Register the roster-change callback. One at a time; a new callback
    /// replaces the previous.
    pub fn set_on_change(&self, callback: AudienceCallback) {
        *self.on_change.write().unwrap() = Some(callback);
    }

    fn notify(&self) {
        let callback = self.on_change.read().unwrap().clone();
        if let Some(callback) = callback {
            callback(self.members());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(oid: &str, name: Option<&str>, email: Option<&str>) -> RawClientRecord {
        RawClientRecord {
            oid: oid.to_string(),
            name: name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_member_from_raw_maps_fields() {
        let member =
            member_from_raw(&raw("oid-1", Some("Ada"), Some("ada@contoso.com"))).unwrap();
        assert_eq!(member.user_id, "oid-1");
        assert_eq!(member.name, "Ada");
        assert_eq!(member.email, "ada@contoso.com");
        assert!(member.connections.is_empty());
    }

    #[test]
    fn test_member_from_raw_is_idempotent() {
        let record = raw("oid-1", Some("Ada"), None);
        let first = member_from_raw(&record).unwrap();
        let second = member_from_raw(&record).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_name_is_malformed_member_record() {
        let err = member_from_raw(&raw("oid-2", None, None)).unwrap_err();
        assert!(matches!(err, BootstrapError::MalformedMemberRecord(_)));
        let err = member_from_raw(&raw("oid-2", Some(""), None)).unwrap_err();
        assert!(matches!(err, BootstrapError::MalformedMemberRecord(_)));
    }

    #[test]
    fn test_raw_record_tolerates_unknown_fields() {
        let record: RawClientRecord = serde_json::from_str(
            r#"{"oid":"oid-3","name":"Grace","tenant":"contoso","mode":"write"}"#,
        )
        .unwrap();
        assert_eq!(record.name.as_deref(), Some("Grace"));
    }

    #[test]
    fn test_roster_tracks_joins_and_leaves() {
        let audience = Audience::default();
        audience.apply(MembershipEvent::Joined {
            record: raw("oid-1", Some("Ada"), None),
            connection_id: "c1".into(),
        });
        audience.apply(MembershipEvent::Joined {
            record: raw("oid-1", Some("Ada"), None),
            connection_id: "c2".into(),
        });
        assert_eq!(audience.members().len(), 1);
        assert_eq!(audience.member("oid-1").unwrap().connections, vec!["c1", "c2"]);

        audience.apply(MembershipEvent::Left {
            user_id: "oid-1".into(),
            connection_id: "c1".into(),
        });
        assert_eq!(audience.member("oid-1").unwrap().connections, vec!["c2"]);

        audience.apply(MembershipEvent::Left {
            user_id: "oid-1".into(),
            connection_id: "c2".into(),
        });
        assert!(audience.member("oid-1").is_none());
    }

    #[test]
    fn test_malformed_join_leaves_roster_unchanged() {
        let audience = Audience::default();
        audience.apply(MembershipEvent::Joined {
            record: raw("oid-9", None, None),
            connection_id: "c1".into(),
        });
        assert!(audience.members().is_empty());
    }

    #[test]
    fn test_change_callback_receives_snapshots() {
        let audience = Audience::default();
        let seen: Arc<Mutex<Vec<usize>>> = Arc::default();
        let sink = Arc::clone(&seen);
        audience.set_on_change(Arc::new(move |members| {
            sink.lock().unwrap().push(members.len());
        }));
        audience.apply(MembershipEvent::Joined {
            record: raw("oid-1", Some("Ada"), None),
            connection_id: "c1".into(),
        });
        audience.apply(MembershipEvent::Joined {
            record: raw("oid-2", Some("Grace"), None),
            connection_id: "c2".into(),
        });
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
