use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
#[serde(rename_all = "snake_case")]
pub enum PresenceKind {
    #[sqlx(rename = "free")]
    Free,
    #[sqlx(rename = "free_later")]
    FreeLater,
    #[sqlx(rename = "busy")]
    Busy,
    #[sqlx(rename = "offline")]
    Offline,
}

impl PresenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceKind::Free => "free",
            PresenceKind::FreeLater => "free_later",
            PresenceKind::Busy => "busy",
            PresenceKind::Offline => "offline",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            PresenceKind::Free => "🟢",
            PresenceKind::FreeLater => "🟡",
            PresenceKind::Busy => "🔴",
            PresenceKind::Offline => "⚫",
        }
    }
}

/// Fields written when a user changes their own presence.
/// Applied as an upsert keyed by user id: a user has at most one status row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub kind: PresenceKind,
    pub free_until: Option<DateTime<Utc>>,
    pub free_after: Option<DateTime<Utc>>,
    pub vibe_text: Option<String>,
    pub location_text: Option<String>,
    /// When the external expiry sweep should reset this status to offline.
    pub expires_at: Option<DateTime<Utc>>,
}

impl PresenceUpdate {
    /// A free-until-`until` status. Vibe and location start empty.
    pub fn free_until(until: DateTime<Utc>) -> Self {
        Self {
            kind: PresenceKind::Free,
            free_until: Some(until),
            free_after: None,
            vibe_text: None,
            location_text: None,
            expires_at: Some(until),
        }
    }

    /// Busy never expires on its own.
    pub fn busy() -> Self {
        Self {
            kind: PresenceKind::Busy,
            free_until: None,
            free_after: None,
            vibe_text: None,
            location_text: None,
            expires_at: None,
        }
    }
}

/// One row of the friends-with-status query: a friend plus their current
/// presence, validated into a fixed shape at the store boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendPresence {
    pub user_id: Uuid,
    pub chat_id: i64,
    pub display_name: String,
    pub handle: Option<String>,
    pub kind: PresenceKind,
    pub free_until: Option<DateTime<Utc>>,
    pub free_after: Option<DateTime<Utc>>,
    pub vibe_text: Option<String>,
    pub location_text: Option<String>,
}

impl FriendPresence {
    /// Eligible to be notified of a new jio.
    pub fn is_available(&self) -> bool {
        matches!(self.kind, PresenceKind::Free | PresenceKind::FreeLater)
    }
}
