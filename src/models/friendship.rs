use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    #[sqlx(rename = "pending")]
    Pending,
    #[sqlx(rename = "accepted")]
    Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Friendship {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

/// A pending request shown to its addressee.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingFriendRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub requester_name: String,
}
