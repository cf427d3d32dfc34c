use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::account::UserAccount;
use crate::models::friendship::{Friendship, PendingFriendRequest};
use crate::models::invitation::{
    Invitation, InvitationSummary, NewInvitation, RsvpKind, RsvpWithName,
};
use crate::models::presence::{FriendPresence, PresenceUpdate};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("row not found")]
    NotFound,
}

/// The record store the core talks to. Everything durable lives behind
/// this trait; the core holds no authoritative copy of any row beyond
/// the round-trip needed to act on it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ── Accounts ────────────────────────────────────────────────────────

    async fn find_account_by_chat(&self, chat_id: i64) -> Result<Option<UserAccount>, StoreError>;

    async fn find_account(&self, user_id: Uuid) -> Result<Option<UserAccount>, StoreError>;

    async fn find_account_by_invite_code(
        &self,
        code: &str,
    ) -> Result<Option<UserAccount>, StoreError>;

    async fn create_account(
        &self,
        chat_id: i64,
        handle: Option<&str>,
        display_name: &str,
        invite_code: &str,
    ) -> Result<UserAccount, StoreError>;

    /// Refresh a changed platform handle. No-op for other fields.
    async fn update_handle(&self, user_id: Uuid, handle: Option<&str>) -> Result<(), StoreError>;

    // ── Presence ────────────────────────────────────────────────────────

    /// Insert-or-update the user's single status row.
    async fn set_presence(&self, user_id: Uuid, update: &PresenceUpdate)
        -> Result<(), StoreError>;

    /// Attach a vibe to the current status without touching the windows.
    async fn set_vibe(&self, user_id: Uuid, vibe: &str) -> Result<(), StoreError>;

    /// Friends of `user_id` with their current presence. Friend-graph
    /// computation is the store's concern; callers treat this as a black
    /// box.
    async fn friends_with_status(&self, user_id: Uuid)
        -> Result<Vec<FriendPresence>, StoreError>;

    // ── Invitations ─────────────────────────────────────────────────────

    async fn create_invitation(&self, new: &NewInvitation) -> Result<Invitation, StoreError>;

    async fn get_invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError>;

    /// Move an active invitation to cancelled. The caller has already
    /// verified creator and state.
    async fn mark_cancelled(&self, id: Uuid) -> Result<(), StoreError>;

    /// Insert-or-overwrite the response keyed by (invitation, responder).
    /// The uniqueness constraint, not application locking, guarantees
    /// at-most-one row under concurrent calls.
    async fn upsert_rsvp(
        &self,
        invitation_id: Uuid,
        responder_id: Uuid,
        kind: RsvpKind,
        responded_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn list_rsvps(&self, invitation_id: Uuid) -> Result<Vec<RsvpWithName>, StoreError>;

    async fn record_delivery(
        &self,
        invitation_id: Uuid,
        recipient_id: Uuid,
        delivered_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Active invitations from friends, for the listing view.
    async fn visible_invitations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<InvitationSummary>, StoreError>;

    // ── Friendships ─────────────────────────────────────────────────────

    /// Any friendship row between the pair, in either direction.
    async fn friendship_between(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<Friendship>, StoreError>;

    async fn create_friend_request(
        &self,
        requester_id: Uuid,
        addressee_id: Uuid,
    ) -> Result<Friendship, StoreError>;

    /// Accept a pending request addressed to `addressee_id`. Returns the
    /// updated row, or None when no such pending request exists.
    async fn accept_friend_request(
        &self,
        friendship_id: Uuid,
        addressee_id: Uuid,
    ) -> Result<Option<Friendship>, StoreError>;

    /// Delete a pending request addressed to `addressee_id`. Returns
    /// whether a row was removed.
    async fn decline_friend_request(
        &self,
        friendship_id: Uuid,
        addressee_id: Uuid,
    ) -> Result<bool, StoreError>;

    async fn pending_friend_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PendingFriendRequest>, StoreError>;
}
