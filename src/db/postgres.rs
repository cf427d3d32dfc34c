use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::store::{RecordStore, StoreError};
use crate::models::account::UserAccount;
use crate::models::friendship::{Friendship, PendingFriendRequest};
use crate::models::invitation::{
    Invitation, InvitationSummary, NewInvitation, RsvpKind, RsvpWithName,
};
use crate::models::presence::{FriendPresence, PresenceUpdate};

/// Postgres-backed record store.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_account_by_chat(&self, chat_id: i64) -> Result<Option<UserAccount>, StoreError> {
        let account = sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, chat_id, handle, display_name, invite_code, created_at
            FROM users
            WHERE chat_id = $1
            "#,
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_account(&self, user_id: Uuid) -> Result<Option<UserAccount>, StoreError> {
        let account = sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, chat_id, handle, display_name, invite_code, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_account_by_invite_code(
        &self,
        code: &str,
    ) -> Result<Option<UserAccount>, StoreError> {
        let account = sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, chat_id, handle, display_name, invite_code, created_at
            FROM users
            WHERE invite_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn create_account(
        &self,
        chat_id: i64,
        handle: Option<&str>,
        display_name: &str,
        invite_code: &str,
    ) -> Result<UserAccount, StoreError> {
        let account = sqlx::query_as::<_, UserAccount>(
            r#"
            INSERT INTO users (chat_id, handle, display_name, invite_code)
            VALUES ($1, $2, $3, $4)
            RETURNING id, chat_id, handle, display_name, invite_code, created_at
            "#,
        )
        .bind(chat_id)
        .bind(handle)
        .bind(display_name)
        .bind(invite_code)
        .fetch_one(&self.pool)
        .await?;

        // Fresh accounts start offline until they set a status.
        sqlx::query(
            r#"
            INSERT INTO user_status (user_id, kind)
            VALUES ($1, 'offline')
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(account.id)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    async fn update_handle(&self, user_id: Uuid, handle: Option<&str>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users SET handle = $1 WHERE id = $2
            "#,
        )
        .bind(handle)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_presence(
        &self,
        user_id: Uuid,
        update: &PresenceUpdate,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_status
                (user_id, kind, free_until, free_after, vibe_text, location_text, expires_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET
                kind = $2,
                free_until = $3,
                free_after = $4,
                vibe_text = $5,
                location_text = $6,
                expires_at = $7,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(update.kind.as_str())
        .bind(update.free_until)
        .bind(update.free_after)
        .bind(&update.vibe_text)
        .bind(&update.location_text)
        .bind(update.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_vibe(&self, user_id: Uuid, vibe: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE user_status
            SET vibe_text = $1, updated_at = NOW()
            WHERE user_id = $2
            "#,
        )
        .bind(vibe)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn friends_with_status(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendPresence>, StoreError> {
        let friends = sqlx::query_as::<_, FriendPresence>(
            r#"
            SELECT
                u.id AS user_id,
                u.chat_id,
                u.display_name,
                u.handle,
                COALESCE(us.kind, 'offline') AS kind,
                us.free_until,
                us.free_after,
                us.vibe_text,
                us.location_text
            FROM friendships f
            INNER JOIN users u
                ON u.id = CASE WHEN f.requester_id = $1 THEN f.addressee_id ELSE f.requester_id END
            LEFT JOIN user_status us ON us.user_id = u.id
            WHERE (f.requester_id = $1 OR f.addressee_id = $1)
              AND f.status = 'accepted'
            ORDER BY u.display_name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }

    async fn create_invitation(&self, new: &NewInvitation) -> Result<Invitation, StoreError> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO jios (creator_id, kind, title, location_text, status, expires_at)
            VALUES ($1, $2, $3, $4, 'active', $5)
            RETURNING id, creator_id, kind, title, location_text, status, created_at, expires_at
            "#,
        )
        .bind(new.creator_id)
        .bind(new.kind.as_str())
        .bind(&new.title)
        .bind(&new.location_text)
        .bind(new.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(invitation)
    }

    async fn get_invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, creator_id, kind, title, location_text, status, created_at, expires_at
            FROM jios
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invitation)
    }

    async fn mark_cancelled(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE jios SET status = 'cancelled' WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn upsert_rsvp(
        &self,
        invitation_id: Uuid,
        responder_id: Uuid,
        kind: RsvpKind,
        responded_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO jio_responses (jio_id, user_id, kind, responded_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (jio_id, user_id)
            DO UPDATE SET kind = $3, responded_at = $4
            "#,
        )
        .bind(invitation_id)
        .bind(responder_id)
        .bind(kind.as_str())
        .bind(responded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_rsvps(&self, invitation_id: Uuid) -> Result<Vec<RsvpWithName>, StoreError> {
        let rsvps = sqlx::query_as::<_, RsvpWithName>(
            r#"
            SELECT r.user_id, u.display_name, r.kind, r.responded_at
            FROM jio_responses r
            INNER JOIN users u ON u.id = r.user_id
            WHERE r.jio_id = $1
            ORDER BY r.responded_at
            "#,
        )
        .bind(invitation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rsvps)
    }

    async fn record_delivery(
        &self,
        invitation_id: Uuid,
        recipient_id: Uuid,
        delivered_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO jio_deliveries (jio_id, user_id, delivered_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jio_id, user_id) DO NOTHING
            "#,
        )
        .bind(invitation_id)
        .bind(recipient_id)
        .bind(delivered_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn visible_invitations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<InvitationSummary>, StoreError> {
        let listing = sqlx::query_as::<_, InvitationSummary>(
            r#"
            SELECT j.id, u.display_name AS creator_name, j.kind, j.title, j.location_text, j.expires_at
            FROM jios j
            INNER JOIN users u ON u.id = j.creator_id
            INNER JOIN friendships f
                ON f.status = 'accepted'
               AND ((f.requester_id = $1 AND f.addressee_id = j.creator_id)
                 OR (f.addressee_id = $1 AND f.requester_id = j.creator_id))
            WHERE j.status = 'active' AND j.expires_at > NOW()
            ORDER BY j.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn friendship_between(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<Friendship>, StoreError> {
        let friendship = sqlx::query_as::<_, Friendship>(
            r#"
            SELECT id, requester_id, addressee_id, status, created_at
            FROM friendships
            WHERE (requester_id = $1 AND addressee_id = $2)
               OR (requester_id = $2 AND addressee_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn create_friend_request(
        &self,
        requester_id: Uuid,
        addressee_id: Uuid,
    ) -> Result<Friendship, StoreError> {
        let friendship = sqlx::query_as::<_, Friendship>(
            r#"
            INSERT INTO friendships (requester_id, addressee_id, status)
            VALUES ($1, $2, 'pending')
            RETURNING id, requester_id, addressee_id, status, created_at
            "#,
        )
        .bind(requester_id)
        .bind(addressee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn accept_friend_request(
        &self,
        friendship_id: Uuid,
        addressee_id: Uuid,
    ) -> Result<Option<Friendship>, StoreError> {
        let friendship = sqlx::query_as::<_, Friendship>(
            r#"
            UPDATE friendships
            SET status = 'accepted'
            WHERE id = $1 AND addressee_id = $2 AND status = 'pending'
            RETURNING id, requester_id, addressee_id, status, created_at
            "#,
        )
        .bind(friendship_id)
        .bind(addressee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn decline_friend_request(
        &self,
        friendship_id: Uuid,
        addressee_id: Uuid,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE id = $1 AND addressee_id = $2 AND status = 'pending'
            "#,
        )
        .bind(friendship_id)
        .bind(addressee_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn pending_friend_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PendingFriendRequest>, StoreError> {
        let pending = sqlx::query_as::<_, PendingFriendRequest>(
            r#"
            SELECT f.id, f.requester_id, u.display_name AS requester_name
            FROM friendships f
            INNER JOIN users u ON u.id = f.requester_id
            WHERE f.addressee_id = $1 AND f.status = 'pending'
            ORDER BY f.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pending)
    }
}
