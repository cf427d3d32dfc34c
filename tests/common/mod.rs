#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;

use lepak_backend::db::{RecordStore, StoreError};
use lepak_backend::models::account::UserAccount;
use lepak_backend::models::events::{CallbackAction, ChatUser, InboundEvent};
use lepak_backend::models::friendship::{Friendship, FriendshipStatus, PendingFriendRequest};
use lepak_backend::models::invitation::{
    Invitation, InvitationStatus, InvitationSummary, NewInvitation, RsvpKind, RsvpWithName,
};
use lepak_backend::models::presence::{FriendPresence, PresenceKind, PresenceUpdate};
use lepak_backend::services::channel::{ChannelError, Keyboard, MessagingChannel};
use lepak_backend::telemetry::{get_subscriber, init_subscriber};

// Initialise the tracing stack at most once across a test binary. Logs
// go to stdout only when TEST_LOG is set.
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub fn init_test_telemetry() {
    Lazy::force(&TRACING);
}

// ── In-memory record store ──────────────────────────────────────────────

#[derive(Default)]
struct StoreInner {
    accounts: Vec<UserAccount>,
    presence: HashMap<Uuid, PresenceUpdate>,
    friendships: Vec<Friendship>,
    invitations: HashMap<Uuid, Invitation>,
    rsvps: HashMap<(Uuid, Uuid), (RsvpKind, DateTime<Utc>)>,
    deliveries: Vec<(Uuid, Uuid)>,
}

/// Record store fake backed by process memory. Mirrors the uniqueness
/// semantics the Postgres implementation gets from its constraints.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account directly, bypassing the /start flow.
    pub fn seed_account(&self, chat_id: i64, display_name: &str) -> UserAccount {
        let account = UserAccount {
            id: Uuid::new_v4(),
            chat_id,
            handle: Some(display_name.to_lowercase()),
            display_name: display_name.to_string(),
            invite_code: format!("c{}", chat_id),
            created_at: Utc::now(),
        };
        let mut inner = self.inner.lock().unwrap();
        inner.accounts.push(account.clone());
        inner.presence.insert(
            account.id,
            PresenceUpdate {
                kind: PresenceKind::Offline,
                free_until: None,
                free_after: None,
                vibe_text: None,
                location_text: None,
                expires_at: None,
            },
        );
        account
    }

    /// Make two users accepted friends.
    pub fn befriend(&self, a: Uuid, b: Uuid) {
        self.inner.lock().unwrap().friendships.push(Friendship {
            id: Uuid::new_v4(),
            requester_id: a,
            addressee_id: b,
            status: FriendshipStatus::Accepted,
            created_at: Utc::now(),
        });
    }

    pub fn set_presence_kind(&self, user_id: Uuid, kind: PresenceKind) {
        let free_until = match kind {
            PresenceKind::Free | PresenceKind::FreeLater => Some(Utc::now() + Duration::hours(2)),
            _ => None,
        };
        self.inner.lock().unwrap().presence.insert(
            user_id,
            PresenceUpdate {
                kind,
                free_until,
                free_after: None,
                vibe_text: None,
                location_text: None,
                expires_at: free_until,
            },
        );
    }

    pub fn presence_of(&self, user_id: Uuid) -> Option<PresenceUpdate> {
        self.inner.lock().unwrap().presence.get(&user_id).cloned()
    }

    pub fn invitation(&self, id: Uuid) -> Option<Invitation> {
        self.inner.lock().unwrap().invitations.get(&id).cloned()
    }

    pub fn invitations(&self) -> Vec<Invitation> {
        self.inner
            .lock()
            .unwrap()
            .invitations
            .values()
            .cloned()
            .collect()
    }

    pub fn set_invitation_status(&self, id: Uuid, status: InvitationStatus) {
        if let Some(invitation) = self.inner.lock().unwrap().invitations.get_mut(&id) {
            invitation.status = status;
        }
    }

    pub fn rsvp_rows(&self, invitation_id: Uuid) -> Vec<(Uuid, RsvpKind)> {
        self.inner
            .lock()
            .unwrap()
            .rsvps
            .iter()
            .filter(|((jio, _), _)| *jio == invitation_id)
            .map(|((_, user), (kind, _))| (*user, *kind))
            .collect()
    }

    pub fn delivery_count(&self, invitation_id: Uuid) -> usize {
        self.inner
            .lock()
            .unwrap()
            .deliveries
            .iter()
            .filter(|(jio, _)| *jio == invitation_id)
            .count()
    }

    pub fn account_by_chat(&self, chat_id: i64) -> Option<UserAccount> {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.chat_id == chat_id)
            .cloned()
    }

    pub fn friendships(&self) -> Vec<Friendship> {
        self.inner.lock().unwrap().friendships.clone()
    }

    fn display_name_of(inner: &StoreInner, user_id: Uuid) -> String {
        inner
            .accounts
            .iter()
            .find(|a| a.id == user_id)
            .map(|a| a.display_name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn are_friends(inner: &StoreInner, a: Uuid, b: Uuid) -> bool {
        inner.friendships.iter().any(|f| {
            f.status == FriendshipStatus::Accepted
                && ((f.requester_id == a && f.addressee_id == b)
                    || (f.requester_id == b && f.addressee_id == a))
        })
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find_account_by_chat(&self, chat_id: i64) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.account_by_chat(chat_id))
    }

    async fn find_account(&self, user_id: Uuid) -> Result<Option<UserAccount>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.id == user_id)
            .cloned())
    }

    async fn find_account_by_invite_code(
        &self,
        code: &str,
    ) -> Result<Option<UserAccount>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.invite_code == code)
            .cloned())
    }

    async fn create_account(
        &self,
        chat_id: i64,
        handle: Option<&str>,
        display_name: &str,
        invite_code: &str,
    ) -> Result<UserAccount, StoreError> {
        let account = UserAccount {
            id: Uuid::new_v4(),
            chat_id,
            handle: handle.map(String::from),
            display_name: display_name.to_string(),
            invite_code: invite_code.to_string(),
            created_at: Utc::now(),
        };
        let mut inner = self.inner.lock().unwrap();
        inner.accounts.push(account.clone());
        inner.presence.insert(
            account.id,
            PresenceUpdate {
                kind: PresenceKind::Offline,
                free_until: None,
                free_after: None,
                vibe_text: None,
                location_text: None,
                expires_at: None,
            },
        );
        Ok(account)
    }

    async fn update_handle(&self, user_id: Uuid, handle: Option<&str>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(account) = inner.accounts.iter_mut().find(|a| a.id == user_id) {
            account.handle = handle.map(String::from);
        }
        Ok(())
    }

    async fn set_presence(
        &self,
        user_id: Uuid,
        update: &PresenceUpdate,
    ) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .presence
            .insert(user_id, update.clone());
        Ok(())
    }

    async fn set_vibe(&self, user_id: Uuid, vibe: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.presence.get_mut(&user_id) {
            Some(presence) => {
                presence.vibe_text = Some(vibe.to_string());
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn friends_with_status(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendPresence>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut friends = Vec::new();
        for friendship in &inner.friendships {
            if friendship.status != FriendshipStatus::Accepted {
                continue;
            }
            let friend_id = if friendship.requester_id == user_id {
                friendship.addressee_id
            } else if friendship.addressee_id == user_id {
                friendship.requester_id
            } else {
                continue;
            };
            let Some(account) = inner.accounts.iter().find(|a| a.id == friend_id) else {
                continue;
            };
            let presence = inner.presence.get(&friend_id);
            friends.push(FriendPresence {
                user_id: friend_id,
                chat_id: account.chat_id,
                display_name: account.display_name.clone(),
                handle: account.handle.clone(),
                kind: presence.map(|p| p.kind).unwrap_or(PresenceKind::Offline),
                free_until: presence.and_then(|p| p.free_until),
                free_after: presence.and_then(|p| p.free_after),
                vibe_text: presence.and_then(|p| p.vibe_text.clone()),
                location_text: presence.and_then(|p| p.location_text.clone()),
            });
        }
        Ok(friends)
    }

    async fn create_invitation(&self, new: &NewInvitation) -> Result<Invitation, StoreError> {
        let invitation = Invitation {
            id: Uuid::new_v4(),
            creator_id: new.creator_id,
            kind: new.kind,
            title: new.title.clone(),
            location_text: new.location_text.clone(),
            status: InvitationStatus::Active,
            created_at: Utc::now(),
            expires_at: new.expires_at,
        };
        self.inner
            .lock()
            .unwrap()
            .invitations
            .insert(invitation.id, invitation.clone());
        Ok(invitation)
    }

    async fn get_invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
        Ok(self.invitation(id))
    }

    async fn mark_cancelled(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.invitations.get_mut(&id) {
            Some(invitation) if invitation.status == InvitationStatus::Active => {
                invitation.status = InvitationStatus::Cancelled;
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn upsert_rsvp(
        &self,
        invitation_id: Uuid,
        responder_id: Uuid,
        kind: RsvpKind,
        responded_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .rsvps
            .insert((invitation_id, responder_id), (kind, responded_at));
        Ok(())
    }

    async fn list_rsvps(&self, invitation_id: Uuid) -> Result<Vec<RsvpWithName>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<RsvpWithName> = inner
            .rsvps
            .iter()
            .filter(|((jio, _), _)| *jio == invitation_id)
            .map(|((_, user), (kind, at))| RsvpWithName {
                user_id: *user,
                display_name: Self::display_name_of(&inner, *user),
                kind: *kind,
                responded_at: *at,
            })
            .collect();
        rows.sort_by_key(|r| r.responded_at);
        Ok(rows)
    }

    async fn record_delivery(
        &self,
        invitation_id: Uuid,
        recipient_id: Uuid,
        _delivered_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let exists = inner
            .deliveries
            .iter()
            .any(|(jio, user)| *jio == invitation_id && *user == recipient_id);
        if !exists {
            inner.deliveries.push((invitation_id, recipient_id));
        }
        Ok(())
    }

    async fn visible_invitations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<InvitationSummary>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let mut listing: Vec<InvitationSummary> = inner
            .invitations
            .values()
            .filter(|inv| {
                inv.status == InvitationStatus::Active
                    && inv.expires_at > now
                    && Self::are_friends(&inner, user_id, inv.creator_id)
            })
            .map(|inv| InvitationSummary {
                id: inv.id,
                creator_name: Self::display_name_of(&inner, inv.creator_id),
                kind: inv.kind,
                title: inv.title.clone(),
                location_text: inv.location_text.clone(),
                expires_at: inv.expires_at,
            })
            .collect();
        listing.sort_by_key(|entry| entry.expires_at);
        Ok(listing)
    }

    async fn friendship_between(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<Friendship>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .friendships
            .iter()
            .find(|f| {
                (f.requester_id == a && f.addressee_id == b)
                    || (f.requester_id == b && f.addressee_id == a)
            })
            .cloned())
    }

    async fn create_friend_request(
        &self,
        requester_id: Uuid,
        addressee_id: Uuid,
    ) -> Result<Friendship, StoreError> {
        let friendship = Friendship {
            id: Uuid::new_v4(),
            requester_id,
            addressee_id,
            status: FriendshipStatus::Pending,
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap()
            .friendships
            .push(friendship.clone());
        Ok(friendship)
    }

    async fn accept_friend_request(
        &self,
        friendship_id: Uuid,
        addressee_id: Uuid,
    ) -> Result<Option<Friendship>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.friendships.iter_mut().find(|f| {
            f.id == friendship_id
                && f.addressee_id == addressee_id
                && f.status == FriendshipStatus::Pending
        }) {
            Some(friendship) => {
                friendship.status = FriendshipStatus::Accepted;
                Ok(Some(friendship.clone()))
            }
            None => Ok(None),
        }
    }

    async fn decline_friend_request(
        &self,
        friendship_id: Uuid,
        addressee_id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.friendships.len();
        inner.friendships.retain(|f| {
            !(f.id == friendship_id
                && f.addressee_id == addressee_id
                && f.status == FriendshipStatus::Pending)
        });
        Ok(inner.friendships.len() < before)
    }

    async fn pending_friend_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PendingFriendRequest>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .friendships
            .iter()
            .filter(|f| f.addressee_id == user_id && f.status == FriendshipStatus::Pending)
            .map(|f| PendingFriendRequest {
                id: f.id,
                requester_id: f.requester_id,
                requester_name: Self::display_name_of(&inner, f.requester_id),
            })
            .collect())
    }
}

// ── Recording channel ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

/// Messaging channel fake: records every call and can be told to fail
/// deliveries to specific chats.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<SentMessage>>,
    acks: Mutex<Vec<(String, Option<String>)>>,
    attempts: Mutex<Vec<i64>>,
    fail_chats: Mutex<HashSet<i64>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to this chat will fail from now on.
    pub fn fail_delivery_to(&self, chat_id: i64) {
        self.fail_chats.lock().unwrap().insert(chat_id);
    }

    /// Every chat a send was attempted to, successful or not.
    pub fn attempted_chats(&self) -> Vec<i64> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }

    pub fn edits(&self) -> Vec<SentMessage> {
        self.edits.lock().unwrap().clone()
    }

    pub fn acks(&self) -> Vec<(String, Option<String>)> {
        self.acks.lock().unwrap().clone()
    }

    pub fn last_ack_text(&self) -> Option<String> {
        self.acks.lock().unwrap().last().and_then(|(_, t)| t.clone())
    }
}

#[async_trait]
impl MessagingChannel for RecordingChannel {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        self.attempts.lock().unwrap().push(chat_id);
        if self.fail_chats.lock().unwrap().contains(&chat_id) {
            return Err(ChannelError::Api("recipient blocked the bot".to_string()));
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        _message_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        self.edits.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChannelError> {
        self.acks
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.map(String::from)));
        Ok(())
    }
}

// ── Event builders ──────────────────────────────────────────────────────

pub fn chat_user(chat_id: i64) -> ChatUser {
    ChatUser {
        id: chat_id,
        username: Some(format!("user{}", chat_id)),
        first_name: Some(format!("User{}", chat_id)),
    }
}

pub fn command(chat_id: i64, name: &str, args: Option<&str>) -> InboundEvent {
    InboundEvent::Command {
        chat_id,
        from: chat_user(chat_id),
        name: name.to_string(),
        args: args.map(String::from),
    }
}

pub fn text(chat_id: i64, body: &str) -> InboundEvent {
    InboundEvent::Text {
        chat_id,
        from: chat_user(chat_id),
        text: body.to_string(),
    }
}

pub fn callback(chat_id: i64, data: &str) -> InboundEvent {
    InboundEvent::Callback {
        chat_id,
        from: chat_user(chat_id),
        callback_id: format!("cb-{}", data),
        message_id: Some(1),
        action: CallbackAction::decode(data),
    }
}
