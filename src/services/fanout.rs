use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use uuid::Uuid;

use crate::db::RecordStore;
use crate::models::account::UserAccount;
use crate::models::invitation::{Invitation, RsvpKind};
use crate::models::presence::FriendPresence;
use crate::services::channel::{InlineButton, MessagingChannel};
use crate::utils::messages;

/// How many deliveries are in flight at once during a fanout.
const DELIVERY_CONCURRENCY: usize = 8;

/// Delivers a new invitation to every eligible friend and routes the
/// follow-up notifications back to the creator.
///
/// Delivery is best-effort per recipient: one unreachable friend never
/// aborts the rest, and the creator only ever sees the success count.
#[derive(Clone)]
pub struct FanoutNotifier {
    store: Arc<dyn RecordStore>,
    channel: Arc<dyn MessagingChannel>,
}

impl FanoutNotifier {
    pub fn new(store: Arc<dyn RecordStore>, channel: Arc<dyn MessagingChannel>) -> Self {
        Self { store, channel }
    }

    /// Fan the invitation out to the creator's friends who are currently
    /// free or free-later. Returns how many deliveries succeeded; a
    /// receipt is recorded for each of those and nothing else.
    #[tracing::instrument(skip(self, invitation, creator), fields(invitation_id = %invitation.id))]
    pub async fn notify_friends(&self, invitation: &Invitation, creator: &UserAccount) -> usize {
        let friends = match self.store.friends_with_status(creator.id).await {
            Ok(friends) => friends,
            Err(e) => {
                tracing::error!("failed to resolve recipients for fanout: {}", e);
                return 0;
            }
        };

        let eligible: Vec<FriendPresence> =
            friends.into_iter().filter(|f| f.is_available()).collect();
        if eligible.is_empty() {
            return 0;
        }

        let text = messages::fanout_invite_text(invitation, &creator.display_name);
        let keyboard = messages::jio_response_keyboard(invitation.id);

        let delivered: Vec<Uuid> = stream::iter(eligible)
            .map(|friend| {
                let text = text.clone();
                let keyboard = keyboard.clone();
                async move {
                    match self
                        .channel
                        .send_message(friend.chat_id, &text, Some(keyboard))
                        .await
                    {
                        Ok(()) => Some(friend.user_id),
                        Err(e) => {
                            tracing::warn!(
                                recipient = %friend.user_id,
                                "failed to deliver invitation: {}",
                                e
                            );
                            None
                        }
                    }
                }
            })
            .buffer_unordered(DELIVERY_CONCURRENCY)
            .filter_map(|delivered| async move { delivered })
            .collect()
            .await;

        let now = Utc::now();
        for recipient in &delivered {
            if let Err(e) = self.store.record_delivery(invitation.id, *recipient, now).await {
                tracing::error!(recipient = %recipient, "failed to record delivery receipt: {}", e);
            }
        }

        tracing::info!(delivered = delivered.len(), "fanout complete");
        delivered.len()
    }

    /// Tell the creator someone answered. Only positive responses ping
    /// the creator; declines stay between the responder and the bot.
    pub async fn notify_creator_of_response(
        &self,
        invitation: &Invitation,
        responder_name: &str,
        kind: RsvpKind,
    ) {
        if !matches!(kind, RsvpKind::Joined | RsvpKind::Interested) {
            return;
        }

        let creator = match self.store.find_account(invitation.creator_id).await {
            Ok(Some(creator)) => creator,
            Ok(None) => {
                tracing::warn!(creator_id = %invitation.creator_id, "creator account missing");
                return;
            }
            Err(e) => {
                tracing::error!("failed to load creator for response ping: {}", e);
                return;
            }
        };

        let text = format!(
            "{} {} {} for your jio!\n\n\"{}\"",
            kind.emoji(),
            responder_name,
            kind.action_text(),
            invitation.title
        );
        let keyboard = vec![vec![InlineButton::new(
            "👥 See responses",
            format!("view_responses:{}", invitation.id),
        )]];

        if let Err(e) = self
            .channel
            .send_message(creator.chat_id, &text, Some(keyboard))
            .await
        {
            tracing::warn!("failed to notify creator of response: {}", e);
        }
    }

    /// Ping the addressee of a new friend request with accept/decline
    /// controls.
    pub async fn notify_friend_request(
        &self,
        addressee: &UserAccount,
        requester_name: &str,
        friendship_id: Uuid,
    ) {
        let text = format!("📨 {} wants to be your friend on Lepak!", requester_name);
        let keyboard = messages::friend_request_keyboard(friendship_id);

        if let Err(e) = self
            .channel
            .send_message(addressee.chat_id, &text, Some(keyboard))
            .await
        {
            tracing::warn!("failed to deliver friend request notification: {}", e);
        }
    }
}
