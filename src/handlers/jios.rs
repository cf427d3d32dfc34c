use chrono::Utc;
use uuid::Uuid;

use crate::handlers::router::Router;
use crate::models::account::UserAccount;
use crate::models::events::LocationChoice;
use crate::models::invitation::{InvitationKind, RsvpKind};
use crate::services::conversation::{AwaitingInput, DraftInvitation};
use crate::services::invitations::JioError;
use crate::utils::messages;

impl Router {
    /// /jio [activity] — with trailing text the kind is custom and only
    /// the location remains to be chosen; without it, offer the kind
    /// keyboard.
    pub(super) async fn handle_jio_command(
        &self,
        chat_id: i64,
        _account: &UserAccount,
        args: Option<String>,
    ) {
        if let Some(title) = args {
            self.conversations.update(chat_id, |s| {
                let mut draft = DraftInvitation::new(InvitationKind::Custom);
                draft.title = Some(title.clone());
                s.draft = Some(draft);
                s.awaiting = AwaitingInput::CustomLocation;
            });
            self.reply(
                chat_id,
                "📍 Where?\n\nType a location or pick one:",
                Some(messages::jio_location_keyboard()),
            )
            .await;
            return;
        }

        self.reply(
            chat_id,
            "🎯 What kind of jio?",
            Some(messages::jio_kind_keyboard()),
        )
        .await;
    }

    /// /kopi and /makan — create with defaults and fan out immediately.
    pub(super) async fn quick_jio(
        &self,
        chat_id: i64,
        account: &UserAccount,
        kind: InvitationKind,
    ) {
        self.create_and_fanout(chat_id, account, kind, None, None, None, None)
            .await;
    }

    /// Quick-create button on the /whofree listing.
    pub(super) async fn handle_quick_jio_callback(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        message_id: Option<i64>,
        kind: InvitationKind,
    ) {
        self.create_and_fanout(
            chat_id,
            account,
            kind,
            None,
            None,
            Some(callback_id),
            message_id,
        )
        .await;
    }

    /// A kind button on the "what kind of jio?" keyboard. Custom forks
    /// into the awaited-title flow; everything else creates immediately.
    pub(super) async fn handle_kind_selection(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        message_id: Option<i64>,
        kind: InvitationKind,
    ) {
        if kind == InvitationKind::Custom {
            self.conversations.update(chat_id, |s| {
                s.draft = Some(DraftInvitation::new(InvitationKind::Custom));
                s.awaiting = AwaitingInput::CustomTitle;
            });
            self.ack(callback_id, None).await;
            self.edit_or_send(
                chat_id,
                message_id,
                "✍️ What do you want to do?\n\n\
                 Type your activity (e.g., \"Go cycling\", \"Watch football\"):",
                None,
            )
            .await;
            return;
        }

        self.create_and_fanout(
            chat_id,
            account,
            kind,
            None,
            None,
            Some(callback_id),
            message_id,
        )
        .await;
    }

    /// Free text consumed while awaiting the custom jio's title. Moves
    /// the flow on to the location hop.
    pub(super) async fn consume_custom_title(
        &self,
        chat_id: i64,
        _account: &UserAccount,
        text: &str,
    ) {
        let title = text.trim();
        if title.is_empty() {
            // Nothing usable; drop the flow so a command can take over.
            self.conversations.clear_flow(chat_id);
            self.reply(
                chat_id,
                "That didn't look like an activity. Use /jio to start again!",
                None,
            )
            .await;
            return;
        }

        let title = title.to_string();
        self.conversations.update(chat_id, |s| {
            let mut draft = s
                .draft
                .take()
                .unwrap_or_else(|| DraftInvitation::new(InvitationKind::Custom));
            draft.title = Some(title.clone());
            s.draft = Some(draft);
            s.awaiting = AwaitingInput::CustomLocation;
        });

        self.reply(
            chat_id,
            "📍 Where?\n\nType a location or pick one:",
            Some(messages::jio_location_keyboard()),
        )
        .await;
    }

    /// A location button pressed during the custom flow.
    pub(super) async fn handle_location_selection(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        message_id: Option<i64>,
        choice: LocationChoice,
    ) {
        let state = self.conversations.get(chat_id);
        let Some(draft) = state.draft else {
            self.ack(callback_id, Some("Session expired. Try again!")).await;
            return;
        };
        self.conversations.clear_flow(chat_id);

        let location = match choice {
            LocationChoice::Nearby => Some("Nearby".to_string()),
            LocationChoice::Flexible => Some("Flexible".to_string()),
            LocationChoice::Skip => None,
        };

        self.create_and_fanout(
            chat_id,
            account,
            draft.kind,
            draft.title,
            location,
            Some(callback_id),
            message_id,
        )
        .await;
    }

    /// Free text consumed while awaiting the custom jio's location.
    pub(super) async fn consume_custom_location(
        &self,
        chat_id: i64,
        account: &UserAccount,
        text: &str,
    ) {
        let state = self.conversations.get(chat_id);
        self.conversations.clear_flow(chat_id);
        let Some(draft) = state.draft else {
            tracing::debug!("location text arrived with no draft, ignoring");
            return;
        };

        let location = Some(text.trim().to_string()).filter(|l| !l.is_empty());
        self.create_and_fanout(chat_id, account, draft.kind, draft.title, location, None, None)
            .await;
    }

    /// Create the invitation, fan it out, and confirm to the creator.
    /// Callback contexts edit the originating message; command contexts
    /// reply fresh.
    #[allow(clippy::too_many_arguments)]
    async fn create_and_fanout(
        &self,
        chat_id: i64,
        account: &UserAccount,
        kind: InvitationKind,
        title: Option<String>,
        location: Option<String>,
        callback_id: Option<&str>,
        message_id: Option<i64>,
    ) {
        let invitation = match self.invitations.create(account.id, kind, title, location).await {
            Ok(invitation) => invitation,
            Err(e) => {
                tracing::error!("failed to create invitation: {}", e);
                match callback_id {
                    Some(callback_id) => {
                        self.ack(callback_id, Some("Something went wrong!")).await
                    }
                    None => self.reply(chat_id, messages::GENERIC_FAILURE, None).await,
                }
                return;
            }
        };

        let notified = self.fanout.notify_friends(&invitation, account).await;
        let text = messages::jio_sent_text(&invitation, notified);
        let keyboard = messages::creator_controls_keyboard(invitation.id);

        match callback_id {
            Some(callback_id) => {
                self.ack(callback_id, Some("Jio created!")).await;
                self.edit_or_send(chat_id, message_id, &text, Some(keyboard))
                    .await;
            }
            None => self.reply(chat_id, &text, Some(keyboard)).await,
        }
    }

    /// A response button on a fanned-out invitation (or the interested
    /// control on the listing).
    pub(super) async fn handle_jio_response(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        message_id: Option<i64>,
        kind: RsvpKind,
        jio_id: Uuid,
    ) {
        let invitation = match self
            .invitations
            .record_response(jio_id, account.id, kind)
            .await
        {
            Ok(invitation) => invitation,
            Err(JioError::InvalidState(reason)) => {
                tracing::info!(jio_id = %jio_id, reason = %reason, "response to inactive invitation");
                self.ack(callback_id, Some(messages::JIO_UNAVAILABLE)).await;
                return;
            }
            Err(e) => {
                tracing::error!("failed to record response: {}", e);
                self.ack(callback_id, Some(messages::GENERIC_FAILURE)).await;
                return;
            }
        };

        self.ack(callback_id, Some(kind.ack_text())).await;
        let text = format!("\"{}\"\n\n✅ {}", invitation.title, kind.ack_text());
        self.edit_or_send(chat_id, message_id, &text, None).await;

        self.fanout
            .notify_creator_of_response(&invitation, &account.display_name, kind)
            .await;
    }

    /// The creator's ❌ button. Cause of failure is logged but the user
    /// copy stays uniform.
    pub(super) async fn handle_cancel(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        message_id: Option<i64>,
        jio_id: Uuid,
    ) {
        match self.invitations.cancel(jio_id, account.id).await {
            Ok(()) => {
                self.ack(callback_id, Some("Jio cancelled")).await;
                self.edit_or_send(chat_id, message_id, "❌ Jio cancelled.", None)
                    .await;
            }
            Err(JioError::Authorization(reason)) | Err(JioError::InvalidState(reason)) => {
                tracing::info!(jio_id = %jio_id, reason = %reason, "cancel rejected");
                self.ack(callback_id, Some("Could not cancel jio")).await;
            }
            Err(e) => {
                tracing::error!("failed to cancel invitation: {}", e);
                self.ack(callback_id, Some(messages::GENERIC_FAILURE)).await;
            }
        }
    }

    /// The creator's 👥 button.
    pub(super) async fn handle_view_responses(
        &self,
        chat_id: i64,
        _account: &UserAccount,
        callback_id: &str,
        jio_id: Uuid,
    ) {
        let summary = match self.invitations.list_responses(jio_id).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("failed to list responses: {}", e);
                self.ack(callback_id, Some(messages::GENERIC_FAILURE)).await;
                return;
            }
        };

        if summary.is_empty() {
            self.ack(callback_id, Some("No responses yet")).await;
            return;
        }

        self.ack(callback_id, None).await;
        self.reply(chat_id, &messages::response_summary_text(&summary), None)
            .await;
    }

    /// /jios — open invitations from friends, each with an interested
    /// control.
    pub(super) async fn handle_listing(&self, chat_id: i64, account: &UserAccount) {
        let listing = match self.store.visible_invitations(account.id).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::error!("failed to fetch visible invitations: {}", e);
                self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
                return;
            }
        };

        if listing.is_empty() {
            self.reply(
                chat_id,
                "No open jios from your friends right now.\n\
                 Start one yourself with /kopi or /jio!",
                None,
            )
            .await;
            return;
        }

        let text = messages::listing_text(&listing, Utc::now());
        self.reply(chat_id, &text, Some(messages::listing_keyboard(&listing)))
            .await;
    }
}
