use chrono::{Duration, Utc};

use crate::handlers::router::Router;
use crate::models::account::UserAccount;
use crate::models::events::VibeChoice;
use crate::models::presence::{PresenceKind, PresenceUpdate};
use crate::services::channel::InlineButton;
use crate::utils::messages;
use crate::utils::time_parser::{clock_time_today, end_of_day, parse_time_phrase};

impl Router {
    /// /free [phrase] — with a phrase, parse it and set the free window;
    /// without one, offer the preset keyboard.
    #[tracing::instrument(skip(self, account, args), fields(user_id = %account.id))]
    pub(super) async fn handle_free(
        &self,
        chat_id: i64,
        account: &UserAccount,
        args: Option<String>,
    ) {
        let Some(input) = args else {
            self.reply(
                chat_id,
                "🟢 How long are you free?",
                Some(messages::free_time_keyboard()),
            )
            .await;
            return;
        };

        let parsed = parse_time_phrase(&input, Utc::now());
        let Some(until) = parsed.until else {
            // Unparseable phrase: re-prompt with examples, persist nothing.
            self.reply(chat_id, &messages::time_examples_text(&input), None)
                .await;
            return;
        };

        if let Err(e) = self
            .store
            .set_presence(account.id, &PresenceUpdate::free_until(until))
            .await
        {
            tracing::error!("failed to set presence: {}", e);
            self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
            return;
        }

        let text = format!(
            "✅ Status updated!\n\n🟢 Free {}\n\n{}\n\nAdd a vibe?",
            parsed.display_text,
            self.free_friends_line(account).await
        );
        self.reply(chat_id, &text, Some(messages::vibe_keyboard()))
            .await;
    }

    /// One of the preset buttons under "How long are you free?".
    pub(super) async fn handle_free_preset(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        message_id: Option<i64>,
        code: &str,
    ) {
        let now = Utc::now();
        let (until, display) = match code {
            "1h" => (now + Duration::hours(1), "for 1 hour"),
            "2h" => (now + Duration::hours(2), "for 2 hours"),
            "3h" => (now + Duration::hours(3), "for 3 hours"),
            "until_17" => (clock_time_today(17, 0, now), "until 5pm"),
            "until_20" => (clock_time_today(20, 0, now), "until 8pm"),
            "until_22" => (clock_time_today(22, 0, now), "until tonight"),
            "all_day" => (end_of_day(now), "all day"),
            _ => {
                self.ack(callback_id, Some("Unknown time option")).await;
                return;
            }
        };

        if let Err(e) = self
            .store
            .set_presence(account.id, &PresenceUpdate::free_until(until))
            .await
        {
            tracing::error!("failed to set presence: {}", e);
            self.ack(callback_id, Some(messages::GENERIC_FAILURE)).await;
            return;
        }

        self.ack(callback_id, Some("Status updated!")).await;
        let text = format!("✅ Status updated!\n\n🟢 Free {}\n\nAdd a vibe?", display);
        self.edit_or_send(chat_id, message_id, &text, Some(messages::vibe_keyboard()))
            .await;
    }

    /// /busy — clears the free window and vibe; friends stop getting
    /// jio notifications until the next /free.
    pub(super) async fn handle_busy(&self, chat_id: i64, account: &UserAccount) {
        if let Err(e) = self
            .store
            .set_presence(account.id, &PresenceUpdate::busy())
            .await
        {
            tracing::error!("failed to set presence: {}", e);
            self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
            return;
        }

        self.reply(
            chat_id,
            "🔴 Status set to busy\n\n\
             Your friends won't be notified of new jios.\n\
             Use /free when you're available again!",
            Some(vec![vec![InlineButton::new("🟢 Set as Free", "menu:status")]]),
        )
        .await;
    }

    /// /whofree — friends grouped by presence.
    pub(super) async fn handle_whofree(&self, chat_id: i64, account: &UserAccount) {
        let friends = match self.store.friends_with_status(account.id).await {
            Ok(friends) => friends,
            Err(e) => {
                tracing::error!("failed to fetch friend statuses: {}", e);
                self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
                return;
            }
        };

        if friends.is_empty() {
            self.reply(
                chat_id,
                "You don't have any friends on Lepak yet! 😢\n\n\
                 Share your invite code to add friends.",
                Some(vec![vec![InlineButton::new(
                    "📨 Get Invite Code",
                    "menu:invite",
                )]]),
            )
            .await;
            return;
        }

        let anyone_free = friends.iter().any(|f| f.kind == PresenceKind::Free);
        let text = messages::whofree_text(&friends, Utc::now());
        self.reply(chat_id, &text, Some(messages::whofree_keyboard(anyone_free)))
            .await;
    }

    /// The 🔄 button under the /whofree listing.
    pub(super) async fn handle_whofree_refresh(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        message_id: Option<i64>,
    ) {
        let friends = match self.store.friends_with_status(account.id).await {
            Ok(friends) => friends,
            Err(e) => {
                tracing::error!("failed to fetch friend statuses: {}", e);
                self.ack(callback_id, Some(messages::GENERIC_FAILURE)).await;
                return;
            }
        };

        if friends.is_empty() {
            self.ack(callback_id, Some("No friends yet!")).await;
            return;
        }

        let anyone_free = friends.iter().any(|f| f.kind == PresenceKind::Free);
        let text = messages::whofree_text(&friends, Utc::now());
        self.ack(callback_id, Some("Refreshed!")).await;
        self.edit_or_send(
            chat_id,
            message_id,
            &text,
            Some(messages::whofree_keyboard(anyone_free)),
        )
        .await;
    }

    /// A vibe button under the status confirmation.
    pub(super) async fn handle_vibe_select(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        message_id: Option<i64>,
        choice: VibeChoice,
    ) {
        match choice {
            VibeChoice::Skip => {
                self.ack(callback_id, Some("Skipped!")).await;
                self.edit_or_send(chat_id, message_id, "✅ Status updated!", None)
                    .await;
            }
            VibeChoice::Custom => {
                self.conversations.update(chat_id, |s| {
                    s.awaiting = crate::services::conversation::AwaitingInput::VibeText
                });
                self.ack(callback_id, None).await;
                self.edit_or_send(
                    chat_id,
                    message_id,
                    "What's your vibe? Type something short \
                     (e.g., \"Looking for food\", \"Bored at home\"):",
                    None,
                )
                .await;
            }
            VibeChoice::Preset(code) => {
                let Some(vibe) = messages::vibe_text_for_code(&code) else {
                    self.ack(callback_id, Some("Unknown vibe option")).await;
                    return;
                };
                if let Err(e) = self.store.set_vibe(account.id, vibe).await {
                    tracing::error!("failed to set vibe: {}", e);
                    self.ack(callback_id, Some(messages::GENERIC_FAILURE)).await;
                    return;
                }
                self.ack(callback_id, Some("Vibe added!")).await;
                let text = format!("✅ Status updated!\n\n💭 \"{}\"", vibe);
                self.edit_or_send(chat_id, message_id, &text, None).await;
            }
        }
    }

    /// Free text consumed while awaiting a custom vibe. The awaiting
    /// marker was already cleared by the router.
    pub(super) async fn consume_vibe_text(
        &self,
        chat_id: i64,
        account: &UserAccount,
        text: &str,
    ) {
        let vibe: String = text.trim().chars().take(100).collect();
        if vibe.is_empty() {
            self.reply(
                chat_id,
                "Please enter a vibe text, or use /free to set a new status.",
                None,
            )
            .await;
            return;
        }

        if let Err(e) = self.store.set_vibe(account.id, &vibe).await {
            tracing::error!("failed to set custom vibe: {}", e);
            self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
            return;
        }

        let text = format!(
            "✅ Vibe set: \"{}\"\n\nYour friends can now see what you're up to!",
            vibe
        );
        self.reply(chat_id, &text, None).await;
    }

    /// "N friends also free right now!" line for the status confirmation.
    async fn free_friends_line(&self, account: &UserAccount) -> String {
        let free_count = match self.store.friends_with_status(account.id).await {
            Ok(friends) => friends
                .iter()
                .filter(|f| f.kind == PresenceKind::Free)
                .count(),
            Err(e) => {
                tracing::warn!("failed to count free friends: {}", e);
                0
            }
        };

        match free_count {
            0 => "No friends free right now.".to_string(),
            1 => "1 friend also free right now!".to_string(),
            n => format!("{} friends also free right now!", n),
        }
    }
}
