use crate::handlers::router::Router;
use crate::models::account::generate_invite_code;
use crate::models::events::ChatUser;
use crate::services::channel::InlineButton;
use crate::utils::messages;

impl Router {
    /// /start — bind the chat to an account, creating one on first
    /// contact. Idempotent per chat id; a changed platform handle is
    /// refreshed on the way through.
    #[tracing::instrument(skip(self, from), fields(chat_id))]
    pub(super) async fn handle_start(&self, chat_id: i64, from: &ChatUser) {
        let existing = match self.store.find_account_by_chat(from.id).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::error!("failed to look up account on /start: {}", e);
                self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
                return;
            }
        };

        if let Some(account) = existing {
            let account_id = account.id;
            self.conversations
                .update(chat_id, |s| s.user_id = Some(account_id));

            if account.handle != from.username {
                if let Err(e) = self
                    .store
                    .update_handle(account.id, from.username.as_deref())
                    .await
                {
                    tracing::warn!("failed to refresh handle: {}", e);
                }
            }

            self.reply(
                chat_id,
                &messages::welcome_back_text(&account.display_name, &account.invite_code),
                Some(messages::main_menu_keyboard()),
            )
            .await;
            return;
        }

        let invite_code = generate_invite_code();
        let account = match self
            .store
            .create_account(
                from.id,
                from.username.as_deref(),
                &from.best_display_name(),
                &invite_code,
            )
            .await
        {
            Ok(account) => account,
            Err(e) => {
                tracing::error!("failed to create account: {}", e);
                self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
                return;
            }
        };

        tracing::info!(user_id = %account.id, "registered new user");
        let account_id = account.id;
        self.conversations
            .update(chat_id, |s| s.user_id = Some(account_id));

        self.reply(
            chat_id,
            &messages::welcome_text(&account.invite_code),
            Some(vec![
                vec![InlineButton::new("📨 Invite Friends", "menu:invite")],
                vec![InlineButton::new("🟢 Set My Status", "menu:status")],
            ]),
        )
        .await;
    }

    pub(super) async fn handle_help(&self, chat_id: i64) {
        self.reply(
            chat_id,
            &messages::help_text(),
            Some(vec![
                vec![InlineButton::new("🟢 Set Status", "menu:status")],
                vec![InlineButton::new("👀 Who's Free", "menu:whofree")],
            ]),
        )
        .await;
    }
}
