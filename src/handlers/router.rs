use std::sync::Arc;

use crate::db::RecordStore;
use crate::models::account::UserAccount;
use crate::models::events::{CallbackAction, ChatUser, InboundEvent, MenuAction};
use crate::models::invitation::InvitationKind;
use crate::services::channel::{Keyboard, MessagingChannel};
use crate::services::conversation::{AwaitingInput, ConversationStateStore};
use crate::services::fanout::FanoutNotifier;
use crate::services::invitations::InvitationService;
use crate::utils::messages;

/// Single entry point for inbound chat events. Dispatches typed commands
/// and callback presses to the handlers, interleaving single-shot
/// commands with the multi-step flows tracked in conversation state.
///
/// The router is the only component that touches conversation state, and
/// the platform delivers at most one event per conversation at a time.
pub struct Router {
    pub(super) store: Arc<dyn RecordStore>,
    pub(super) channel: Arc<dyn MessagingChannel>,
    pub(super) conversations: ConversationStateStore,
    pub(super) invitations: InvitationService,
    pub(super) fanout: FanoutNotifier,
}

impl Router {
    pub fn new(store: Arc<dyn RecordStore>, channel: Arc<dyn MessagingChannel>) -> Self {
        let invitations = InvitationService::new(store.clone());
        let fanout = FanoutNotifier::new(store.clone(), channel.clone());
        Self {
            store,
            channel,
            conversations: ConversationStateStore::new(),
            invitations,
            fanout,
        }
    }

    /// Handle one inbound event. Never propagates an error: every failure
    /// is scoped to this event and the conversation stays usable.
    #[tracing::instrument(skip(self, event), fields(chat_id = event.chat_id()))]
    pub async fn dispatch(&self, event: InboundEvent) {
        match event {
            InboundEvent::Command {
                chat_id,
                from,
                name,
                args,
            } => {
                // Any command interrupts a multi-step flow; the draft is
                // discarded, identity binding survives.
                let state = self.conversations.get(chat_id);
                if state.awaiting != AwaitingInput::None || state.draft.is_some() {
                    tracing::debug!("command interrupts in-progress flow, dropping draft");
                    self.conversations.clear_flow(chat_id);
                }
                self.dispatch_command(chat_id, &from, &name, args).await;
            }

            InboundEvent::Text {
                chat_id,
                from,
                text,
            } => {
                let state = self.conversations.get(chat_id);
                if state.awaiting == AwaitingInput::None {
                    tracing::debug!("free text outside a flow, ignoring");
                    return;
                }
                self.consume_awaited_input(chat_id, &from, state.awaiting, &text)
                    .await;
            }

            InboundEvent::Callback {
                chat_id,
                from,
                callback_id,
                message_id,
                action,
            } => {
                self.dispatch_callback(chat_id, &from, &callback_id, message_id, action)
                    .await;
            }
        }
    }

    async fn dispatch_command(
        &self,
        chat_id: i64,
        from: &ChatUser,
        name: &str,
        args: Option<String>,
    ) {
        match name {
            "start" => self.handle_start(chat_id, from).await,
            "help" => self.handle_help(chat_id).await,

            "free" | "busy" | "whofree" | "jio" | "kopi" | "makan" | "jios" | "friends" => {
                let Some(account) = self.account_or_prompt(chat_id, from).await else {
                    return;
                };
                match name {
                    "free" => self.handle_free(chat_id, &account, args).await,
                    "busy" => self.handle_busy(chat_id, &account).await,
                    "whofree" => self.handle_whofree(chat_id, &account).await,
                    "jio" => self.handle_jio_command(chat_id, &account, args).await,
                    "kopi" => {
                        self.quick_jio(chat_id, &account, InvitationKind::Coffee)
                            .await
                    }
                    "makan" => self.quick_jio(chat_id, &account, InvitationKind::Food).await,
                    "jios" => self.handle_listing(chat_id, &account).await,
                    "friends" => self.handle_friends(chat_id, &account, args).await,
                    _ => unreachable!(),
                }
            }

            other => tracing::debug!(command = other, "ignoring unrecognized command"),
        }
    }

    /// Free text while the conversation awaits an input. The marker never
    /// survives the consumption attempt: success and failure alike leave
    /// the conversation able to take a fresh command.
    async fn consume_awaited_input(
        &self,
        chat_id: i64,
        from: &ChatUser,
        awaiting: AwaitingInput,
        text: &str,
    ) {
        let Some(account) = self.current_account(chat_id, from).await else {
            self.conversations.clear_flow(chat_id);
            self.reply(chat_id, messages::REGISTER_FIRST, None).await;
            return;
        };

        match awaiting {
            AwaitingInput::VibeText => {
                self.conversations
                    .update(chat_id, |s| s.awaiting = AwaitingInput::None);
                self.consume_vibe_text(chat_id, &account, text).await;
            }
            AwaitingInput::CustomTitle => {
                self.consume_custom_title(chat_id, &account, text).await;
            }
            AwaitingInput::CustomLocation => {
                self.consume_custom_location(chat_id, &account, text).await;
            }
            AwaitingInput::None => unreachable!(),
        }
    }

    async fn dispatch_callback(
        &self,
        chat_id: i64,
        from: &ChatUser,
        callback_id: &str,
        message_id: Option<i64>,
        action: CallbackAction,
    ) {
        // Unknown payloads are acknowledged and dropped; they must never
        // bubble up as handler errors.
        if let CallbackAction::Unknown(raw) = &action {
            tracing::warn!(payload = %raw, "unknown callback payload");
            self.ack(callback_id, Some("Unknown action")).await;
            return;
        }

        let Some(account) = self.current_account(chat_id, from).await else {
            self.ack(callback_id, Some("Please /start first!")).await;
            return;
        };

        match action {
            CallbackAction::JioResponse { kind, jio_id } => {
                self.handle_jio_response(chat_id, &account, callback_id, message_id, kind, jio_id)
                    .await
            }
            CallbackAction::VibeSelect(choice) => {
                self.handle_vibe_select(chat_id, &account, callback_id, message_id, choice)
                    .await
            }
            CallbackAction::FreeTimeSelect(code) => {
                self.handle_free_preset(chat_id, &account, callback_id, message_id, &code)
                    .await
            }
            CallbackAction::JioKindSelect(kind) => {
                self.handle_kind_selection(chat_id, &account, callback_id, message_id, kind)
                    .await
            }
            CallbackAction::JioLocationSelect(choice) => {
                self.handle_location_selection(chat_id, &account, callback_id, message_id, choice)
                    .await
            }
            CallbackAction::QuickJio(kind) => {
                self.handle_quick_jio_callback(chat_id, &account, callback_id, message_id, kind)
                    .await
            }
            CallbackAction::RefreshWhofree => {
                self.handle_whofree_refresh(chat_id, &account, callback_id, message_id)
                    .await
            }
            CallbackAction::FriendAccept(friendship_id) => {
                self.handle_friend_accept(chat_id, &account, callback_id, message_id, friendship_id)
                    .await
            }
            CallbackAction::FriendDecline(friendship_id) => {
                self.handle_friend_decline(
                    chat_id,
                    &account,
                    callback_id,
                    message_id,
                    friendship_id,
                )
                .await
            }
            CallbackAction::Menu(menu) => {
                self.handle_menu(chat_id, &account, callback_id, menu).await
            }
            CallbackAction::CancelJio(jio_id) => {
                self.handle_cancel(chat_id, &account, callback_id, message_id, jio_id)
                    .await
            }
            CallbackAction::ViewResponses(jio_id) => {
                self.handle_view_responses(chat_id, &account, callback_id, jio_id)
                    .await
            }
            CallbackAction::Unknown(_) => unreachable!(),
        }
    }

    async fn handle_menu(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        menu: MenuAction,
    ) {
        self.ack(callback_id, None).await;
        match menu {
            MenuAction::Status => {
                self.reply(
                    chat_id,
                    "🟢 How long are you free?",
                    Some(messages::free_time_keyboard()),
                )
                .await
            }
            MenuAction::Whofree => self.handle_whofree(chat_id, account).await,
            MenuAction::Jio => {
                self.reply(
                    chat_id,
                    "🎯 What kind of jio?",
                    Some(messages::jio_kind_keyboard()),
                )
                .await
            }
            MenuAction::Invite => {
                let text = format!(
                    "📨 Share Lepak with friends!\n\n\
                     Your invite code: {}\n\n\
                     Friends can add you with /friends {}",
                    account.invite_code, account.invite_code
                );
                self.reply(chat_id, &text, None).await;
            }
        }
    }

    // ── Identity resolution ─────────────────────────────────────────────

    /// The account behind this conversation, binding it into conversation
    /// state on first sight. None when the user never registered.
    pub(super) async fn current_account(
        &self,
        chat_id: i64,
        from: &ChatUser,
    ) -> Option<UserAccount> {
        let state = self.conversations.get(chat_id);
        if let Some(user_id) = state.user_id {
            return match self.store.find_account(user_id).await {
                Ok(account) => account,
                Err(e) => {
                    tracing::error!(user_id = %user_id, "failed to load account: {}", e);
                    None
                }
            };
        }

        match self.store.find_account_by_chat(from.id).await {
            Ok(Some(account)) => {
                let user_id = account.id;
                self.conversations
                    .update(chat_id, |s| s.user_id = Some(user_id));
                Some(account)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(chat_id, "failed to look up account by chat: {}", e);
                None
            }
        }
    }

    /// Like `current_account`, but prompts the uniform registration nudge
    /// when no account exists.
    async fn account_or_prompt(&self, chat_id: i64, from: &ChatUser) -> Option<UserAccount> {
        match self.current_account(chat_id, from).await {
            Some(account) => Some(account),
            None => {
                self.reply(chat_id, messages::REGISTER_FIRST, None).await;
                None
            }
        }
    }

    // ── Channel helpers ─────────────────────────────────────────────────

    pub(super) async fn reply(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) {
        if let Err(e) = self.channel.send_message(chat_id, text, keyboard).await {
            tracing::warn!(chat_id, "failed to send reply: {}", e);
        }
    }

    pub(super) async fn ack(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.channel.answer_callback(callback_id, text).await {
            tracing::warn!("failed to answer callback: {}", e);
        }
    }

    /// Edit the message carrying the pressed button, falling back to a
    /// fresh message when the press arrived without one.
    pub(super) async fn edit_or_send(
        &self,
        chat_id: i64,
        message_id: Option<i64>,
        text: &str,
        keyboard: Option<Keyboard>,
    ) {
        match message_id {
            Some(message_id) => {
                if let Err(e) = self
                    .channel
                    .edit_message(chat_id, message_id, text, keyboard)
                    .await
                {
                    tracing::warn!(chat_id, message_id, "failed to edit message: {}", e);
                }
            }
            None => self.reply(chat_id, text, keyboard).await,
        }
    }
}
