use uuid::Uuid;

use crate::handlers::router::Router;
use crate::models::account::UserAccount;
use crate::models::friendship::FriendshipStatus;
use crate::utils::messages;

impl Router {
    /// /friends [code] — with a code, send a friend request; without,
    /// show the friend overview.
    pub(super) async fn handle_friends(
        &self,
        chat_id: i64,
        account: &UserAccount,
        args: Option<String>,
    ) {
        match args {
            Some(code) => self.send_friend_request(chat_id, account, &code).await,
            None => self.friends_overview(chat_id, account).await,
        }
    }

    async fn friends_overview(&self, chat_id: i64, account: &UserAccount) {
        let friend_count = match self.store.friends_with_status(account.id).await {
            Ok(friends) => friends.len(),
            Err(e) => {
                tracing::error!("failed to fetch friends: {}", e);
                self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
                return;
            }
        };
        let pending_count = match self.store.pending_friend_requests(account.id).await {
            Ok(pending) => pending.len(),
            Err(e) => {
                tracing::warn!("failed to fetch pending requests: {}", e);
                0
            }
        };

        let mut text = String::from("👥 Friends\n\n");
        let plural = if friend_count == 1 { "" } else { "s" };
        text.push_str(&format!(
            "You have {} friend{} on Lepak.\n\n",
            friend_count, plural
        ));
        if pending_count > 0 {
            let plural = if pending_count == 1 { "" } else { "s" };
            text.push_str(&format!(
                "📨 {} pending friend request{}\n\n",
                pending_count, plural
            ));
        }
        text.push_str(&format!(
            "🔗 Your invite code: {}\n\
             Friends can add you with /friends {}",
            account.invite_code, account.invite_code
        ));

        self.reply(chat_id, &text, None).await;
    }

    /// Look the code up and create a pending friendship. Self-adds and
    /// existing relationships are rejected with friendly copy and no
    /// write.
    pub(super) async fn send_friend_request(
        &self,
        chat_id: i64,
        account: &UserAccount,
        code: &str,
    ) {
        let code = code.trim().to_lowercase();

        let target = match self.store.find_account_by_invite_code(&code).await {
            Ok(target) => target,
            Err(e) => {
                tracing::error!("failed to look up invite code: {}", e);
                self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
                return;
            }
        };
        let Some(target) = target else {
            let text = format!(
                "Couldn't find anyone with invite code \"{}\".\n\
                 Make sure you entered it correctly!",
                code
            );
            self.reply(chat_id, &text, None).await;
            return;
        };

        if target.id == account.id {
            self.reply(chat_id, "You can't add yourself as a friend! 😄", None)
                .await;
            return;
        }

        match self.store.friendship_between(account.id, target.id).await {
            Ok(Some(existing)) => {
                let text = match existing.status {
                    FriendshipStatus::Accepted => {
                        format!("You're already friends with {}! 🤝", target.display_name)
                    }
                    FriendshipStatus::Pending => format!(
                        "There's already a pending friend request with {}!",
                        target.display_name
                    ),
                };
                self.reply(chat_id, &text, None).await;
                return;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("failed to check existing friendship: {}", e);
                self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
                return;
            }
        }

        let friendship = match self
            .store
            .create_friend_request(account.id, target.id)
            .await
        {
            Ok(friendship) => friendship,
            Err(e) => {
                tracing::error!("failed to create friend request: {}", e);
                self.reply(chat_id, messages::GENERIC_FAILURE, None).await;
                return;
            }
        };

        self.fanout
            .notify_friend_request(&target, &account.display_name, friendship.id)
            .await;

        let text = format!(
            "📨 Friend request sent to {}!\n\n\
             They'll be notified and can accept your request.",
            target.display_name
        );
        self.reply(chat_id, &text, None).await;
    }

    pub(super) async fn handle_friend_accept(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        message_id: Option<i64>,
        friendship_id: Uuid,
    ) {
        let friendship = match self
            .store
            .accept_friend_request(friendship_id, account.id)
            .await
        {
            Ok(Some(friendship)) => friendship,
            Ok(None) => {
                self.ack(callback_id, Some("Could not accept request")).await;
                return;
            }
            Err(e) => {
                tracing::error!("failed to accept friend request: {}", e);
                self.ack(callback_id, Some(messages::GENERIC_FAILURE)).await;
                return;
            }
        };

        let requester_name = match self.store.find_account(friendship.requester_id).await {
            Ok(Some(requester)) => requester.display_name,
            _ => "this user".to_string(),
        };

        self.ack(callback_id, Some("Friend request accepted!")).await;
        let text = format!(
            "✅ You're now friends with {}!\n\n\
             You can now see each other's status and jios.",
            requester_name
        );
        self.edit_or_send(chat_id, message_id, &text, None).await;
    }

    pub(super) async fn handle_friend_decline(
        &self,
        chat_id: i64,
        account: &UserAccount,
        callback_id: &str,
        message_id: Option<i64>,
        friendship_id: Uuid,
    ) {
        match self
            .store
            .decline_friend_request(friendship_id, account.id)
            .await
        {
            Ok(true) => {
                self.ack(callback_id, Some("Request declined")).await;
                self.edit_or_send(chat_id, message_id, "Friend request declined.", None)
                    .await;
            }
            Ok(false) => {
                self.ack(callback_id, Some("Could not decline request")).await;
            }
            Err(e) => {
                tracing::error!("failed to decline friend request: {}", e);
                self.ack(callback_id, Some(messages::GENERIC_FAILURE)).await;
            }
        }
    }
}
