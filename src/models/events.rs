use serde::Deserialize;
use uuid::Uuid;

use crate::models::invitation::{InvitationKind, RsvpKind};

/// Raw chat-platform update as delivered to the webhook.
/// Only the fields the router consumes are deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<ChatUser>,
    pub chat: ChatRef,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl ChatUser {
    pub fn best_display_name(&self) -> String {
        self.first_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| "Friend".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRef {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: ChatUser,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

/// An inbound event after boundary decoding. The router matches on this
/// instead of re-parsing raw text or payload strings in every handler.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// `/name [args]` sent as message text.
    Command {
        chat_id: i64,
        from: ChatUser,
        name: String,
        args: Option<String>,
    },
    /// Plain message text. Meaningful only while the conversation is
    /// awaiting an input; ignored otherwise.
    Text {
        chat_id: i64,
        from: ChatUser,
        text: String,
    },
    /// Inline-button press.
    Callback {
        chat_id: i64,
        from: ChatUser,
        callback_id: String,
        message_id: Option<i64>,
        action: CallbackAction,
    },
}

impl InboundEvent {
    pub fn chat_id(&self) -> i64 {
        match self {
            InboundEvent::Command { chat_id, .. }
            | InboundEvent::Text { chat_id, .. }
            | InboundEvent::Callback { chat_id, .. } => *chat_id,
        }
    }

    /// Decode a platform update into an event. Returns None for update
    /// kinds the bot does not handle (edits, channel posts, stickers).
    pub fn from_update(update: Update) -> Option<InboundEvent> {
        if let Some(cb) = update.callback_query {
            let chat_id = cb
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(cb.from.id);
            let action = match cb.data.as_deref() {
                Some(data) => CallbackAction::decode(data),
                None => CallbackAction::Unknown(String::new()),
            };
            return Some(InboundEvent::Callback {
                chat_id,
                from: cb.from,
                callback_id: cb.id,
                message_id: cb.message.map(|m| m.message_id),
                action,
            });
        }

        let message = update.message?;
        let from = message.from?;
        let text = message.text?;
        let chat_id = message.chat.id;

        if let Some(rest) = text.strip_prefix('/') {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let raw_name = parts.next().unwrap_or_default();
            // Group-chat syntax "/free@SomeBot" carries the bot handle.
            let name = raw_name
                .split('@')
                .next()
                .unwrap_or(raw_name)
                .to_lowercase();
            if name.is_empty() {
                return Some(InboundEvent::Text { chat_id, from, text });
            }
            let args = parts
                .next()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from);
            return Some(InboundEvent::Command {
                chat_id,
                from,
                name,
                args,
            });
        }

        Some(InboundEvent::Text { chat_id, from, text })
    }
}

/// Where a just-created jio's location came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationChoice {
    Nearby,
    Flexible,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Status,
    Whofree,
    Jio,
    Invite,
}

/// Typed decode of the `namespace:action[:id]` callback payload grammar.
/// Decoded once at the boundary; handlers match exhaustively. Payloads
/// that fail to decode land in `Unknown` and are acknowledged generically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    JioResponse { kind: RsvpKind, jio_id: Uuid },
    VibeSelect(VibeChoice),
    FreeTimeSelect(String),
    JioKindSelect(InvitationKind),
    JioLocationSelect(LocationChoice),
    QuickJio(InvitationKind),
    RefreshWhofree,
    FriendAccept(Uuid),
    FriendDecline(Uuid),
    Menu(MenuAction),
    CancelJio(Uuid),
    ViewResponses(Uuid),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VibeChoice {
    Preset(String),
    Custom,
    Skip,
}

impl CallbackAction {
    pub fn decode(raw: &str) -> CallbackAction {
        let mut parts = raw.splitn(3, ':');
        let ns = parts.next().unwrap_or_default();
        let action = parts.next();
        let id = parts.next();

        let decoded = match (ns, action, id) {
            ("jio", Some(kind), Some(id)) => {
                match (RsvpKind::parse(kind), Uuid::parse_str(id)) {
                    (Some(kind), Ok(jio_id)) => Some(CallbackAction::JioResponse { kind, jio_id }),
                    _ => None,
                }
            }
            ("vibe", Some("custom"), None) => Some(CallbackAction::VibeSelect(VibeChoice::Custom)),
            ("vibe", Some("skip"), None) => Some(CallbackAction::VibeSelect(VibeChoice::Skip)),
            ("vibe", Some(code), None) => {
                Some(CallbackAction::VibeSelect(VibeChoice::Preset(code.to_string())))
            }
            ("free", Some(code), None) => Some(CallbackAction::FreeTimeSelect(code.to_string())),
            ("jio_type", Some(kind), None) => {
                InvitationKind::parse(kind).map(CallbackAction::JioKindSelect)
            }
            ("jio_loc", Some("nearby"), None) => {
                Some(CallbackAction::JioLocationSelect(LocationChoice::Nearby))
            }
            ("jio_loc", Some("flexible"), None) => {
                Some(CallbackAction::JioLocationSelect(LocationChoice::Flexible))
            }
            ("jio_loc", Some("skip"), None) => {
                Some(CallbackAction::JioLocationSelect(LocationChoice::Skip))
            }
            ("quick_jio", Some(kind), None) => {
                InvitationKind::parse(kind).map(CallbackAction::QuickJio)
            }
            ("refresh", Some("whofree"), None) => Some(CallbackAction::RefreshWhofree),
            ("friend", Some("accept"), Some(id)) => {
                Uuid::parse_str(id).ok().map(CallbackAction::FriendAccept)
            }
            ("friend", Some("decline"), Some(id)) => {
                Uuid::parse_str(id).ok().map(CallbackAction::FriendDecline)
            }
            ("menu", Some("status"), None) => Some(CallbackAction::Menu(MenuAction::Status)),
            ("menu", Some("whofree"), None) => Some(CallbackAction::Menu(MenuAction::Whofree)),
            ("menu", Some("jio"), None) => Some(CallbackAction::Menu(MenuAction::Jio)),
            ("menu", Some("invite"), None) => Some(CallbackAction::Menu(MenuAction::Invite)),
            ("cancel_jio", Some(id), None) => {
                Uuid::parse_str(id).ok().map(CallbackAction::CancelJio)
            }
            ("view_responses", Some(id), None) => {
                Uuid::parse_str(id).ok().map(CallbackAction::ViewResponses)
            }
            _ => None,
        };

        decoded.unwrap_or_else(|| CallbackAction::Unknown(raw.to_string()))
    }
}
