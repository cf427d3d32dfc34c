use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::models::invitation::InvitationKind;

/// What the next free-text message from a conversation will be consumed
/// as. Anything other than `None` overrides command parsing for exactly
/// one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AwaitingInput {
    #[default]
    None,
    VibeText,
    CustomTitle,
    CustomLocation,
}

/// A jio being assembled across multiple hops of the custom-create flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftInvitation {
    pub kind: InvitationKind,
    pub title: Option<String>,
    pub location: Option<String>,
}

impl DraftInvitation {
    pub fn new(kind: InvitationKind) -> Self {
        Self {
            kind,
            title: None,
            location: None,
        }
    }
}

/// Per-conversation transient state. One instance per chat, created
/// lazily, living for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    /// Bound once the account behind this chat is known.
    pub user_id: Option<Uuid>,
    pub awaiting: AwaitingInput,
    pub draft: Option<DraftInvitation>,
}

/// In-memory conversation state, keyed by chat id.
///
/// Only the router mutates this, and the chat platform delivers at most
/// one event per conversation at a time, so the mutex is contended only
/// across different conversations.
#[derive(Default)]
pub struct ConversationStateStore {
    inner: Mutex<HashMap<i64, ConversationState>>,
}

impl ConversationStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the conversation's state, creating an empty one on
    /// first access.
    pub fn get(&self, chat_id: i64) -> ConversationState {
        let mut map = self.inner.lock().expect("conversation state lock poisoned");
        map.entry(chat_id).or_default().clone()
    }

    /// Apply a mutation to the conversation's state.
    pub fn update<F>(&self, chat_id: i64, mutate: F)
    where
        F: FnOnce(&mut ConversationState),
    {
        let mut map = self.inner.lock().expect("conversation state lock poisoned");
        mutate(map.entry(chat_id).or_default());
    }

    /// Discard any in-progress flow: awaited input and draft alike.
    /// The identity binding survives.
    pub fn clear_flow(&self, chat_id: i64) {
        self.update(chat_id, |state| {
            state.awaiting = AwaitingInput::None;
            state.draft = None;
        });
    }
}
