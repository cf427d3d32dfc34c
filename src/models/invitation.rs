use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// How long a jio stays open for responses.
pub fn invitation_window() -> Duration {
    Duration::hours(2)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
#[serde(rename_all = "lowercase")]
pub enum InvitationKind {
    #[sqlx(rename = "coffee")]
    Coffee,
    #[sqlx(rename = "food")]
    Food,
    #[sqlx(rename = "study")]
    Study,
    #[sqlx(rename = "game")]
    Game,
    #[sqlx(rename = "movie")]
    Movie,
    #[sqlx(rename = "chill")]
    Chill,
    #[sqlx(rename = "custom")]
    Custom,
}

impl InvitationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationKind::Coffee => "coffee",
            InvitationKind::Food => "food",
            InvitationKind::Study => "study",
            InvitationKind::Game => "game",
            InvitationKind::Movie => "movie",
            InvitationKind::Chill => "chill",
            InvitationKind::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "coffee" => Some(InvitationKind::Coffee),
            "food" => Some(InvitationKind::Food),
            "study" => Some(InvitationKind::Study),
            "game" => Some(InvitationKind::Game),
            "movie" => Some(InvitationKind::Movie),
            "chill" => Some(InvitationKind::Chill),
            "custom" => Some(InvitationKind::Custom),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            InvitationKind::Coffee => "☕",
            InvitationKind::Food => "🍜",
            InvitationKind::Study => "📚",
            InvitationKind::Game => "🎮",
            InvitationKind::Movie => "🎬",
            InvitationKind::Chill => "😎",
            InvitationKind::Custom => "🎯",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            InvitationKind::Coffee => "Kopi anyone?",
            InvitationKind::Food => "Makan anyone?",
            InvitationKind::Study => "Study session?",
            InvitationKind::Game => "Game sesh?",
            InvitationKind::Movie => "Movie anyone?",
            InvitationKind::Chill => "Chill?",
            InvitationKind::Custom => "Hang out?",
        }
    }
}

/// Lifecycle: active is the only non-terminal state.
/// Cancelled comes from the creator, expired from the external sweep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[sqlx(rename = "active")]
    Active,
    #[sqlx(rename = "cancelled")]
    Cancelled,
    #[sqlx(rename = "expired")]
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub kind: InvitationKind,
    pub title: String,
    pub location_text: Option<String>,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub creator_id: Uuid,
    pub kind: InvitationKind,
    pub title: String,
    pub location_text: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
#[serde(rename_all = "lowercase")]
pub enum RsvpKind {
    #[sqlx(rename = "interested")]
    Interested,
    #[sqlx(rename = "joined")]
    Joined,
    #[sqlx(rename = "declined")]
    Declined,
    #[sqlx(rename = "maybe")]
    Maybe,
}

impl RsvpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpKind::Interested => "interested",
            RsvpKind::Joined => "joined",
            RsvpKind::Declined => "declined",
            RsvpKind::Maybe => "maybe",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "interested" => Some(RsvpKind::Interested),
            "joined" => Some(RsvpKind::Joined),
            "declined" => Some(RsvpKind::Declined),
            "maybe" => Some(RsvpKind::Maybe),
            _ => None,
        }
    }

    /// Short confirmation shown to the responder themselves.
    pub fn ack_text(&self) -> &'static str {
        match self {
            RsvpKind::Joined => "You're in! 🎉",
            RsvpKind::Maybe => "Marked as maybe 🤔",
            RsvpKind::Declined => "No worries, maybe next time! 👋",
            RsvpKind::Interested => "Marked as interested! 👀",
        }
    }

    /// Verb phrase used when telling the creator about this response.
    pub fn action_text(&self) -> &'static str {
        match self {
            RsvpKind::Joined => "is in",
            RsvpKind::Interested => "is interested",
            RsvpKind::Maybe => "might join",
            RsvpKind::Declined => "can't make it",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RsvpKind::Joined => "🙋",
            RsvpKind::Interested => "👀",
            RsvpKind::Maybe => "🤔",
            RsvpKind::Declined => "😢",
        }
    }
}

/// A response row joined with the responder's display name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RsvpWithName {
    pub user_id: Uuid,
    pub display_name: String,
    pub kind: RsvpKind,
    pub responded_at: DateTime<Utc>,
}

/// Responses grouped for the creator's summary view.
/// Declines are counted but never listed by name.
#[derive(Debug, Clone, Default)]
pub struct ResponseSummary {
    pub joined: Vec<String>,
    pub interested: Vec<String>,
    pub maybe: Vec<String>,
    pub declined_count: usize,
}

impl ResponseSummary {
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.interested.is_empty() && self.maybe.is_empty()
    }
}

/// One entry of the visible-invitations listing: an active jio from a
/// friend, shaped at the store boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvitationSummary {
    pub id: Uuid,
    pub creator_name: String,
    pub kind: InvitationKind,
    pub title: String,
    pub location_text: Option<String>,
    pub expires_at: DateTime<Utc>,
}
