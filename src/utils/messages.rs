use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::invitation::{Invitation, InvitationSummary, ResponseSummary};
use crate::models::presence::{FriendPresence, PresenceKind};
use crate::services::channel::{InlineButton, Keyboard};
use crate::utils::time_parser::format_relative_time;

/// Vibe preset codes and their stored text.
pub fn vibe_text_for_code(code: &str) -> Option<&'static str> {
    match code {
        "down" => Some("Down for anything"),
        "food" => Some("Need food"),
        "bored" => Some("Bored af"),
        "study" => Some("Can study"),
        "chill" => Some("Just wanna chill"),
        "active" => Some("Feeling active"),
        _ => None,
    }
}

// ── Keyboards ───────────────────────────────────────────────────────────

pub fn jio_response_keyboard(jio_id: Uuid) -> Keyboard {
    vec![
        vec![
            InlineButton::new("I'm in! 🙋", format!("jio:joined:{}", jio_id)),
            InlineButton::new("Maybe 🤔", format!("jio:maybe:{}", jio_id)),
        ],
        vec![InlineButton::new("Can't 😢", format!("jio:declined:{}", jio_id))],
    ]
}

pub fn creator_controls_keyboard(jio_id: Uuid) -> Keyboard {
    vec![
        vec![InlineButton::new("❌ Cancel Jio", format!("cancel_jio:{}", jio_id))],
        vec![InlineButton::new(
            "👥 View Responses",
            format!("view_responses:{}", jio_id),
        )],
    ]
}

pub fn jio_kind_keyboard() -> Keyboard {
    vec![
        vec![
            InlineButton::new("☕ Kopi", "jio_type:coffee"),
            InlineButton::new("🍜 Makan", "jio_type:food"),
        ],
        vec![
            InlineButton::new("📚 Study", "jio_type:study"),
            InlineButton::new("🎮 Game", "jio_type:game"),
        ],
        vec![
            InlineButton::new("🎬 Movie", "jio_type:movie"),
            InlineButton::new("😎 Chill", "jio_type:chill"),
        ],
        vec![InlineButton::new("✍️ Custom", "jio_type:custom")],
    ]
}

pub fn jio_location_keyboard() -> Keyboard {
    vec![
        vec![
            InlineButton::new("📍 Nearby", "jio_loc:nearby"),
            InlineButton::new("🤷 Flexible", "jio_loc:flexible"),
        ],
        vec![InlineButton::new("➡️ Skip location", "jio_loc:skip")],
    ]
}

pub fn free_time_keyboard() -> Keyboard {
    vec![
        vec![
            InlineButton::new("1 hour", "free:1h"),
            InlineButton::new("2 hours", "free:2h"),
            InlineButton::new("3 hours", "free:3h"),
        ],
        vec![
            InlineButton::new("Until 5pm", "free:until_17"),
            InlineButton::new("Until 8pm", "free:until_20"),
            InlineButton::new("Until tonight", "free:until_22"),
        ],
        vec![InlineButton::new("All day", "free:all_day")],
    ]
}

pub fn vibe_keyboard() -> Keyboard {
    vec![
        vec![InlineButton::new("😎 Down for anything", "vibe:down")],
        vec![
            InlineButton::new("🍜 Need food", "vibe:food"),
            InlineButton::new("😴 Bored af", "vibe:bored"),
        ],
        vec![
            InlineButton::new("📚 Can study", "vibe:study"),
            InlineButton::new("✍️ Custom", "vibe:custom"),
        ],
        vec![InlineButton::new("➡️ Skip", "vibe:skip")],
    ]
}

pub fn main_menu_keyboard() -> Keyboard {
    vec![
        vec![InlineButton::new("🟢 Set Status", "menu:status")],
        vec![InlineButton::new("👀 Who's Free", "menu:whofree")],
        vec![InlineButton::new("🎯 Create Jio", "menu:jio")],
    ]
}

pub fn friend_request_keyboard(friendship_id: Uuid) -> Keyboard {
    vec![vec![
        InlineButton::new("✅ Accept", format!("friend:accept:{}", friendship_id)),
        InlineButton::new("❌ Decline", format!("friend:decline:{}", friendship_id)),
    ]]
}

// ── Copy ────────────────────────────────────────────────────────────────

pub const REGISTER_FIRST: &str = "You're not registered yet! Please use /start to get started.";
pub const GENERIC_FAILURE: &str = "Something went wrong. Try again!";
pub const JIO_UNAVAILABLE: &str = "This jio has expired or been cancelled.";

pub fn welcome_text(invite_code: &str) -> String {
    format!(
        "Yo! Welcome to Lepak 🤙\n\n\
         See when friends are free. Make spontaneous plans.\n\
         No more texting \"you free?\" to 10 people.\n\n\
         Your invite code: {}\n\
         Share this with friends!\n\n\
         Quick start:\n\
         /free 2h — \"I'm free for 2 hours\"\n\
         /whofree — See who's available now\n\
         /kopi — Jio friends for coffee",
        invite_code
    )
}

pub fn welcome_back_text(display_name: &str, invite_code: &str) -> String {
    format!(
        "Welcome back, {}! 🤙\n\n\
         Quick commands:\n\
         /free 2h — Set yourself as free\n\
         /whofree — See who's available\n\
         /kopi — Jio friends for coffee\n\
         /makan — Jio friends for food\n\n\
         Your invite code: {}",
        display_name, invite_code
    )
}

pub fn help_text() -> String {
    "🤙 Lepak Commands\n\n\
     Status:\n\
     /free [time] — Set yourself as free\n\
     Examples: /free 2h, /free 5pm, /free tonight\n\
     /busy — Set yourself as busy\n\n\
     Social:\n\
     /whofree — See who's available now\n\
     /jios — See your friends' open jios\n\
     /friends [code] — Manage friends or add one by code\n\n\
     Jios:\n\
     /kopi — Quick coffee jio\n\
     /makan — Quick food jio\n\
     /jio [activity] — Custom hangout invite\n\n\
     Other:\n\
     /help — Show this message\n\
     /start — Get started or see your profile"
        .to_string()
}

pub fn time_examples_text(input: &str) -> String {
    format!(
        "Couldn't understand \"{}\"\n\n\
         Try:\n\
         • /free 2h — Free for 2 hours\n\
         • /free 5pm — Free until 5pm\n\
         • /free 30m — Free for 30 minutes\n\
         • /free tonight — Free until tonight",
        input
    )
}

/// The message fanned out to each eligible friend.
pub fn fanout_invite_text(invitation: &Invitation, creator_name: &str) -> String {
    let mut text = format!(
        "{} {} wants to hang!\n\n\"{}\"\n",
        invitation.kind.emoji(),
        creator_name,
        invitation.title
    );
    if let Some(location) = &invitation.location_text {
        text.push_str(&format!("📍 {}\n", location));
    }
    text.push_str("⏰ Now\n\nYou're marked as free. You in?");
    text
}

/// Confirmation shown to the creator after create + fanout.
pub fn jio_sent_text(invitation: &Invitation, notified: usize) -> String {
    let mut text = format!(
        "{} Jio sent!\n\n\"{}\"\n",
        invitation.kind.emoji(),
        invitation.title
    );
    if let Some(location) = &invitation.location_text {
        text.push_str(&format!("📍 {}\n", location));
    }
    let plural = if notified == 1 { "" } else { "s" };
    text.push_str(&format!(
        "\n📢 Notified {} free friend{}\n⏰ Expires in 2 hours\n\n\
         I'll let you know when people respond!",
        notified, plural
    ));
    text
}

pub fn response_summary_text(summary: &ResponseSummary) -> String {
    let mut text = String::from("👥 Responses\n\n");

    if !summary.joined.is_empty() {
        text.push_str("🙋 In:\n");
        for name in &summary.joined {
            text.push_str(&format!("• {}\n", name));
        }
        text.push('\n');
    }
    if !summary.interested.is_empty() {
        text.push_str("👀 Interested:\n");
        for name in &summary.interested {
            text.push_str(&format!("• {}\n", name));
        }
        text.push('\n');
    }
    if !summary.maybe.is_empty() {
        text.push_str("🤔 Maybe:\n");
        for name in &summary.maybe {
            text.push_str(&format!("• {}\n", name));
        }
    }
    text
}

/// The grouped friends-status listing for /whofree.
pub fn whofree_text(friends: &[FriendPresence], now: DateTime<Utc>) -> String {
    let free_now: Vec<_> = friends
        .iter()
        .filter(|f| f.kind == PresenceKind::Free)
        .collect();
    let free_later: Vec<_> = friends
        .iter()
        .filter(|f| f.kind == PresenceKind::FreeLater)
        .collect();
    let busy: Vec<_> = friends
        .iter()
        .filter(|f| f.kind == PresenceKind::Busy)
        .collect();
    let offline_count = friends
        .iter()
        .filter(|f| f.kind == PresenceKind::Offline)
        .count();

    let mut text = String::from("👥 Friends' Status\n\n");

    if !free_now.is_empty() {
        text.push_str("🟢 FREE NOW\n");
        for friend in &free_now {
            let until = friend
                .free_until
                .map(|t| format!(" ({})", format_relative_time(t, now)))
                .unwrap_or_default();
            let vibe = friend
                .vibe_text
                .as_ref()
                .map(|v| format!(" — \"{}\"", v))
                .unwrap_or_default();
            let location = friend
                .location_text
                .as_ref()
                .map(|l| format!(" 📍{}", l))
                .unwrap_or_default();
            text.push_str(&format!("• {}{}{}{}\n", friend.display_name, until, vibe, location));
        }
        text.push('\n');
    }

    if !free_later.is_empty() {
        text.push_str("🟡 FREE LATER\n");
        for friend in &free_later {
            let after = friend
                .free_after
                .map(|t| format!(" — free {}", format_relative_time(t, now)))
                .unwrap_or_default();
            text.push_str(&format!("• {}{}\n", friend.display_name, after));
        }
        text.push('\n');
    }

    if !busy.is_empty() {
        text.push_str("🔴 BUSY\n");
        for friend in busy.iter().take(5) {
            text.push_str(&format!("• {}\n", friend.display_name));
        }
        if busy.len() > 5 {
            text.push_str(&format!("  +{} more\n", busy.len() - 5));
        }
        text.push('\n');
    }

    if offline_count > 0 {
        text.push_str(&format!("⚫ {} offline\n", offline_count));
    }

    text
}

/// Quick-create and refresh controls under the /whofree listing.
pub fn whofree_keyboard(anyone_free: bool) -> Keyboard {
    let mut rows = Vec::new();
    if anyone_free {
        rows.push(vec![InlineButton::new("☕ Jio for Kopi", "quick_jio:coffee")]);
        rows.push(vec![InlineButton::new("🍜 Jio for Makan", "quick_jio:food")]);
    }
    rows.push(vec![InlineButton::new("🔄 Refresh", "refresh:whofree")]);
    rows
}

/// The /jios listing of friends' open invitations, with an interested
/// control per entry.
pub fn listing_text(listing: &[InvitationSummary], now: DateTime<Utc>) -> String {
    let mut text = String::from("🎯 Open jios from your friends\n\n");
    for entry in listing {
        let location = entry
            .location_text
            .as_ref()
            .map(|l| format!(" 📍{}", l))
            .unwrap_or_default();
        text.push_str(&format!(
            "{} \"{}\" — {}{} ({})\n",
            entry.kind.emoji(),
            entry.title,
            entry.creator_name,
            location,
            format_relative_time(entry.expires_at, now)
        ));
    }
    text
}

pub fn listing_keyboard(listing: &[InvitationSummary]) -> Keyboard {
    listing
        .iter()
        .map(|entry| {
            vec![InlineButton::new(
                format!("👀 Interested: {}", entry.title),
                format!("jio:interested:{}", entry.id),
            )]
        })
        .collect()
}
