use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered user. Created on first contact with the bot, never deleted.
/// Only the platform handle and display name are ever refreshed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    /// Chat-platform user id. Stable for the lifetime of the account.
    pub chat_id: i64,
    /// Platform username, refreshed whenever the user contacts the bot.
    pub handle: Option<String>,
    pub display_name: String,
    /// Short code friends use to connect. Six lowercase alphanumerics.
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
}

/// Generate a fresh invite code.
pub fn generate_invite_code() -> String {
    use rand::Rng;
    const ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
