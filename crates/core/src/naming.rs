//! Identifier and timestamp formatting shared by jobs, tickets and chats.
//!
//! Job and ticket ids are short human-readable tokens (`JOB-48213`), not
//! globally unique keys; stores that need uniqueness check on insert.

use rand::Rng;

use crate::types::Timestamp;

/// Prefix for generation job ids.
pub const JOB_ID_PREFIX: &str = "JOB";

/// Smallest numeric suffix of a short token (always five digits).
const TOKEN_MIN: u32 = 10_000;

/// Largest numeric suffix of a short token.
const TOKEN_MAX: u32 = 99_999;

/// Build a short token `"{prefix}-nnnnn"` with a random five-digit suffix.
pub fn short_token(prefix: &str) -> String {
    short_token_with(&mut rand::rng(), prefix)
}

/// Same as [`short_token`] but drawing from the supplied RNG.
pub fn short_token_with<R: Rng + ?Sized>(rng: &mut R, prefix: &str) -> String {
    let n = rng.random_range(TOKEN_MIN..=TOKEN_MAX);
    format!("{prefix}-{n}")
}

/// A fresh opaque id for conversations and chat messages.
pub fn opaque_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

/// Render a timestamp the way the portals list it: `YYYY-MM-DD HH:MM`.
pub fn display_timestamp(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// Truncate `text` to at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
