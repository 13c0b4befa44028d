use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest id value; ids are rendered as six hex digits.
pub const MAX_ID: u32 = 0xff_ffff;

/// A stored paste. All five attributes are persisted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteRecord {
    pub id: String,
    pub paste: String,
    pub timestamp: String,
    pub creator_gh_user: String,
    pub recipient_gh_username: String,
}

impl PasteRecord {
    /// Build a fresh record with a generated id and the current time.
    ///
    /// The paste text is normalized with [`escape_quotes`] before it is stored.
    pub fn new(paste: &str, creator_gh_user: &str, recipient_gh_username: &str) -> Self {
        PasteRecord {
            id: generate_id(),
            paste: escape_quotes(paste),
            timestamp: timestamp_now(),
            creator_gh_user: creator_gh_user.to_owned(),
            recipient_gh_username: recipient_gh_username.to_owned(),
        }
    }
}

/// Random id in `0..=MAX_ID`, six lowercase hex digits, zero padded.
///
/// There is no collision check: a duplicate id overwrites the earlier paste.
pub fn generate_id() -> String {
    let value = rand::thread_rng().gen_range(0..=MAX_ID);
    format!("{value:06x}")
}

pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Double every single quote.
pub fn escape_quotes(paste: &str) -> String {
    paste.replace('\'', "''")
}
