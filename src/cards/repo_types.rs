use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::defaults::{new_id, now_utc};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Card {
    #[serde(default = "new_id")]
    pub id: Uuid,
    pub name: String,
    pub expansion_id: Uuid,
    pub image: String, // base64 data URI or hosted URL
    #[serde(default)]
    pub holo: bool,
    /// Display position inside the expansion; `None` sorts after ordered cards.
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default = "now_utc", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Result of [`Card::save`].
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(Card),
    CardMissing,
    /// The target expansion of a move doesn't exist.
    ExpansionMissing,
    /// The card moved to another expansion after it was read.
    Stale,
}
