use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::defaults::{new_id, now_utc};

/// A card set. Only `published` expansions are visible to non-admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Expansion {
    #[serde(default = "new_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub color: String,
    /// Number of cards referencing this expansion; recounted on every card write.
    #[serde(default)]
    pub total_cards: i32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default = "now_utc", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
