use serde::Deserialize;
use uuid::Uuid;

use crate::cards::repo_types::Card;
use crate::defaults::{new_id, now_utc};
use crate::validation::{present, Validate};

#[derive(Debug, Clone, Deserialize)]
pub struct CardCreate {
    pub name: String,
    pub expansion_id: Uuid,
    pub image: String,
    #[serde(default)]
    pub holo: bool,
    pub order: Option<i32>,
}

impl CardCreate {
    pub fn into_card(self) -> Card {
        Card {
            id: new_id(),
            name: self.name,
            expansion_id: self.expansion_id,
            image: self.image,
            holo: self.holo,
            order: self.order,
            created_at: now_utc(),
        }
    }
}

impl Validate for CardCreate {
    const REQUIRED: &'static [&'static str] = &["name", "expansion_id", "image"];
}

/// Partial update. `order` is tri-state: absent keeps it, `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub expansion_id: Option<Uuid>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub holo: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub order: Option<Option<i32>>,
}

impl CardUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.expansion_id.is_none()
            && self.image.is_none()
            && self.holo.is_none()
            && self.order.is_none()
    }

    pub fn apply(self, card: &mut Card) {
        if let Some(name) = self.name {
            card.name = name;
        }
        if let Some(expansion_id) = self.expansion_id {
            card.expansion_id = expansion_id;
        }
        if let Some(image) = self.image {
            card.image = image;
        }
        if let Some(holo) = self.holo {
            card.holo = holo;
        }
        if let Some(order) = self.order {
            card.order = order;
        }
    }
}

impl Validate for CardUpdate {}
