use serde::Deserialize;

use crate::defaults::{new_id, now_utc};
use crate::expansions::repo_types::Expansion;
use crate::validation::Validate;

#[derive(Debug, Clone, Deserialize)]
pub struct ExpansionCreate {
    pub name: String,
    pub description: String,
    pub color: String,
    pub image: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl ExpansionCreate {
    pub fn into_expansion(self) -> Expansion {
        Expansion {
            id: new_id(),
            name: self.name,
            description: self.description,
            color: self.color,
            total_cards: 0,
            image: self.image.unwrap_or_default(),
            published: self.published,
            created_at: now_utc(),
        }
    }
}

impl Validate for ExpansionCreate {
    const REQUIRED: &'static [&'static str] = &["name", "description", "color"];
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpansionUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

impl ExpansionUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.image.is_none()
            && self.published.is_none()
    }

    pub fn apply(self, expansion: &mut Expansion) {
        if let Some(name) = self.name {
            expansion.name = name;
        }
        if let Some(description) = self.description {
            expansion.description = description;
        }
        if let Some(color) = self.color {
            expansion.color = color;
        }
        if let Some(image) = self.image {
            expansion.image = image;
        }
        if let Some(published) = self.published {
            expansion.published = published;
        }
    }
}

impl Validate for ExpansionUpdate {}
