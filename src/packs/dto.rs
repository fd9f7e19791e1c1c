use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cards::repo_types::Card;
use crate::validation::Validate;

#[derive(Debug, Clone, Deserialize)]
pub struct OpenPackRequest {
    pub expansion_id: Uuid,
}

impl Validate for OpenPackRequest {
    const REQUIRED: &'static [&'static str] = &["expansion_id"];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPackResponse {
    pub cards: Vec<Card>,
    /// Drawn card ids the user did not own before this pack, each listed once.
    pub new_unique_cards: Vec<Uuid>,
}

impl OpenPackResponse {
    /// `found_cards` is the user's collection as it was before the draw.
    pub fn new(cards: Vec<Card>, found_cards: &[Uuid]) -> Self {
        let owned: HashSet<Uuid> = found_cards.iter().copied().collect();
        let mut seen = HashSet::new();
        let new_unique_cards = cards
            .iter()
            .map(|c| c.id)
            .filter(|id| !owned.contains(id) && seen.insert(*id))
            .collect();
        Self {
            cards,
            new_unique_cards,
        }
    }
}
