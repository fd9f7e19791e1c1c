use rand::{seq::SliceRandom, Rng};

use crate::cards::repo_types::Card;

/// Draw `size` cards uniformly, with replacement, from an expansion's cards.
///
/// The pack comes back sorted by `order` (unordered cards last, draw order
/// kept among equals). An empty pool yields an empty pack.
pub fn draw_pack<R: Rng + ?Sized>(pool: &[Card], size: usize, rng: &mut R) -> Vec<Card> {
    let mut pack: Vec<Card> = (0..size)
        .filter_map(|_| pool.choose(&mut *rng).cloned())
        .collect();
    pack.sort_by_key(|c| (c.order.is_none(), c.order));
    pack
}
