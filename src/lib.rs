//! Backend for the SlowlyCard collectible-card album: users open packs of
//! published expansions and collect the cards they find.

pub mod app;
pub mod auth;
pub mod cards;
pub mod config;
pub mod defaults;
pub mod error;
pub mod expansions;
pub mod packs;
pub mod state;
pub mod users;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;
