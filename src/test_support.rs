//! Row builders for database-backed tests.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    cards::repo_types::Card,
    defaults::{new_id, now_utc},
    expansions::repo_types::Expansion,
    users::repo_types::User,
};

pub async fn expansion(db: &PgPool, published: bool) -> Expansion {
    Expansion {
        id: new_id(),
        name: "Base Set".into(),
        description: "the first one".into(),
        color: "#ffcc00".into(),
        total_cards: 0,
        image: String::new(),
        published,
        created_at: now_utc(),
    }
    .insert(db)
    .await
    .expect("insert expansion")
}

pub fn card_in(expansion_id: Uuid, name: &str) -> Card {
    Card {
        id: new_id(),
        name: name.into(),
        expansion_id,
        image: "x".into(),
        holo: false,
        order: None,
        created_at: now_utc(),
    }
}

pub async fn card(db: &PgPool, expansion_id: Uuid, name: &str) -> Card {
    card_in(expansion_id, name)
        .insert(db)
        .await
        .expect("insert card")
        .expect("expansion exists")
}

pub async fn user(db: &PgPool, is_admin: bool) -> User {
    let mut user = User::new(
        format!("{}@pallet.town", new_id().simple()),
        "Ash".into(),
        "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
    );
    user.is_admin = is_admin;
    user.insert(db).await.expect("insert user").expect("fresh email")
}

pub async fn total_cards(db: &PgPool, expansion_id: Uuid) -> i32 {
    Expansion::find(db, expansion_id)
        .await
        .expect("find expansion")
        .expect("expansion exists")
        .total_cards
}
