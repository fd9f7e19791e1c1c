use serde::Deserialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::defaults::{new_id, now_utc};

/// User record in the database.
///
/// Not `Serialize`; clients only ever see
/// [`UserResponse`](crate::users::dto::UserResponse).
#[derive(Clone, PartialEq, Deserialize, FromRow)]
pub struct User {
    #[serde(default = "new_id")]
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub password_hash: String, // argon2 PHC string
    #[serde(default)]
    pub found_cards: Vec<Uuid>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "now_utc", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(email: String, nickname: String, password_hash: String) -> Self {
        Self {
            id: new_id(),
            email,
            nickname,
            password_hash,
            found_cards: Vec::new(),
            is_admin: false,
            created_at: now_utc(),
        }
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("nickname", &self.nickname)
            .field("found_cards", &self.found_cards.len())
            .field("is_admin", &self.is_admin)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_defaults() {
        let before = OffsetDateTime::now_utc();
        let user = User::new("a@b.com".into(), "Ash".into(), "$argon2id$stub".into());
        assert!(user.found_cards.is_empty());
        assert!(!user.is_admin);
        assert!(user.created_at >= before);
    }

    #[test]
    fn deserialize_fills_generated_fields() {
        let before = OffsetDateTime::now_utc();
        let user: User = serde_json::from_str(
            r#"{"email":"a@b.com","nickname":"Ash","password_hash":"h"}"#,
        )
        .unwrap();
        assert!(!user.id.is_nil());
        assert!(user.created_at >= before);
        assert!(user.found_cards.is_empty());
        assert!(!user.is_admin);
    }

    #[test]
    fn debug_omits_hash() {
        let user = User::new("a@b.com".into(), "Ash".into(), "secret-hash".into());
        assert!(!format!("{user:?}").contains("secret-hash"));
    }
}
