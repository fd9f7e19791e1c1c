use anyhow::Context;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::users::repo_types::User;

const USER_COLUMNS: &str = "id, email, nickname, password_hash, found_cards, is_admin, created_at";

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Row-locks the user for the rest of the transaction.
    pub async fn lock_by_id(conn: &mut PgConnection, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
        .context("lock user")?;
        Ok(user)
    }

    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(db)
        .await
        .context("list users")?;
        Ok(users)
    }

    /// Insert a freshly built user. Returns `None` if the email is taken.
    pub async fn insert(&self, db: &PgPool) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, nickname, password_hash, found_cards, is_admin, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.email)
        .bind(&self.nickname)
        .bind(&self.password_hash)
        .bind(&self.found_cards)
        .bind(self.is_admin)
        .bind(self.created_at)
        .fetch_optional(db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    pub async fn set_admin(db: &PgPool, id: Uuid, is_admin: bool) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_admin = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_admin)
        .fetch_optional(db)
        .await
        .context("set admin flag")?;
        Ok(user)
    }

    pub async fn reset_found_cards(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET found_cards = '{{}}' WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("reset found cards")?;
        Ok(user)
    }

    /// Append card ids to the collection, keeping duplicates.
    pub async fn append_found_cards(
        conn: &mut PgConnection,
        id: Uuid,
        card_ids: &[Uuid],
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET found_cards = found_cards || $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(card_ids)
        .fetch_one(conn)
        .await
        .context("append found cards")?;
        Ok(user)
    }
}
