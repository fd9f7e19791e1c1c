use anyhow::Context;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::expansions::repo_types::Expansion;

const EXPANSION_COLUMNS: &str =
    "id, name, description, color, total_cards, image, published, created_at";

impl Expansion {
    /// All expansions, oldest first. `published_only` hides drafts.
    pub async fn list(db: &PgPool, published_only: bool) -> anyhow::Result<Vec<Expansion>> {
        let rows = sqlx::query_as::<_, Expansion>(&format!(
            r#"
            SELECT {EXPANSION_COLUMNS}
            FROM expansions
            WHERE published OR NOT $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(published_only)
        .fetch_all(db)
        .await
        .context("list expansions")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Expansion>> {
        let row = sqlx::query_as::<_, Expansion>(&format!(
            "SELECT {EXPANSION_COLUMNS} FROM expansions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find expansion")?;
        Ok(row)
    }

    /// Row-lock an expansion for the rest of the transaction. Card writes
    /// take this before touching `cards`, which serializes recounts.
    /// `false` if it doesn't exist.
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> anyhow::Result<bool> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM expansions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("lock expansion")?;
        Ok(row.is_some())
    }

    pub async fn insert(&self, db: &PgPool) -> anyhow::Result<Expansion> {
        let row = sqlx::query_as::<_, Expansion>(&format!(
            r#"
            INSERT INTO expansions (id, name, description, color, total_cards, image, published, created_at)
            VALUES ($1, $2, $3, $4, 0, $5, $6, $7)
            RETURNING {EXPANSION_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(&self.color)
        .bind(&self.image)
        .bind(self.published)
        .bind(self.created_at)
        .fetch_one(db)
        .await
        .context("insert expansion")?;
        Ok(row)
    }

    /// Persist the editable fields. `total_cards` is owned by [`Expansion::recount`].
    pub async fn save(&self, db: &PgPool) -> anyhow::Result<Option<Expansion>> {
        let row = sqlx::query_as::<_, Expansion>(&format!(
            r#"
            UPDATE expansions
               SET name = $2, description = $3, color = $4, image = $5, published = $6
             WHERE id = $1
            RETURNING {EXPANSION_COLUMNS}
            "#
        ))
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(&self.color)
        .bind(&self.image)
        .bind(self.published)
        .fetch_optional(db)
        .await
        .context("update expansion")?;
        Ok(row)
    }

    /// Delete an expansion; its cards go with it.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM expansions WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete expansion")?;
        Ok(res.rows_affected() > 0)
    }

    /// Sync `total_cards` with the cards table. Call with the row locked.
    pub async fn recount(conn: &mut PgConnection, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE expansions
               SET total_cards = (SELECT COUNT(*)::INT FROM cards WHERE expansion_id = $1)
             WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await
        .context("recount expansion cards")?;
        Ok(())
    }
}
