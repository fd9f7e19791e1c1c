use anyhow::{bail, Context};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::cards::repo_types::{Card, SaveOutcome};
use crate::expansions::repo_types::Expansion;

const CARD_COLUMNS: &str = r#"c.id, c.name, c.expansion_id, c.image, c.holo, c."order", c.created_at"#;

/// Album order: explicit position first, then creation time.
const CARD_ORDER: &str = r#"c."order" ASC NULLS LAST, c.created_at ASC"#;

const DELETE_ATTEMPTS: usize = 5;

impl Card {
    /// Cards across expansions, optionally narrowed to one.
    /// `published_only` drops cards whose expansion is unpublished.
    pub async fn list(
        db: &PgPool,
        expansion_id: Option<Uuid>,
        published_only: bool,
    ) -> anyhow::Result<Vec<Card>> {
        let rows = sqlx::query_as::<_, Card>(&format!(
            r#"
            SELECT {CARD_COLUMNS}
            FROM cards c
            JOIN expansions e ON e.id = c.expansion_id
            WHERE ($1::uuid IS NULL OR c.expansion_id = $1)
              AND (e.published OR NOT $2)
            ORDER BY {CARD_ORDER}
            "#
        ))
        .bind(expansion_id)
        .bind(published_only)
        .fetch_all(db)
        .await
        .context("list cards")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Card>> {
        let row = sqlx::query_as::<_, Card>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find card")?;
        Ok(row)
    }

    /// Insert and bump the expansion's count. `None` if the expansion is gone.
    pub async fn insert(&self, db: &PgPool) -> anyhow::Result<Option<Card>> {
        let mut tx = db.begin().await.context("begin tx")?;
        if !Expansion::lock(&mut tx, self.expansion_id).await? {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, Card>(&format!(
            r#"
            WITH c AS (
                INSERT INTO cards (id, name, expansion_id, image, holo, "order", created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT {CARD_COLUMNS} FROM c
            "#
        ))
        .bind(self.id)
        .bind(&self.name)
        .bind(self.expansion_id)
        .bind(&self.image)
        .bind(self.holo)
        .bind(self.order)
        .bind(self.created_at)
        .fetch_one(&mut *tx)
        .await
        .context("insert card")?;

        Expansion::recount(&mut tx, self.expansion_id).await?;
        tx.commit().await.context("commit tx")?;
        Ok(Some(row))
    }

    /// Persist an edited card that was read while it sat in `previous_expansion`.
    /// A move locks both expansions (lowest id first) and recounts them.
    pub async fn save(
        &self,
        db: &PgPool,
        previous_expansion: Uuid,
    ) -> anyhow::Result<SaveOutcome> {
        let mut tx = db.begin().await.context("begin tx")?;
        let moved = previous_expansion != self.expansion_id;
        if moved {
            let mut ids = [previous_expansion, self.expansion_id];
            ids.sort();
            for id in ids {
                let found = Expansion::lock(&mut tx, id).await?;
                if !found && id == self.expansion_id {
                    return Ok(SaveOutcome::ExpansionMissing);
                }
            }
        }

        let row = sqlx::query_as::<_, Card>(&format!(
            r#"
            WITH c AS (
                UPDATE cards
                   SET name = $2, expansion_id = $3, image = $4, holo = $5, "order" = $6
                 WHERE id = $1 AND expansion_id = $7
                RETURNING *
            )
            SELECT {CARD_COLUMNS} FROM c
            "#
        ))
        .bind(self.id)
        .bind(&self.name)
        .bind(self.expansion_id)
        .bind(&self.image)
        .bind(self.holo)
        .bind(self.order)
        .bind(previous_expansion)
        .fetch_optional(&mut *tx)
        .await
        .context("update card")?;

        let Some(row) = row else {
            let outcome = match Card::find_in(&mut tx, self.id).await? {
                Some(_) => SaveOutcome::Stale,
                None => SaveOutcome::CardMissing,
            };
            return Ok(outcome);
        };
        if moved {
            Expansion::recount(&mut tx, previous_expansion).await?;
            Expansion::recount(&mut tx, self.expansion_id).await?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(SaveOutcome::Saved(row))
    }

    /// Delete a card and recount its expansion. `false` if the card is gone.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        // a concurrent move can swap the expansion between the read and the lock
        for _ in 0..DELETE_ATTEMPTS {
            let Some(card) = Card::find(db, id).await? else {
                return Ok(false);
            };

            let mut tx = db.begin().await.context("begin tx")?;
            Expansion::lock(&mut tx, card.expansion_id).await?;
            let res = sqlx::query("DELETE FROM cards WHERE id = $1 AND expansion_id = $2")
                .bind(id)
                .bind(card.expansion_id)
                .execute(&mut *tx)
                .await
                .context("delete card")?;
            if res.rows_affected() == 0 {
                continue;
            }

            Expansion::recount(&mut tx, card.expansion_id).await?;
            tx.commit().await.context("commit tx")?;
            return Ok(true);
        }
        bail!("card {id} kept moving during delete")
    }

    async fn find_in(conn: &mut PgConnection, id: Uuid) -> anyhow::Result<Option<Card>> {
        let row = sqlx::query_as::<_, Card>(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
        .context("find card")?;
        Ok(row)
    }
}
