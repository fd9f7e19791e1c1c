use anyhow::Context;
use tracing::{debug, info};
use uuid::Uuid;

use super::{draw::draw_pack, dto::OpenPackResponse};
use crate::{
    cards::repo_types::Card,
    error::{ApiError, ApiResult},
    expansions::repo_types::Expansion,
    state::AppState,
    users::repo_types::User,
};

/// Open one pack of `expansion_id` for `user` and record the drawn cards.
pub async fn open_pack(
    st: &AppState,
    user: &User,
    expansion_id: Uuid,
) -> ApiResult<OpenPackResponse> {
    let expansion = Expansion::find(&st.db, expansion_id)
        .await?
        .filter(|e| e.published || user.is_admin)
        .ok_or(ApiError::NotFound("expansion"))?;

    let pool = Card::list(&st.db, Some(expansion.id), false).await?;
    if pool.is_empty() {
        return Err(ApiError::Conflict(format!(
            "expansion {} has no cards",
            expansion.name
        )));
    }
    let cards = draw_pack(&pool, st.config.pack_size, &mut rand::thread_rng());
    debug!(pool = pool.len(), drawn = cards.len(), "pack drawn");

    // lock the user so concurrent openings see each other's finds
    let mut tx = st.db.begin().await.context("begin tx")?;
    let locked = User::lock_by_id(&mut tx, user.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user not found".into()))?;

    let drawn_ids: Vec<Uuid> = cards.iter().map(|c| c.id).collect();
    let response = OpenPackResponse::new(cards, &locked.found_cards);
    User::append_found_cards(&mut tx, user.id, &drawn_ids).await?;
    tx.commit().await.context("commit tx")?;

    info!(
        user_id = %user.id,
        expansion_id = %expansion.id,
        new_cards = response.new_unique_cards.len(),
        "pack opened"
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{card, expansion, user};
    use sqlx::PgPool;

    #[sqlx::test]
    #[cfg_attr(not(feature = "db-tests"), ignore = "needs DATABASE_URL")]
    async fn pack_appends_every_draw_and_reports_new_once(db: PgPool) {
        let st = AppState::with_pool(db.clone());
        let exp = expansion(&db, true).await;
        let only = card(&db, exp.id, "Mew").await;
        let ash = user(&db, false).await;

        let first = open_pack(&st, &ash, exp.id).await.unwrap();
        assert_eq!(first.cards.len(), 5);
        assert_eq!(first.new_unique_cards, vec![only.id]);

        let second = open_pack(&st, &ash, exp.id).await.unwrap();
        assert!(second.new_unique_cards.is_empty());

        let found = User::find_by_id(&db, ash.id).await.unwrap().unwrap().found_cards;
        assert_eq!(found, vec![only.id; 10]);
    }

    #[sqlx::test]
    #[cfg_attr(not(feature = "db-tests"), ignore = "needs DATABASE_URL")]
    async fn new_cards_checked_against_current_collection(db: PgPool) {
        let st = AppState::with_pool(db.clone());
        let exp = expansion(&db, true).await;
        let only = card(&db, exp.id, "Mew").await;
        let ash = user(&db, false).await;

        // collection changed after the caller loaded `ash`
        let mut conn = db.acquire().await.unwrap();
        User::append_found_cards(&mut conn, ash.id, &[only.id]).await.unwrap();
        drop(conn);

        let resp = open_pack(&st, &ash, exp.id).await.unwrap();
        assert!(resp.new_unique_cards.is_empty());
    }

    #[sqlx::test]
    #[cfg_attr(not(feature = "db-tests"), ignore = "needs DATABASE_URL")]
    async fn concurrent_openings_report_a_new_card_once(db: PgPool) {
        let st = AppState::with_pool(db.clone());
        let exp = expansion(&db, true).await;
        let only = card(&db, exp.id, "Mew").await;
        let ash = user(&db, false).await;

        let exp_id = exp.id;
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (st, ash) = (st.clone(), ash.clone());
                tokio::spawn(async move { open_pack(&st, &ash, exp_id).await })
            })
            .collect();
        let mut reported = 0;
        for handle in handles {
            reported += handle.await.unwrap().unwrap().new_unique_cards.len();
        }
        assert_eq!(reported, 1);

        let found = User::find_by_id(&db, ash.id).await.unwrap().unwrap().found_cards;
        assert_eq!(found.len(), 40);
        assert!(found.iter().all(|id| *id == only.id));
    }

    #[sqlx::test]
    #[cfg_attr(not(feature = "db-tests"), ignore = "needs DATABASE_URL")]
    async fn unpublished_expansion_is_hidden_from_players(db: PgPool) {
        let st = AppState::with_pool(db.clone());
        let draft = expansion(&db, false).await;
        card(&db, draft.id, "Mewtwo").await;
        let player = user(&db, false).await;
        let admin = user(&db, true).await;

        let err = open_pack(&st, &player, draft.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("expansion")), "{err:?}");
        assert!(User::find_by_id(&db, player.id).await.unwrap().unwrap().found_cards.is_empty());

        assert_eq!(open_pack(&st, &admin, draft.id).await.unwrap().cards.len(), 5);
    }

    #[sqlx::test]
    #[cfg_attr(not(feature = "db-tests"), ignore = "needs DATABASE_URL")]
    async fn empty_or_unknown_expansion_is_rejected(db: PgPool) {
        let st = AppState::with_pool(db.clone());
        let empty = expansion(&db, true).await;
        let ash = user(&db, false).await;

        let err = open_pack(&st, &ash, empty.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)), "{err:?}");

        let err = open_pack(&st, &ash, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("expansion")), "{err:?}");
    }
}
