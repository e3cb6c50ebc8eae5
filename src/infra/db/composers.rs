use async_trait::async_trait;

use crate::application::pagination::{CursorPage, IdCursor, PageRequest, page_from_rows};
use crate::application::repos::{ComposersRepo, ItemCounts, RepoError};
use crate::domain::entities::{ComposerRecord, MovementRecord, PieceRecord};

use super::PostgresRepositories;
use super::rows::{
    COMPOSER_COLUMNS, ComposerRow, CountsRow, MOVEMENT_COLUMNS, MovementRow, PIECE_COLUMNS,
    PieceRow,
};
use super::util::{fetch_limit, map_sqlx_error};

#[async_trait]
impl ComposersRepo for PostgresRepositories {
    async fn find_composer(&self, id: i64) -> Result<Option<ComposerRecord>, RepoError> {
        let sql = format!("SELECT {COMPOSER_COLUMNS} FROM composers c WHERE c.id = $1");
        let row = sqlx::query_as::<_, ComposerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(ComposerRecord::from))
    }

    async fn list_composers(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<ComposerRecord>, RepoError> {
        let sql = format!(
            "SELECT {COMPOSER_COLUMNS} FROM composers c \
             WHERE ($1::BIGINT IS NULL OR c.id > $1) \
             ORDER BY c.id LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ComposerRow>(&sql)
            .bind(page.after_id())
            .bind(fetch_limit(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let records = rows.into_iter().map(ComposerRecord::from).collect();
        Ok(page_from_rows(records, page.limit, |composer| composer.id))
    }

    async fn composer_pieces(&self, composer_id: i64) -> Result<Vec<PieceRecord>, RepoError> {
        let sql =
            format!("SELECT {PIECE_COLUMNS} FROM pieces p WHERE p.composer_id = $1 ORDER BY p.id");
        let rows = sqlx::query_as::<_, PieceRow>(&sql)
            .bind(composer_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PieceRecord::from).collect())
    }

    async fn composer_free_movements(
        &self,
        composer_id: i64,
    ) -> Result<Vec<MovementRecord>, RepoError> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements m \
             WHERE m.composer_id = $1 AND m.piece_id IS NULL ORDER BY m.id"
        );
        let rows = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(composer_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(MovementRecord::from).collect())
    }

    async fn composer_counts(&self, composer_id: i64) -> Result<ItemCounts, RepoError> {
        let row = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM pieces WHERE composer_id = $1) AS pieces,
                (SELECT COUNT(*) FROM movements WHERE composer_id = $1) AS movements
            "#,
        )
        .bind(composer_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(ItemCounts {
            pieces: row.pieces,
            movements: row.movements,
        })
    }
}
