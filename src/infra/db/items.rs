use async_trait::async_trait;

use crate::application::pagination::{CursorPage, IdCursor, PageRequest, page_from_rows};
use crate::application::repos::{MovementsRepo, PiecesRepo, RepoError};
use crate::domain::entities::{MovementRecord, PieceRecord};

use super::PostgresRepositories;
use super::rows::{MOVEMENT_COLUMNS, MovementRow, PIECE_COLUMNS, PieceRow};
use super::util::{fetch_limit, map_sqlx_error};

#[async_trait]
impl PiecesRepo for PostgresRepositories {
    async fn find_piece(&self, id: i64) -> Result<Option<PieceRecord>, RepoError> {
        let sql = format!("SELECT {PIECE_COLUMNS} FROM pieces p WHERE p.id = $1");
        let row = sqlx::query_as::<_, PieceRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(PieceRecord::from))
    }

    async fn list_pieces(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<PieceRecord>, RepoError> {
        let sql = format!(
            "SELECT {PIECE_COLUMNS} FROM pieces p \
             WHERE ($1::BIGINT IS NULL OR p.id > $1) \
             ORDER BY p.id LIMIT $2"
        );
        let rows = sqlx::query_as::<_, PieceRow>(&sql)
            .bind(page.after_id())
            .bind(fetch_limit(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let records = rows.into_iter().map(PieceRecord::from).collect();
        Ok(page_from_rows(records, page.limit, |piece| piece.id))
    }

    async fn piece_movements(&self, piece_id: i64) -> Result<Vec<MovementRecord>, RepoError> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements m WHERE m.piece_id = $1 ORDER BY m.id"
        );
        let rows = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(piece_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(MovementRecord::from).collect())
    }

    async fn count_piece_movements(&self, piece_id: i64) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM movements WHERE piece_id = $1")
            .bind(piece_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl MovementsRepo for PostgresRepositories {
    async fn find_movement(&self, id: i64) -> Result<Option<MovementRecord>, RepoError> {
        let sql = format!("SELECT {MOVEMENT_COLUMNS} FROM movements m WHERE m.id = $1");
        let row = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(MovementRecord::from))
    }

    async fn list_movements(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<MovementRecord>, RepoError> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements m \
             WHERE ($1::BIGINT IS NULL OR m.id > $1) \
             ORDER BY m.id LIMIT $2"
        );
        let rows = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(page.after_id())
            .bind(fetch_limit(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let records = rows.into_iter().map(MovementRecord::from).collect();
        Ok(page_from_rows(records, page.limit, |movement| movement.id))
    }
}
