use async_trait::async_trait;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::{MovementRecord, PieceRecord, UserRecord};

use super::PostgresRepositories;
use super::rows::{MOVEMENT_COLUMNS, MovementRow, PIECE_COLUMNS, PieceRow, UserRow};
use super::util::map_sqlx_error;

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, uuid, username, first_name, last_name FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(UserRecord::from))
    }

    async fn user_pieces(&self, user_id: i64) -> Result<Vec<PieceRecord>, RepoError> {
        let sql =
            format!("SELECT {PIECE_COLUMNS} FROM pieces p WHERE p.creator_id = $1 ORDER BY p.id");
        let rows = sqlx::query_as::<_, PieceRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PieceRecord::from).collect())
    }

    async fn user_movements(&self, user_id: i64) -> Result<Vec<MovementRecord>, RepoError> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements m WHERE m.creator_id = $1 ORDER BY m.id"
        );
        let rows = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(MovementRecord::from).collect())
    }
}
