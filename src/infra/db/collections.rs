use async_trait::async_trait;

use crate::application::pagination::{CursorPage, IdCursor, PageRequest, page_from_rows};
use crate::application::repos::{CollectionsRepo, ItemCounts, RepoError};
use crate::domain::entities::{CollectionRecord, MovementRecord, PieceRecord};
use crate::domain::types::CatalogItem;

use super::PostgresRepositories;
use super::rows::{
    COLLECTION_COLUMNS, CollectionRow, CountsRow, MOVEMENT_COLUMNS, MovementRow, PIECE_COLUMNS,
    PieceRow,
};
use super::util::{fetch_limit, map_sqlx_error};

#[async_trait]
impl CollectionsRepo for PostgresRepositories {
    async fn find_collection(&self, id: i64) -> Result<Option<CollectionRecord>, RepoError> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections col WHERE col.id = $1");
        let row = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(CollectionRecord::from))
    }

    async fn list_collections(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<CollectionRecord>, RepoError> {
        let sql = format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections col \
             WHERE ($1::BIGINT IS NULL OR col.id > $1) \
             ORDER BY col.id LIMIT $2"
        );
        let rows = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(page.after_id())
            .bind(fetch_limit(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let records = rows.into_iter().map(CollectionRecord::from).collect();
        Ok(page_from_rows(records, page.limit, |collection| {
            collection.id
        }))
    }

    async fn collection_pieces(&self, collection_id: i64) -> Result<Vec<PieceRecord>, RepoError> {
        let sql = format!(
            "SELECT {PIECE_COLUMNS} FROM pieces p \
             INNER JOIN collection_pieces cp ON cp.piece_id = p.id \
             WHERE cp.collection_id = $1 ORDER BY p.id"
        );
        let rows = sqlx::query_as::<_, PieceRow>(&sql)
            .bind(collection_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PieceRecord::from).collect())
    }

    async fn collection_movements(
        &self,
        collection_id: i64,
    ) -> Result<Vec<MovementRecord>, RepoError> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements m \
             INNER JOIN collection_movements cm ON cm.movement_id = m.id \
             WHERE cm.collection_id = $1 ORDER BY m.id"
        );
        let rows = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(collection_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(MovementRecord::from).collect())
    }

    async fn collection_counts(&self, collection_id: i64) -> Result<ItemCounts, RepoError> {
        let row = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM collection_pieces WHERE collection_id = $1) AS pieces,
                (SELECT COUNT(*) FROM collection_movements WHERE collection_id = $1) AS movements
            "#,
        )
        .bind(collection_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(ItemCounts {
            pieces: row.pieces,
            movements: row.movements,
        })
    }

    async fn item_collections(
        &self,
        item: CatalogItem,
    ) -> Result<Vec<CollectionRecord>, RepoError> {
        let join = match item {
            CatalogItem::Piece(_) => {
                "INNER JOIN collection_pieces link ON link.collection_id = col.id \
                 WHERE link.piece_id = $1"
            }
            CatalogItem::Movement(_) => {
                "INNER JOIN collection_movements link ON link.collection_id = col.id \
                 WHERE link.movement_id = $1"
            }
        };
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections col {join} ORDER BY col.id");
        let rows = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(item.id())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(CollectionRecord::from).collect())
    }
}
