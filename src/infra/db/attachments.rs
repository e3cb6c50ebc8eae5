use async_trait::async_trait;

use crate::application::repos::{AttachmentsRepo, RepoError, TaxonomyRepo};
use crate::domain::entities::{AttachmentRecord, TaxonomyRecord};
use crate::domain::types::{CatalogItem, TaxonomyKind};

use super::PostgresRepositories;
use super::rows::{ATTACHMENT_COLUMNS, AttachmentRow, TermRow};
use super::util::map_sqlx_error;

#[async_trait]
impl AttachmentsRepo for PostgresRepositories {
    async fn find_attachment(&self, id: i64) -> Result<Option<AttachmentRecord>, RepoError> {
        let sql = format!("SELECT {ATTACHMENT_COLUMNS} FROM attachments a WHERE a.id = $1");
        let row = sqlx::query_as::<_, AttachmentRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(AttachmentRecord::from))
    }

    async fn item_attachments(
        &self,
        item: CatalogItem,
    ) -> Result<Vec<AttachmentRecord>, RepoError> {
        let join = match item {
            CatalogItem::Piece(_) => {
                "INNER JOIN piece_attachments link ON link.attachment_id = a.id \
                 WHERE link.piece_id = $1"
            }
            CatalogItem::Movement(_) => {
                "INNER JOIN movement_attachments link ON link.attachment_id = a.id \
                 WHERE link.movement_id = $1"
            }
        };
        let sql = format!("SELECT {ATTACHMENT_COLUMNS} FROM attachments a {join} ORDER BY a.id");
        let rows = sqlx::query_as::<_, AttachmentRow>(&sql)
            .bind(item.id())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(AttachmentRecord::from).collect())
    }
}

#[async_trait]
impl TaxonomyRepo for PostgresRepositories {
    async fn item_terms(
        &self,
        item: CatalogItem,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyRecord>, RepoError> {
        let join = match item {
            CatalogItem::Piece(_) => {
                "INNER JOIN piece_terms link ON link.term_id = t.id WHERE link.piece_id = $1"
            }
            CatalogItem::Movement(_) => {
                "INNER JOIN movement_terms link ON link.term_id = t.id WHERE link.movement_id = $1"
            }
        };
        let sql = format!(
            "SELECT t.id, t.uuid, t.kind, t.title FROM taxonomy_terms t {join} \
             AND t.kind = $2 ORDER BY t.id"
        );
        let rows = sqlx::query_as::<_, TermRow>(&sql)
            .bind(item.id())
            .bind(kind)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(TaxonomyRecord::from).collect())
    }
}
