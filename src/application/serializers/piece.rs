use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{AttachmentsRepo, PiecesRepo};
use crate::domain::entities::PieceRecord;
use crate::domain::types::{CatalogItem, EntityKind};

use super::taxonomy::{item_collections, item_terms};
use super::tiered::{Serializable, SerializeError, TieredSerializer, Viewer, timestamp};
use super::{Representation, Tier, array};

#[async_trait]
impl Serializable for PieceRecord {
    fn kind(&self) -> EntityKind {
        EntityKind::Piece
    }

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn extract(
        &self,
        tier: Tier,
        serializer: &TieredSerializer,
    ) -> Result<Representation, SerializeError> {
        let mut representation = Representation::new()
            .with("title", self.title.as_str())
            .with("url", serializer.links().entity(EntityKind::Piece, self.id))
            .with("id", self.id);
        if tier == Tier::Min {
            return Ok(representation);
        }

        let catalog = serializer.catalog();
        representation.insert("composer", serializer.composer_ref(self.composer_id).await?);
        representation.insert("movement_count", catalog.count_piece_movements(self.id).await?);
        representation.insert("composition_end_date", self.composition_end_date);
        if tier == Tier::List {
            return Ok(representation);
        }

        let movements = catalog.piece_movements(self.id).await?;
        representation.insert("movements", array(serializer.embed_all(&movements).await?));
        let attachments = catalog
            .item_attachments(CatalogItem::Piece(self.id))
            .await?;
        representation.insert("attachments", array(serializer.min_all(&attachments).await?));
        Ok(representation)
    }

    async fn extract_full(
        &self,
        serializer: &TieredSerializer,
        viewer: &Viewer,
    ) -> Result<Representation, SerializeError> {
        let item = CatalogItem::Piece(self.id);
        let catalog = serializer.catalog();
        let mut representation = self.extract(Tier::List, serializer).await?;

        let movements = catalog.piece_movements(self.id).await?;
        representation.insert(
            "movements",
            array(serializer.full_all(&movements, viewer).await?),
        );
        let attachments = catalog.item_attachments(item).await?;
        representation.insert("attachments", array(serializer.embed_all(&attachments).await?));

        representation.insert("composition_start_date", self.composition_start_date);
        representation.insert("religiosity", self.religiosity.clone());
        representation.insert("vocalization", self.vocalization.clone());
        representation.insert("comment", self.comment.as_str());
        for (field, terms) in item_terms(serializer, item).await? {
            representation.insert(field, terms);
        }
        representation.insert("collections", item_collections(serializer, item).await?);
        representation.insert("creator", serializer.username_ref(self.creator_id).await?);
        representation.insert("created", timestamp("created", self.created_at)?);
        representation.insert("updated", timestamp("updated", self.updated_at)?);
        Ok(representation)
    }
}
