use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::CollectionsRepo;
use crate::domain::entities::CollectionRecord;
use crate::domain::types::EntityKind;

use super::tiered::{Serializable, SerializeError, TieredSerializer, Viewer, timestamp};
use super::{Representation, Tier, array};

#[async_trait]
impl Serializable for CollectionRecord {
    fn kind(&self) -> EntityKind {
        EntityKind::Collection
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
            .with("url", serializer.links().entity(EntityKind::Collection, self.id))
            .with("id", self.id)
            .with("public", self.public);
        if tier == Tier::Min {
            return Ok(representation);
        }

        let counts = serializer.catalog().collection_counts(self.id).await?;
        representation.insert("piece_count", counts.pieces);
        representation.insert("movement_count", counts.movements);
        representation.insert("creator", serializer.username_ref(self.creator_id).await?);
        Ok(representation)
    }

    async fn extract_full(
        &self,
        serializer: &TieredSerializer,
        _viewer: &Viewer,
    ) -> Result<Representation, SerializeError> {
        let catalog = serializer.catalog();
        let mut representation = self.extract(Tier::List, serializer).await?;

        representation.insert("comment", self.comment.as_str());
        let pieces = catalog.collection_pieces(self.id).await?;
        representation.insert("pieces", array(serializer.embed_all(&pieces).await?));
        let movements = catalog.collection_movements(self.id).await?;
        representation.insert("movements", array(serializer.embed_all(&movements).await?));
        representation.insert("created", timestamp("created", self.created_at)?);
        representation.insert("updated", timestamp("updated", self.updated_at)?);
        Ok(representation)
    }
}
