use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::ComposersRepo;
use crate::domain::entities::ComposerRecord;
use crate::domain::types::EntityKind;

use super::tiered::{Serializable, SerializeError, TieredSerializer, Viewer, date, timestamp};
use super::{Representation, Tier, array};

#[async_trait]
impl Serializable for ComposerRecord {
    fn kind(&self) -> EntityKind {
        EntityKind::Composer
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
            .with("title", self.name.as_str())
            .with("url", serializer.links().entity(EntityKind::Composer, self.id))
            .with("id", self.id);
        if tier == Tier::Min {
            return Ok(representation);
        }

        let counts = serializer.catalog().composer_counts(self.id).await?;
        representation.insert("name", self.name.as_str());
        representation.insert("birth_date", date("birth_date", self.birth_date)?);
        representation.insert("death_date", date("death_date", self.death_date)?);
        representation.insert("piece_count", counts.pieces);
        representation.insert("movement_count", counts.movements);
        Ok(representation)
    }

    async fn extract_full(
        &self,
        serializer: &TieredSerializer,
        _viewer: &Viewer,
    ) -> Result<Representation, SerializeError> {
        let catalog = serializer.catalog();
        let mut representation = self.extract(Tier::List, serializer).await?;

        let pieces = catalog.composer_pieces(self.id).await?;
        representation.insert("pieces", array(serializer.list_all(&pieces).await?));
        let free_movements = catalog.composer_free_movements(self.id).await?;
        representation.insert(
            "free_movements",
            array(serializer.embed_all(&free_movements).await?),
        );
        representation.insert("created", timestamp("created", self.created_at)?);
        representation.insert("updated", timestamp("updated", self.updated_at)?);
        Ok(representation)
    }
}
