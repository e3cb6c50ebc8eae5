use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::UsersRepo;
use crate::domain::entities::UserRecord;
use crate::domain::types::EntityKind;

use super::tiered::{Serializable, SerializeError, TieredSerializer, Viewer};
use super::{Representation, Tier, array};

#[async_trait]
impl Serializable for UserRecord {
    fn kind(&self) -> EntityKind {
        EntityKind::User
    }

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    async fn extract(
        &self,
        _tier: Tier,
        _serializer: &TieredSerializer,
    ) -> Result<Representation, SerializeError> {
        Ok(Representation::new()
            .with("name", self.display_name())
            .with("username", self.username.as_str())
            .with("id", self.id))
    }

    async fn extract_full(
        &self,
        serializer: &TieredSerializer,
        _viewer: &Viewer,
    ) -> Result<Representation, SerializeError> {
        let catalog = serializer.catalog();
        let mut representation = self.extract(Tier::Min, serializer).await?;
        representation.insert("url", serializer.links().entity(EntityKind::User, self.id));
        let pieces = catalog.user_pieces(self.id).await?;
        representation.insert("pieces", array(serializer.list_all(&pieces).await?));
        let movements = catalog.user_movements(self.id).await?;
        representation.insert("movements", array(serializer.list_all(&movements).await?));
        Ok(representation)
    }
}
