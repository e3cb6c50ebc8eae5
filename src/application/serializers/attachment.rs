use async_trait::async_trait;
use uuid::Uuid;

use crate::application::attachments::resolve_attachment_url;
use crate::domain::entities::AttachmentRecord;
use crate::domain::types::EntityKind;

use super::tiered::{Serializable, SerializeError, TieredSerializer, Viewer, timestamp};
use super::{Representation, Tier};

#[async_trait]
impl Serializable for AttachmentRecord {
    fn kind(&self) -> EntityKind {
        EntityKind::Attachment
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
            .with("file_name", self.file_name())
            .with("url", serializer.links().entity(EntityKind::Attachment, self.id));
        if tier == Tier::Min {
            return Ok(representation);
        }

        representation.insert("id", self.id);
        representation.insert("extension", self.extension());
        representation.insert("source", self.source.clone());
        Ok(representation)
    }

    async fn extract_full(
        &self,
        serializer: &TieredSerializer,
        viewer: &Viewer,
    ) -> Result<Representation, SerializeError> {
        let mut representation = self.extract(Tier::Embed, serializer).await?;
        representation.insert("created", timestamp("created", self.created_at)?);
        representation.insert("updated", timestamp("updated", self.updated_at)?);
        representation.insert("uploader", serializer.username_ref(self.uploader_id).await?);
        let attachment = resolve_attachment_url(
            &self.stored_path,
            serializer.media(),
            &viewer.origin,
            &viewer.principal,
        )?;
        representation.insert("attachment", attachment);
        Ok(representation)
    }
}
