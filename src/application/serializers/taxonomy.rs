use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::Value;
use uuid::Uuid;

use crate::application::repos::{CollectionsRepo, TaxonomyRepo};
use crate::domain::entities::TaxonomyRecord;
use crate::domain::types::{CatalogItem, EntityKind, TaxonomyKind};

use super::tiered::{Serializable, SerializeError, TieredSerializer, Viewer};
use super::{Representation, Tier, array};

#[async_trait]
impl Serializable for TaxonomyRecord {
    fn kind(&self) -> EntityKind {
        EntityKind::Taxonomy(self.kind)
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
            .with("title", self.title.as_str())
            .with("id", self.id))
    }

    async fn extract_full(
        &self,
        _serializer: &TieredSerializer,
        _viewer: &Viewer,
    ) -> Result<Representation, SerializeError> {
        Err(SerializeError::UnsupportedTier {
            kind: self.kind(),
            tier: Tier::Full,
        })
    }
}

/// The six taxonomy lists of a piece or movement as `(field, [term MIN])`.
pub(super) async fn item_terms(
    serializer: &TieredSerializer,
    item: CatalogItem,
) -> Result<Vec<(&'static str, Value)>, SerializeError> {
    let lists = try_join_all(TaxonomyKind::ALL.into_iter().map(|kind| async move {
        let terms = serializer.catalog().item_terms(item, kind).await?;
        let representations = serializer.min_all(&terms).await?;
        Ok::<_, SerializeError>((kind.plural_field(), array(representations)))
    }))
    .await?;
    Ok(lists)
}

/// Collection MIN values for every collection containing `item`.
pub(super) async fn item_collections(
    serializer: &TieredSerializer,
    item: CatalogItem,
) -> Result<Value, SerializeError> {
    let collections = serializer.catalog().item_collections(item).await?;
    Ok(array(serializer.min_all(&collections).await?))
}
