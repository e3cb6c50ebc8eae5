//! Cache-backed tier selection shared by every entity serializer.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use metrics::counter;
use serde_json::Value;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::application::attachments::{AttachmentUrlError, MediaLocation, Principal, RequestOrigin};
use crate::application::repos::{CatalogRepo, ComposersRepo, PiecesRepo, RepoError, UsersRepo};
use crate::cache::{CacheKey, RepresentationCache};
use crate::domain::types::EntityKind;

use super::{Representation, Tier, fields};

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("{kind} has no {tier} representation")]
    UnsupportedTier { kind: EntityKind, tier: Tier },
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    AttachmentUrl(#[from] AttachmentUrlError),
    #[error("failed to format `{field}`: {reason}")]
    Format { field: &'static str, reason: String },
}

/// The request-dependent context FULL representations may read.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub principal: Principal,
    pub origin: RequestOrigin,
}

impl Viewer {
    pub fn new(principal: Principal, origin: RequestOrigin) -> Self {
        Self { principal, origin }
    }

    pub fn anonymous(origin: RequestOrigin) -> Self {
        Self::new(Principal::Anonymous, origin)
    }
}

/// Builds the absolute `url` field of cached representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLinks {
    base: String,
}

impl SiteLinks {
    pub fn new(public_url: &str) -> Self {
        Self {
            base: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn entity(&self, kind: EntityKind, id: i64) -> String {
        let segment = kind.route_segment().unwrap_or("terms");
        format!("{}/api/{segment}/{id}", self.base)
    }
}

/// A record that can be rendered at one or more tiers.
///
/// Implementations return at least the declared fields; the serializer
/// projects the result onto the declared field set.
#[async_trait]
pub trait Serializable: Send + Sync {
    fn kind(&self) -> EntityKind;

    fn uuid(&self) -> Uuid;

    /// Compute a MIN, LIST or EMBED representation without consulting the
    /// cache for this entity. Nested members go through `serializer`.
    async fn extract(
        &self,
        tier: Tier,
        serializer: &TieredSerializer,
    ) -> Result<Representation, SerializeError>;

    async fn extract_full(
        &self,
        serializer: &TieredSerializer,
        viewer: &Viewer,
    ) -> Result<Representation, SerializeError>;
}

pub struct TieredSerializer {
    cache: Arc<dyn RepresentationCache>,
    catalog: Arc<dyn CatalogRepo>,
    links: SiteLinks,
    media: MediaLocation,
}

impl TieredSerializer {
    pub fn new(
        cache: Arc<dyn RepresentationCache>,
        catalog: Arc<dyn CatalogRepo>,
        links: SiteLinks,
        media: MediaLocation,
    ) -> Self {
        Self {
            cache,
            catalog,
            links,
            media,
        }
    }

    pub fn cache(&self) -> &dyn RepresentationCache {
        self.cache.as_ref()
    }

    pub fn catalog(&self) -> &dyn CatalogRepo {
        self.catalog.as_ref()
    }

    pub fn links(&self) -> &SiteLinks {
        &self.links
    }

    pub fn media(&self) -> &MediaLocation {
        &self.media
    }

    pub async fn represent<E: Serializable>(
        &self,
        entity: &E,
        tier: Tier,
        viewer: &Viewer,
    ) -> Result<Representation, SerializeError> {
        match tier {
            Tier::Min => self.min(entity).await,
            Tier::List => self.list(entity).await,
            Tier::Embed => self.embed(entity).await,
            Tier::Full => self.full(entity, viewer).await,
        }
    }

    /// MIN is served from its own slot, else projected from a cached EMB or
    /// LIST value, else computed. Either way the MIN slot ends up filled.
    pub async fn min<E: Serializable>(&self, entity: &E) -> Result<Representation, SerializeError> {
        let kind = entity.kind();
        let min_fields = declared_fields(kind, Tier::Min)?;
        let uuid = entity.uuid();
        let Some(min_key) = CacheKey::new(Tier::Min, uuid) else {
            return self.compute(entity, Tier::Min).await;
        };

        if let Some(hit) = self.cache.get(&min_key) {
            record_hit(Tier::Min);
            return Ok(hit);
        }

        for richer in [Tier::Embed, Tier::List] {
            if !fields::declares(kind, richer) {
                continue;
            }
            let Some(key) = CacheKey::new(richer, uuid) else {
                continue;
            };
            if let Some(rich) = self.cache.get(&key) {
                counter!("elvis_serializer_downprojection_total", "from" => richer.as_str())
                    .increment(1);
                let min = rich.project(min_fields);
                self.cache.set(min_key, min.clone());
                return Ok(min);
            }
        }

        record_miss(Tier::Min);
        debug!(%kind, %uuid, tier = "min", "representation cache miss");
        let min = self.compute(entity, Tier::Min).await?;
        self.cache.set(min_key, min.clone());
        Ok(min)
    }

    pub async fn list<E: Serializable>(&self, entity: &E) -> Result<Representation, SerializeError> {
        self.cached(entity, Tier::List).await
    }

    pub async fn embed<E: Serializable>(
        &self,
        entity: &E,
    ) -> Result<Representation, SerializeError> {
        self.cached(entity, Tier::Embed).await
    }

    /// FULL is recomputed on every call and never stored.
    pub async fn full<E: Serializable>(
        &self,
        entity: &E,
        viewer: &Viewer,
    ) -> Result<Representation, SerializeError> {
        let full_fields = declared_fields(entity.kind(), Tier::Full)?;
        let representation = entity.extract_full(self, viewer).await?;
        Ok(representation.project(full_fields))
    }

    pub async fn min_all<E: Serializable>(
        &self,
        entities: &[E],
    ) -> Result<Vec<Representation>, SerializeError> {
        try_join_all(entities.iter().map(|entity| self.min(entity))).await
    }

    pub async fn list_all<E: Serializable>(
        &self,
        entities: &[E],
    ) -> Result<Vec<Representation>, SerializeError> {
        try_join_all(entities.iter().map(|entity| self.list(entity))).await
    }

    pub async fn embed_all<E: Serializable>(
        &self,
        entities: &[E],
    ) -> Result<Vec<Representation>, SerializeError> {
        try_join_all(entities.iter().map(|entity| self.embed(entity))).await
    }

    pub async fn full_all<E: Serializable>(
        &self,
        entities: &[E],
        viewer: &Viewer,
    ) -> Result<Vec<Representation>, SerializeError> {
        try_join_all(entities.iter().map(|entity| self.full(entity, viewer))).await
    }

    /// Composer MIN for an optional foreign key; `null` when unset or dangling.
    pub async fn composer_ref(&self, composer_id: Option<i64>) -> Result<Value, SerializeError> {
        let Some(id) = composer_id else {
            return Ok(Value::Null);
        };
        match self.catalog.find_composer(id).await? {
            Some(composer) => Ok(self.min(&composer).await?.into_value()),
            None => Ok(Value::Null),
        }
    }

    /// Piece MIN for an optional foreign key; `null` when unset or dangling.
    pub async fn piece_ref(&self, piece_id: Option<i64>) -> Result<Value, SerializeError> {
        let Some(id) = piece_id else {
            return Ok(Value::Null);
        };
        match self.catalog.find_piece(id).await? {
            Some(piece) => Ok(self.min(&piece).await?.into_value()),
            None => Ok(Value::Null),
        }
    }

    /// Username of an optional user reference, or `null`.
    pub async fn username_ref(&self, user_id: Option<i64>) -> Result<Value, SerializeError> {
        let Some(id) = user_id else {
            return Ok(Value::Null);
        };
        Ok(self
            .catalog
            .find_user(id)
            .await?
            .map_or(Value::Null, |user| Value::String(user.username)))
    }

    async fn cached<E: Serializable>(
        &self,
        entity: &E,
        tier: Tier,
    ) -> Result<Representation, SerializeError> {
        declared_fields(entity.kind(), tier)?;
        let Some(key) = CacheKey::new(tier, entity.uuid()) else {
            return self.compute(entity, tier).await;
        };

        if let Some(hit) = self.cache.get(&key) {
            record_hit(tier);
            return Ok(hit);
        }

        record_miss(tier);
        debug!(kind = %entity.kind(), uuid = %entity.uuid(), %tier, "representation cache miss");
        let representation = self.compute(entity, tier).await?;
        self.cache.set(key, representation.clone());
        Ok(representation)
    }

    async fn compute<E: Serializable>(
        &self,
        entity: &E,
        tier: Tier,
    ) -> Result<Representation, SerializeError> {
        let tier_fields = declared_fields(entity.kind(), tier)?;
        let representation = entity.extract(tier, self).await?;
        Ok(representation.project(tier_fields))
    }
}

fn declared_fields(kind: EntityKind, tier: Tier) -> Result<&'static [&'static str], SerializeError> {
    fields::declared(kind, tier).ok_or(SerializeError::UnsupportedTier { kind, tier })
}

fn record_hit(tier: Tier) {
    counter!("elvis_serializer_cache_hit_total", "tier" => tier.as_str()).increment(1);
}

fn record_miss(tier: Tier) {
    counter!("elvis_serializer_cache_miss_total", "tier" => tier.as_str()).increment(1);
}

/// RFC 3339 timestamp value.
pub(crate) fn timestamp(field: &'static str, value: OffsetDateTime) -> Result<Value, SerializeError> {
    value
        .format(&Rfc3339)
        .map(Value::String)
        .map_err(|err| SerializeError::Format {
            field,
            reason: err.to_string(),
        })
}

/// `YYYY-MM-DD` value, or `null`.
pub(crate) fn date(field: &'static str, value: Option<Date>) -> Result<Value, SerializeError> {
    let Some(value) = value else {
        return Ok(Value::Null);
    };
    value
        .format(format_description!("[year]-[month]-[day]"))
        .map(Value::String)
        .map_err(|err| SerializeError::Format {
            field,
            reason: err.to_string(),
        })
}
