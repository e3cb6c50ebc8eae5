//! Catalogue read service: loads records, picks the tier, renders.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use metrics::histogram;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::attachments::{
    AttachmentUrlError, DownloadEntry, DownloadFilter, resolve_attachment_url,
};
use crate::application::pagination::{CursorPage, IdCursor, MAX_PAGE_LIMIT, PageRequest};
use crate::application::repos::{
    AttachmentsRepo, CatalogRepo, CollectionsRepo, ComposersRepo, MovementsRepo, PiecesRepo,
    RepoError, UsersRepo,
};
use crate::application::serializers::{
    Representation, SerializeError, Serializable, Tier, TieredSerializer, Viewer,
};
use crate::domain::error::DomainError;
use crate::domain::types::EntityKind;

/// Kinds with a paginated listing, in warm-up order.
pub const LISTABLE_KINDS: [EntityKind; 4] = [
    EntityKind::Composer,
    EntityKind::Piece,
    EntityKind::Movement,
    EntityKind::Collection,
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{0} records cannot be listed")]
    NotListable(EntityKind),
    #[error("{0} records have no detail view")]
    NoDetail(EntityKind),
    #[error("authentication required")]
    Unauthorized,
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    AttachmentUrl(#[from] AttachmentUrlError),
}

/// Outcome of a warm-up pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmReport {
    pub representations: usize,
    pub elapsed_ms: u128,
}

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepo>,
    serializer: Arc<TieredSerializer>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogRepo>, serializer: Arc<TieredSerializer>) -> Self {
        Self {
            catalog,
            serializer,
        }
    }

    pub fn serializer(&self) -> &TieredSerializer {
        &self.serializer
    }

    /// One record at `tier` (FULL when unspecified).
    pub async fn detail(
        &self,
        kind: EntityKind,
        id: i64,
        tier: Option<Tier>,
        viewer: &Viewer,
    ) -> Result<Representation, CatalogError> {
        let tier = tier.unwrap_or(Tier::Full);
        let catalog = self.catalog.as_ref();
        match kind {
            EntityKind::Piece => {
                self.render(catalog.find_piece(id).await?, kind, id, tier, viewer)
                    .await
            }
            EntityKind::Movement => {
                self.render(catalog.find_movement(id).await?, kind, id, tier, viewer)
                    .await
            }
            EntityKind::Composer => {
                self.render(catalog.find_composer(id).await?, kind, id, tier, viewer)
                    .await
            }
            EntityKind::Collection => {
                self.render(catalog.find_collection(id).await?, kind, id, tier, viewer)
                    .await
            }
            EntityKind::Attachment => {
                self.render(catalog.find_attachment(id).await?, kind, id, tier, viewer)
                    .await
            }
            EntityKind::User => {
                self.render(catalog.find_user(id).await?, kind, id, tier, viewer)
                    .await
            }
            EntityKind::Taxonomy(_) => Err(CatalogError::NoDetail(kind)),
        }
    }

    /// A page of records at `tier` (LIST when unspecified), ordered by id.
    pub async fn list(
        &self,
        kind: EntityKind,
        tier: Option<Tier>,
        page: PageRequest<IdCursor>,
        viewer: &Viewer,
    ) -> Result<CursorPage<Representation>, CatalogError> {
        let tier = tier.unwrap_or(Tier::List);
        let catalog = self.catalog.as_ref();
        match kind {
            EntityKind::Piece => {
                self.render_page(catalog.list_pieces(page).await?, tier, viewer)
                    .await
            }
            EntityKind::Movement => {
                self.render_page(catalog.list_movements(page).await?, tier, viewer)
                    .await
            }
            EntityKind::Composer => {
                self.render_page(catalog.list_composers(page).await?, tier, viewer)
                    .await
            }
            EntityKind::Collection => {
                self.render_page(catalog.list_collections(page).await?, tier, viewer)
                    .await
            }
            _ => Err(CatalogError::NotListable(kind)),
        }
    }

    /// Attachments a download bundle would contain, with resolved links.
    pub async fn select_downloads(
        &self,
        ids: &[i64],
        types: &[String],
        viewer: &Viewer,
    ) -> Result<Vec<DownloadEntry>, CatalogError> {
        if !viewer.principal.is_authenticated() {
            return Err(CatalogError::Unauthorized);
        }

        let filter = DownloadFilter::from_tokens(types);
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            let attachment = self
                .catalog
                .find_attachment(id)
                .await?
                .ok_or(DomainError::not_found(EntityKind::Attachment, id))?;
            let extension = attachment.extension();
            if !filter.matches(&extension) {
                continue;
            }
            let url = resolve_attachment_url(
                &attachment.stored_path,
                self.serializer.media(),
                &viewer.origin,
                &viewer.principal,
            )?;
            entries.push(DownloadEntry {
                id: attachment.id,
                file_name: attachment.file_name().to_string(),
                extension,
                url,
            });
        }
        Ok(entries)
    }

    /// Drop every cached tier of `uuid`. Returns the number of entries removed.
    pub fn purge(&self, uuid: Uuid, viewer: &Viewer) -> Result<usize, CatalogError> {
        let Some(username) = viewer.principal.username() else {
            return Err(CatalogError::Unauthorized);
        };
        let removed = self.serializer.cache().purge(uuid);
        info!(%uuid, removed, by = username, "Purged cached representations");
        Ok(removed)
    }

    /// Precompute LIST representations for every listable record.
    pub async fn warm(&self) -> Result<WarmReport, CatalogError> {
        let started = Instant::now();
        let mut representations = 0;

        for kind in LISTABLE_KINDS {
            let mut cursor = None;
            loop {
                let request = PageRequest::new(MAX_PAGE_LIMIT, cursor);
                let (rendered, next_cursor) = match kind {
                    EntityKind::Composer => {
                        self.warm_page(self.catalog.list_composers(request).await?)
                            .await?
                    }
                    EntityKind::Piece => {
                        self.warm_page(self.catalog.list_pieces(request).await?)
                            .await?
                    }
                    EntityKind::Movement => {
                        self.warm_page(self.catalog.list_movements(request).await?)
                            .await?
                    }
                    EntityKind::Collection => {
                        self.warm_page(self.catalog.list_collections(request).await?)
                            .await?
                    }
                    _ => break,
                };
                representations += rendered;
                match next_cursor {
                    Some(encoded) => match IdCursor::decode(&encoded) {
                        Ok(decoded) => cursor = Some(decoded),
                        Err(err) => {
                            warn!(%kind, error = %err, "Stopping warm-up on undecodable cursor");
                            break;
                        }
                    },
                    None => break,
                }
            }
        }

        histogram!("elvis_cache_warm_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        let report = WarmReport {
            representations,
            elapsed_ms: started.elapsed().as_millis(),
        };
        info!(
            target = "elvis::warm",
            representations = report.representations,
            elapsed_ms = report.elapsed_ms as u64,
            "Representation cache warmed"
        );
        Ok(report)
    }

    async fn warm_page<E: Serializable>(
        &self,
        page: CursorPage<E>,
    ) -> Result<(usize, Option<String>), CatalogError> {
        let rendered = self.serializer.list_all(&page.items).await?;
        Ok((rendered.len(), page.next_cursor))
    }

    async fn render<E: Serializable>(
        &self,
        entity: Option<E>,
        kind: EntityKind,
        id: i64,
        tier: Tier,
        viewer: &Viewer,
    ) -> Result<Representation, CatalogError> {
        let entity = entity.ok_or(DomainError::not_found(kind, id))?;
        Ok(self.serializer.represent(&entity, tier, viewer).await?)
    }

    async fn render_page<E: Serializable>(
        &self,
        page: CursorPage<E>,
        tier: Tier,
        viewer: &Viewer,
    ) -> Result<CursorPage<Representation>, CatalogError> {
        let items = try_join_all(
            page.items
                .iter()
                .map(|entity| self.serializer.represent(entity, tier, viewer)),
        )
        .await?;
        Ok(CursorPage::new(items, page.next_cursor))
    }
}
