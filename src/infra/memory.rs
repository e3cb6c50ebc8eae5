//! In-memory catalogue loaded from a TOML fixture.
//!
//! Used by `serve --catalog-fixture` and by the integration tests. Record
//! foreign keys are stored as given; link tables must reference existing rows.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::application::pagination::{CursorPage, IdCursor, PageRequest, page_from_rows};
use crate::application::repos::{
    AttachmentsRepo, CollectionsRepo, ComposersRepo, ItemCounts, MovementsRepo, PiecesRepo,
    RepoError, TaxonomyRepo, UsersRepo,
};
use crate::domain::entities::{
    AttachmentRecord, CollectionRecord, ComposerRecord, MovementRecord, PieceRecord,
    TaxonomyRecord, UserRecord,
};
use crate::domain::error::DomainError;
use crate::domain::types::{CatalogItem, TaxonomyKind};

use super::error::InfraError;

/// Raw fixture document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogFixture {
    pub users: Vec<UserRecord>,
    pub composers: Vec<ComposerRecord>,
    pub pieces: Vec<PieceRecord>,
    pub movements: Vec<MovementRecord>,
    pub collections: Vec<CollectionRecord>,
    pub attachments: Vec<AttachmentRecord>,
    pub terms: Vec<TaxonomyRecord>,
    pub collection_items: Vec<CollectionItemLink>,
    pub attachment_items: Vec<AttachmentItemLink>,
    pub term_items: Vec<TermItemLink>,
}

/// Item side of a link row: exactly one of the two ids is set.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ItemRef {
    #[serde(default)]
    pub piece_id: Option<i64>,
    #[serde(default)]
    pub movement_id: Option<i64>,
}

impl ItemRef {
    fn resolve(self) -> Result<CatalogItem, DomainError> {
        match (self.piece_id, self.movement_id) {
            (Some(id), None) => Ok(CatalogItem::Piece(id)),
            (None, Some(id)) => Ok(CatalogItem::Movement(id)),
            _ => Err(DomainError::invariant(
                "link rows need exactly one of piece_id or movement_id",
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionItemLink {
    pub collection_id: i64,
    #[serde(flatten)]
    pub item: ItemRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentItemLink {
    pub attachment_id: i64,
    #[serde(flatten)]
    pub item: ItemRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TermItemLink {
    pub term_id: i64,
    #[serde(flatten)]
    pub item: ItemRef,
}

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    users: BTreeMap<i64, UserRecord>,
    composers: BTreeMap<i64, ComposerRecord>,
    pieces: BTreeMap<i64, PieceRecord>,
    movements: BTreeMap<i64, MovementRecord>,
    collections: BTreeMap<i64, CollectionRecord>,
    attachments: BTreeMap<i64, AttachmentRecord>,
    terms: BTreeMap<i64, TaxonomyRecord>,
    collection_items: Vec<(i64, CatalogItem)>,
    attachment_items: Vec<(i64, CatalogItem)>,
    term_items: Vec<(i64, CatalogItem)>,
}

impl MemoryCatalog {
    /// Read and validate a fixture file.
    pub async fn load(path: &Path) -> Result<Self, InfraError> {
        let fixture_path = path.display().to_string();
        let source = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_toml(&source)
            .map_err(|err| InfraError::fixture(fixture_path.clone(), err.to_string()))?;
        info!(
            target = "elvis::infra::memory",
            path = %fixture_path,
            pieces = catalog.pieces.len(),
            movements = catalog.movements.len(),
            composers = catalog.composers.len(),
            collections = catalog.collections.len(),
            "Loaded catalogue fixture"
        );
        Ok(catalog)
    }

    pub fn from_toml(source: &str) -> Result<Self, FixtureError> {
        let fixture: CatalogFixture = toml::from_str(source)?;
        Ok(Self::from_fixture(fixture)?)
    }

    pub fn from_fixture(fixture: CatalogFixture) -> Result<Self, DomainError> {
        let mut catalog = Self {
            users: index("users", fixture.users, |row| row.id)?,
            composers: index("composers", fixture.composers, |row| row.id)?,
            pieces: index("pieces", fixture.pieces, |row| row.id)?,
            movements: index("movements", fixture.movements, |row| row.id)?,
            collections: index("collections", fixture.collections, |row| row.id)?,
            attachments: index("attachments", fixture.attachments, |row| row.id)?,
            terms: index("terms", fixture.terms, |row| row.id)?,
            ..Self::default()
        };

        for link in fixture.collection_items {
            let item = catalog.checked_item(link.item)?;
            if !catalog.collections.contains_key(&link.collection_id) {
                return Err(dangling("collection", link.collection_id));
            }
            catalog.collection_items.push((link.collection_id, item));
        }
        for link in fixture.attachment_items {
            let item = catalog.checked_item(link.item)?;
            if !catalog.attachments.contains_key(&link.attachment_id) {
                return Err(dangling("attachment", link.attachment_id));
            }
            catalog.attachment_items.push((link.attachment_id, item));
        }
        for link in fixture.term_items {
            let item = catalog.checked_item(link.item)?;
            if !catalog.terms.contains_key(&link.term_id) {
                return Err(dangling("term", link.term_id));
            }
            catalog.term_items.push((link.term_id, item));
        }

        catalog.collection_items.sort_unstable_by_key(|(id, _)| *id);
        catalog.attachment_items.sort_unstable_by_key(|(id, _)| *id);
        catalog.term_items.sort_unstable_by_key(|(id, _)| *id);
        Ok(catalog)
    }

    fn checked_item(&self, item: ItemRef) -> Result<CatalogItem, DomainError> {
        let item = item.resolve()?;
        let exists = match item {
            CatalogItem::Piece(id) => self.pieces.contains_key(&id),
            CatalogItem::Movement(id) => self.movements.contains_key(&id),
        };
        if exists {
            Ok(item)
        } else {
            Err(match item {
                CatalogItem::Piece(id) => dangling("piece", id),
                CatalogItem::Movement(id) => dangling("movement", id),
            })
        }
    }

    fn linked<T: Clone>(
        links: &[(i64, CatalogItem)],
        table: &BTreeMap<i64, T>,
        item: CatalogItem,
    ) -> Vec<T> {
        links
            .iter()
            .filter(|(_, linked)| *linked == item)
            .filter_map(|(id, _)| table.get(id).cloned())
            .collect()
    }

    fn collection_members(&self, collection_id: i64) -> impl Iterator<Item = CatalogItem> + '_ {
        self.collection_items
            .iter()
            .filter(move |(id, _)| *id == collection_id)
            .map(|(_, item)| *item)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to parse fixture: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

fn index<T>(
    table: &'static str,
    rows: Vec<T>,
    id_of: impl Fn(&T) -> i64,
) -> Result<BTreeMap<i64, T>, DomainError> {
    let mut map = BTreeMap::new();
    for row in rows {
        let id = id_of(&row);
        if map.insert(id, row).is_some() {
            return Err(DomainError::invariant(format!(
                "{table} contains id {id} more than once"
            )));
        }
    }
    Ok(map)
}

fn dangling(kind: &str, id: i64) -> DomainError {
    DomainError::invariant(format!("link references unknown {kind} {id}"))
}

fn page_of<T: Clone>(
    table: &BTreeMap<i64, T>,
    page: PageRequest<IdCursor>,
    id_of: impl Fn(&T) -> i64,
) -> CursorPage<T> {
    let rows = match page.after_id() {
        Some(after) => table
            .range(after.saturating_add(1)..)
            .take(page.limit as usize + 1)
            .map(|(_, row)| row.clone())
            .collect(),
        None => table
            .values()
            .take(page.limit as usize + 1)
            .cloned()
            .collect(),
    };
    page_from_rows(rows, page.limit, id_of)
}

#[async_trait]
impl PiecesRepo for MemoryCatalog {
    async fn find_piece(&self, id: i64) -> Result<Option<PieceRecord>, RepoError> {
        Ok(self.pieces.get(&id).cloned())
    }

    async fn list_pieces(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<PieceRecord>, RepoError> {
        Ok(page_of(&self.pieces, page, |row| row.id))
    }

    async fn piece_movements(&self, piece_id: i64) -> Result<Vec<MovementRecord>, RepoError> {
        Ok(self
            .movements
            .values()
            .filter(|movement| movement.piece_id == Some(piece_id))
            .cloned()
            .collect())
    }

    async fn count_piece_movements(&self, piece_id: i64) -> Result<i64, RepoError> {
        let count = self
            .movements
            .values()
            .filter(|movement| movement.piece_id == Some(piece_id))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl MovementsRepo for MemoryCatalog {
    async fn find_movement(&self, id: i64) -> Result<Option<MovementRecord>, RepoError> {
        Ok(self.movements.get(&id).cloned())
    }

    async fn list_movements(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<MovementRecord>, RepoError> {
        Ok(page_of(&self.movements, page, |row| row.id))
    }
}

#[async_trait]
impl ComposersRepo for MemoryCatalog {
    async fn find_composer(&self, id: i64) -> Result<Option<ComposerRecord>, RepoError> {
        Ok(self.composers.get(&id).cloned())
    }

    async fn list_composers(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<ComposerRecord>, RepoError> {
        Ok(page_of(&self.composers, page, |row| row.id))
    }

    async fn composer_pieces(&self, composer_id: i64) -> Result<Vec<PieceRecord>, RepoError> {
        Ok(self
            .pieces
            .values()
            .filter(|piece| piece.composer_id == Some(composer_id))
            .cloned()
            .collect())
    }

    async fn composer_free_movements(
        &self,
        composer_id: i64,
    ) -> Result<Vec<MovementRecord>, RepoError> {
        Ok(self
            .movements
            .values()
            .filter(|movement| {
                movement.composer_id == Some(composer_id) && movement.piece_id.is_none()
            })
            .cloned()
            .collect())
    }

    async fn composer_counts(&self, composer_id: i64) -> Result<ItemCounts, RepoError> {
        let pieces = self
            .pieces
            .values()
            .filter(|piece| piece.composer_id == Some(composer_id))
            .count();
        let movements = self
            .movements
            .values()
            .filter(|movement| movement.composer_id == Some(composer_id))
            .count();
        Ok(ItemCounts {
            pieces: pieces as i64,
            movements: movements as i64,
        })
    }
}

#[async_trait]
impl CollectionsRepo for MemoryCatalog {
    async fn find_collection(&self, id: i64) -> Result<Option<CollectionRecord>, RepoError> {
        Ok(self.collections.get(&id).cloned())
    }

    async fn list_collections(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<CollectionRecord>, RepoError> {
        Ok(page_of(&self.collections, page, |row| row.id))
    }

    async fn collection_pieces(&self, collection_id: i64) -> Result<Vec<PieceRecord>, RepoError> {
        let ids: HashSet<i64> = self
            .collection_members(collection_id)
            .filter_map(|item| match item {
                CatalogItem::Piece(id) => Some(id),
                CatalogItem::Movement(_) => None,
            })
            .collect();
        Ok(self
            .pieces
            .values()
            .filter(|piece| ids.contains(&piece.id))
            .cloned()
            .collect())
    }

    async fn collection_movements(
        &self,
        collection_id: i64,
    ) -> Result<Vec<MovementRecord>, RepoError> {
        let ids: HashSet<i64> = self
            .collection_members(collection_id)
            .filter_map(|item| match item {
                CatalogItem::Movement(id) => Some(id),
                CatalogItem::Piece(_) => None,
            })
            .collect();
        Ok(self
            .movements
            .values()
            .filter(|movement| ids.contains(&movement.id))
            .cloned()
            .collect())
    }

    async fn collection_counts(&self, collection_id: i64) -> Result<ItemCounts, RepoError> {
        let mut counts = ItemCounts::default();
        for item in self.collection_members(collection_id) {
            match item {
                CatalogItem::Piece(_) => counts.pieces += 1,
                CatalogItem::Movement(_) => counts.movements += 1,
            }
        }
        Ok(counts)
    }

    async fn item_collections(
        &self,
        item: CatalogItem,
    ) -> Result<Vec<CollectionRecord>, RepoError> {
        let mut found = Self::linked(&self.collection_items, &self.collections, item);
        found.dedup_by_key(|collection| collection.id);
        Ok(found)
    }
}

#[async_trait]
impl AttachmentsRepo for MemoryCatalog {
    async fn find_attachment(&self, id: i64) -> Result<Option<AttachmentRecord>, RepoError> {
        Ok(self.attachments.get(&id).cloned())
    }

    async fn item_attachments(
        &self,
        item: CatalogItem,
    ) -> Result<Vec<AttachmentRecord>, RepoError> {
        let mut found = Self::linked(&self.attachment_items, &self.attachments, item);
        found.dedup_by_key(|attachment| attachment.id);
        Ok(found)
    }
}

#[async_trait]
impl TaxonomyRepo for MemoryCatalog {
    async fn item_terms(
        &self,
        item: CatalogItem,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyRecord>, RepoError> {
        let mut found: Vec<TaxonomyRecord> = Self::linked(&self.term_items, &self.terms, item)
            .into_iter()
            .filter(|term| term.kind == kind)
            .collect();
        found.dedup_by_key(|term| term.id);
        Ok(found)
    }
}

#[async_trait]
impl UsersRepo for MemoryCatalog {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.users.get(&id).cloned())
    }

    async fn user_pieces(&self, user_id: i64) -> Result<Vec<PieceRecord>, RepoError> {
        Ok(self
            .pieces
            .values()
            .filter(|piece| piece.creator_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn user_movements(&self, user_id: i64) -> Result<Vec<MovementRecord>, RepoError> {
        Ok(self
            .movements
            .values()
            .filter(|movement| movement.creator_id == Some(user_id))
            .cloned()
            .collect())
    }
}
