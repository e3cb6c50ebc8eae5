//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::{CursorPage, IdCursor, PageRequest, PaginationError};
use crate::domain::entities::{
    AttachmentRecord, CollectionRecord, ComposerRecord, MovementRecord, PieceRecord,
    TaxonomyRecord, UserRecord,
};
use crate::domain::types::{CatalogItem, TaxonomyKind};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

/// Number of pieces and movements attached to a composer or collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounts {
    pub pieces: i64,
    pub movements: i64,
}

#[async_trait]
pub trait PiecesRepo: Send + Sync {
    async fn find_piece(&self, id: i64) -> Result<Option<PieceRecord>, RepoError>;

    async fn list_pieces(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<PieceRecord>, RepoError>;

    /// Movements of a piece, ordered by id.
    async fn piece_movements(&self, piece_id: i64) -> Result<Vec<MovementRecord>, RepoError>;

    async fn count_piece_movements(&self, piece_id: i64) -> Result<i64, RepoError>;
}

#[async_trait]
pub trait MovementsRepo: Send + Sync {
    async fn find_movement(&self, id: i64) -> Result<Option<MovementRecord>, RepoError>;

    async fn list_movements(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<MovementRecord>, RepoError>;
}

#[async_trait]
pub trait ComposersRepo: Send + Sync {
    async fn find_composer(&self, id: i64) -> Result<Option<ComposerRecord>, RepoError>;

    async fn list_composers(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<ComposerRecord>, RepoError>;

    async fn composer_pieces(&self, composer_id: i64) -> Result<Vec<PieceRecord>, RepoError>;

    /// Movements by the composer that do not belong to any piece.
    async fn composer_free_movements(
        &self,
        composer_id: i64,
    ) -> Result<Vec<MovementRecord>, RepoError>;

    async fn composer_counts(&self, composer_id: i64) -> Result<ItemCounts, RepoError>;
}

#[async_trait]
pub trait CollectionsRepo: Send + Sync {
    async fn find_collection(&self, id: i64) -> Result<Option<CollectionRecord>, RepoError>;

    async fn list_collections(
        &self,
        page: PageRequest<IdCursor>,
    ) -> Result<CursorPage<CollectionRecord>, RepoError>;

    async fn collection_pieces(&self, collection_id: i64) -> Result<Vec<PieceRecord>, RepoError>;

    async fn collection_movements(
        &self,
        collection_id: i64,
    ) -> Result<Vec<MovementRecord>, RepoError>;

    async fn collection_counts(&self, collection_id: i64) -> Result<ItemCounts, RepoError>;

    /// Collections that include the given piece or movement.
    async fn item_collections(&self, item: CatalogItem)
    -> Result<Vec<CollectionRecord>, RepoError>;
}

#[async_trait]
pub trait AttachmentsRepo: Send + Sync {
    async fn find_attachment(&self, id: i64) -> Result<Option<AttachmentRecord>, RepoError>;

    async fn item_attachments(&self, item: CatalogItem)
    -> Result<Vec<AttachmentRecord>, RepoError>;
}

#[async_trait]
pub trait TaxonomyRepo: Send + Sync {
    async fn item_terms(
        &self,
        item: CatalogItem,
        kind: TaxonomyKind,
    ) -> Result<Vec<TaxonomyRecord>, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;

    async fn user_pieces(&self, user_id: i64) -> Result<Vec<PieceRecord>, RepoError>;

    async fn user_movements(&self, user_id: i64) -> Result<Vec<MovementRecord>, RepoError>;
}

/// Everything the serializers and the catalogue service read.
pub trait CatalogRepo:
    PiecesRepo
    + MovementsRepo
    + ComposersRepo
    + CollectionsRepo
    + AttachmentsRepo
    + TaxonomyRepo
    + UsersRepo
{
}

impl<T> CatalogRepo for T where
    T: PiecesRepo
        + MovementsRepo
        + ComposersRepo
        + CollectionsRepo
        + AttachmentsRepo
        + TaxonomyRepo
        + UsersRepo
{
}
