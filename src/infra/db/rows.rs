//! Row shapes returned by catalogue queries.

use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::entities::{
    AttachmentRecord, CollectionRecord, ComposerRecord, MovementRecord, PieceRecord,
    TaxonomyRecord, UserRecord,
};
use crate::domain::types::TaxonomyKind;

pub(super) const COMPOSER_COLUMNS: &str =
    "c.id, c.uuid, c.name, c.birth_date, c.death_date, c.created_at, c.updated_at";

pub(super) const PIECE_COLUMNS: &str = "p.id, p.uuid, p.title, p.composer_id, p.creator_id, \
    p.composition_start_date, p.composition_end_date, p.religiosity, p.vocalization, \
    p.comment, p.created_at, p.updated_at";

pub(super) const MOVEMENT_COLUMNS: &str = "m.id, m.uuid, m.title, m.piece_id, m.composer_id, \
    m.creator_id, m.position, m.composition_start_date, m.composition_end_date, \
    m.religiosity, m.vocalization, m.comment, m.created_at, m.updated_at";

pub(super) const COLLECTION_COLUMNS: &str =
    "col.id, col.uuid, col.title, col.comment, col.public, col.creator_id, col.created_at, col.updated_at";

pub(super) const ATTACHMENT_COLUMNS: &str =
    "a.id, a.uuid, a.stored_path, a.source, a.uploader_id, a.created_at, a.updated_at";

#[derive(sqlx::FromRow)]
pub(super) struct ComposerRow {
    id: i64,
    uuid: Uuid,
    name: String,
    birth_date: Option<Date>,
    death_date: Option<Date>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ComposerRow> for ComposerRecord {
    fn from(row: ComposerRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            name: row.name,
            birth_date: row.birth_date,
            death_date: row.death_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct PieceRow {
    id: i64,
    uuid: Uuid,
    title: String,
    composer_id: Option<i64>,
    creator_id: Option<i64>,
    composition_start_date: Option<i32>,
    composition_end_date: Option<i32>,
    religiosity: Option<String>,
    vocalization: Option<String>,
    comment: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PieceRow> for PieceRecord {
    fn from(row: PieceRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            title: row.title,
            composer_id: row.composer_id,
            creator_id: row.creator_id,
            composition_start_date: row.composition_start_date,
            composition_end_date: row.composition_end_date,
            religiosity: row.religiosity,
            vocalization: row.vocalization,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct MovementRow {
    id: i64,
    uuid: Uuid,
    title: String,
    piece_id: Option<i64>,
    composer_id: Option<i64>,
    creator_id: Option<i64>,
    position: Option<i32>,
    composition_start_date: Option<i32>,
    composition_end_date: Option<i32>,
    religiosity: Option<String>,
    vocalization: Option<String>,
    comment: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<MovementRow> for MovementRecord {
    fn from(row: MovementRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            title: row.title,
            piece_id: row.piece_id,
            composer_id: row.composer_id,
            creator_id: row.creator_id,
            position: row.position,
            composition_start_date: row.composition_start_date,
            composition_end_date: row.composition_end_date,
            religiosity: row.religiosity,
            vocalization: row.vocalization,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CollectionRow {
    id: i64,
    uuid: Uuid,
    title: String,
    comment: String,
    public: bool,
    creator_id: Option<i64>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CollectionRow> for CollectionRecord {
    fn from(row: CollectionRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            title: row.title,
            comment: row.comment,
            public: row.public,
            creator_id: row.creator_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct AttachmentRow {
    id: i64,
    uuid: Uuid,
    stored_path: String,
    source: Option<String>,
    uploader_id: Option<i64>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AttachmentRow> for AttachmentRecord {
    fn from(row: AttachmentRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            stored_path: row.stored_path,
            source: row.source,
            uploader_id: row.uploader_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct UserRow {
    id: i64,
    uuid: Uuid,
    username: String,
    first_name: String,
    last_name: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct TermRow {
    id: i64,
    uuid: Uuid,
    kind: TaxonomyKind,
    title: String,
}

impl From<TermRow> for TaxonomyRecord {
    fn from(row: TermRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            kind: row.kind,
            title: row.title,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CountsRow {
    pub pieces: i64,
    pub movements: i64,
}
