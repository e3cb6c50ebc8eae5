//! Shared domain enumerations aligned with persisted database enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every record type the catalogue can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Piece,
    Movement,
    Composer,
    Collection,
    Attachment,
    User,
    Taxonomy(TaxonomyKind),
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Piece => "piece",
            EntityKind::Movement => "movement",
            EntityKind::Composer => "composer",
            EntityKind::Collection => "collection",
            EntityKind::Attachment => "attachment",
            EntityKind::User => "user",
            EntityKind::Taxonomy(kind) => kind.as_str(),
        }
    }

    /// Path segment of the detail endpoint, `None` for records without one.
    pub fn route_segment(self) -> Option<&'static str> {
        match self {
            EntityKind::Piece => Some("pieces"),
            EntityKind::Movement => Some("movements"),
            EntityKind::Composer => Some("composers"),
            EntityKind::Collection => Some("collections"),
            EntityKind::Attachment => Some("attachments"),
            EntityKind::User => Some("users"),
            EntityKind::Taxonomy(_) => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat vocabularies attached to pieces and movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "taxonomy_kind", rename_all = "snake_case")]
pub enum TaxonomyKind {
    Tag,
    Genre,
    InstrumentVoice,
    Language,
    Location,
    Source,
}

impl TaxonomyKind {
    pub const ALL: [TaxonomyKind; 6] = [
        TaxonomyKind::Tag,
        TaxonomyKind::Genre,
        TaxonomyKind::InstrumentVoice,
        TaxonomyKind::Language,
        TaxonomyKind::Location,
        TaxonomyKind::Source,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaxonomyKind::Tag => "tag",
            TaxonomyKind::Genre => "genre",
            TaxonomyKind::InstrumentVoice => "instrument_voice",
            TaxonomyKind::Language => "language",
            TaxonomyKind::Location => "location",
            TaxonomyKind::Source => "source",
        }
    }

    /// Field name used for the list of terms on piece and movement details.
    pub fn plural_field(self) -> &'static str {
        match self {
            TaxonomyKind::Tag => "tags",
            TaxonomyKind::Genre => "genres",
            TaxonomyKind::InstrumentVoice => "instruments_voices",
            TaxonomyKind::Language => "languages",
            TaxonomyKind::Location => "locations",
            TaxonomyKind::Source => "sources",
        }
    }
}

/// A piece or a movement: the two kinds of item that carry attachments,
/// taxonomy terms and collection membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogItem {
    Piece(i64),
    Movement(i64),
}

impl CatalogItem {
    pub fn id(self) -> i64 {
        match self {
            CatalogItem::Piece(id) | CatalogItem::Movement(id) => id,
        }
    }
}
