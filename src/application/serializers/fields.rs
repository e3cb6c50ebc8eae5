//! Declared field sets per (entity, tier).
//!
//! Each richer tier starts with every field of the tier below it, so cached
//! LIST and EMB values can be projected down to MIN.

use crate::domain::types::EntityKind;

use super::Tier;

const PIECE_MIN: &[&str] = &["title", "url", "id"];
const PIECE_LIST: &[&str] = &[
    "title",
    "url",
    "id",
    "composer",
    "movement_count",
    "composition_end_date",
];
const PIECE_EMBED: &[&str] = &[
    "title",
    "url",
    "id",
    "composer",
    "movement_count",
    "composition_end_date",
    "movements",
    "attachments",
];
const PIECE_FULL: &[&str] = &[
    "title",
    "url",
    "id",
    "composer",
    "movement_count",
    "composition_end_date",
    "movements",
    "attachments",
    "composition_start_date",
    "religiosity",
    "vocalization",
    "comment",
    "tags",
    "genres",
    "instruments_voices",
    "languages",
    "locations",
    "sources",
    "collections",
    "creator",
    "created",
    "updated",
];

const MOVEMENT_MIN: &[&str] = &["title", "url", "id"];
const MOVEMENT_LIST: &[&str] = &["title", "url", "id", "composer", "composition_end_date"];
const MOVEMENT_EMBED: &[&str] = &[
    "title",
    "url",
    "id",
    "composer",
    "composition_end_date",
    "attachments",
    "piece",
];
const MOVEMENT_FULL: &[&str] = &[
    "title",
    "url",
    "id",
    "composer",
    "composition_end_date",
    "attachments",
    "piece",
    "position",
    "composition_start_date",
    "religiosity",
    "vocalization",
    "comment",
    "tags",
    "genres",
    "instruments_voices",
    "languages",
    "locations",
    "sources",
    "collections",
    "creator",
    "created",
    "updated",
];

const COMPOSER_MIN: &[&str] = &["title", "url", "id"];
const COMPOSER_LIST: &[&str] = &[
    "title",
    "url",
    "id",
    "name",
    "birth_date",
    "death_date",
    "piece_count",
    "movement_count",
];
const COMPOSER_FULL: &[&str] = &[
    "title",
    "url",
    "id",
    "name",
    "birth_date",
    "death_date",
    "piece_count",
    "movement_count",
    "pieces",
    "free_movements",
    "created",
    "updated",
];

const COLLECTION_MIN: &[&str] = &["title", "url", "id", "public"];
const COLLECTION_LIST: &[&str] = &[
    "title",
    "url",
    "id",
    "public",
    "piece_count",
    "movement_count",
    "creator",
];
const COLLECTION_FULL: &[&str] = &[
    "title",
    "url",
    "id",
    "public",
    "piece_count",
    "movement_count",
    "creator",
    "comment",
    "pieces",
    "movements",
    "created",
    "updated",
];

const ATTACHMENT_MIN: &[&str] = &["file_name", "url"];
const ATTACHMENT_EMBED: &[&str] = &["file_name", "url", "id", "extension", "source"];
const ATTACHMENT_FULL: &[&str] = &[
    "file_name",
    "url",
    "id",
    "extension",
    "source",
    "created",
    "updated",
    "uploader",
    "attachment",
];

const USER_MIN: &[&str] = &["name", "username", "id"];
const USER_FULL: &[&str] = &["name", "username", "id", "url", "pieces", "movements"];

const TAXONOMY_MIN: &[&str] = &["title", "id"];

/// Ordered field names for `tier`, or `None` when the entity does not offer it.
pub fn declared(kind: EntityKind, tier: Tier) -> Option<&'static [&'static str]> {
    match (kind, tier) {
        (EntityKind::Piece, Tier::Min) => Some(PIECE_MIN),
        (EntityKind::Piece, Tier::List) => Some(PIECE_LIST),
        (EntityKind::Piece, Tier::Embed) => Some(PIECE_EMBED),
        (EntityKind::Piece, Tier::Full) => Some(PIECE_FULL),

        (EntityKind::Movement, Tier::Min) => Some(MOVEMENT_MIN),
        (EntityKind::Movement, Tier::List) => Some(MOVEMENT_LIST),
        (EntityKind::Movement, Tier::Embed) => Some(MOVEMENT_EMBED),
        (EntityKind::Movement, Tier::Full) => Some(MOVEMENT_FULL),

        (EntityKind::Composer, Tier::Min) => Some(COMPOSER_MIN),
        (EntityKind::Composer, Tier::List) => Some(COMPOSER_LIST),
        (EntityKind::Composer, Tier::Full) => Some(COMPOSER_FULL),

        (EntityKind::Collection, Tier::Min) => Some(COLLECTION_MIN),
        (EntityKind::Collection, Tier::List) => Some(COLLECTION_LIST),
        (EntityKind::Collection, Tier::Full) => Some(COLLECTION_FULL),

        (EntityKind::Attachment, Tier::Min) => Some(ATTACHMENT_MIN),
        (EntityKind::Attachment, Tier::Embed) => Some(ATTACHMENT_EMBED),
        (EntityKind::Attachment, Tier::Full) => Some(ATTACHMENT_FULL),

        (EntityKind::User, Tier::Min) => Some(USER_MIN),
        (EntityKind::User, Tier::Full) => Some(USER_FULL),

        (EntityKind::Taxonomy(_), Tier::Min) => Some(TAXONOMY_MIN),

        _ => None,
    }
}

/// Whether `kind` offers `tier`.
pub fn declares(kind: EntityKind, tier: Tier) -> bool {
    declared(kind, tier).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TaxonomyKind;

    const KINDS: [EntityKind; 7] = [
        EntityKind::Piece,
        EntityKind::Movement,
        EntityKind::Composer,
        EntityKind::Collection,
        EntityKind::Attachment,
        EntityKind::User,
        EntityKind::Taxonomy(TaxonomyKind::Genre),
    ];

    #[test]
    fn every_kind_declares_min() {
        for kind in KINDS {
            assert!(declares(kind, Tier::Min), "{kind} has no MIN");
        }
    }

    #[test]
    fn declared_tiers_are_nested_prefixes() {
        for kind in KINDS {
            let declared_tiers: Vec<&[&str]> = Tier::ALL
                .into_iter()
                .filter_map(|tier| declared(kind, tier))
                .collect();
            for pair in declared_tiers.windows(2) {
                let (lower, upper) = (pair[0], pair[1]);
                assert!(
                    upper.starts_with(lower),
                    "{kind}: {lower:?} is not a prefix of {upper:?}"
                );
            }
        }
    }

    #[test]
    fn no_duplicate_fields() {
        for kind in KINDS {
            for tier in Tier::ALL {
                if let Some(fields) = declared(kind, tier) {
                    let mut sorted = fields.to_vec();
                    sorted.sort_unstable();
                    sorted.dedup();
                    assert_eq!(sorted.len(), fields.len(), "{kind}/{tier} repeats a field");
                }
            }
        }
    }

    #[test]
    fn undeclared_tiers() {
        assert!(!declares(EntityKind::Composer, Tier::Embed));
        assert!(!declares(EntityKind::Attachment, Tier::List));
        assert!(!declares(EntityKind::User, Tier::List));
        assert!(!declares(EntityKind::Taxonomy(TaxonomyKind::Tag), Tier::Full));
    }
}
