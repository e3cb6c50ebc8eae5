//! Domain entities mirrored from persistent storage.
//!
//! Records carry scalar attributes and foreign keys only. Many-to-many links
//! (collections, attachments, taxonomy terms) are resolved through the
//! repositories.

use serde::Deserialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::domain::types::TaxonomyKind;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComposerRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    #[serde(default, with = "iso_date::option")]
    pub birth_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub death_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PieceRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub title: String,
    #[serde(default)]
    pub composer_id: Option<i64>,
    #[serde(default)]
    pub creator_id: Option<i64>,
    #[serde(default)]
    pub composition_start_date: Option<i32>,
    #[serde(default)]
    pub composition_end_date: Option<i32>,
    #[serde(default)]
    pub religiosity: Option<String>,
    #[serde(default)]
    pub vocalization: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovementRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub title: String,
    /// Parent piece; `None` for free-standing movements.
    #[serde(default)]
    pub piece_id: Option<i64>,
    #[serde(default)]
    pub composer_id: Option<i64>,
    #[serde(default)]
    pub creator_id: Option<i64>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub composition_start_date: Option<i32>,
    #[serde(default)]
    pub composition_end_date: Option<i32>,
    #[serde(default)]
    pub religiosity: Option<String>,
    #[serde(default)]
    pub vocalization: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub title: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub creator_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttachmentRecord {
    pub id: i64,
    pub uuid: Uuid,
    /// Location of the file, relative to the media root or absolute beneath it.
    pub stored_path: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub uploader_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl AttachmentRecord {
    /// Last path component of the stored path.
    pub fn file_name(&self) -> &str {
        self.stored_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.stored_path)
    }

    /// Lower-cased extension without the dot; empty when the name has none.
    pub fn extension(&self) -> String {
        let name = self.file_name();
        match name.rfind('.') {
            Some(index) if index > 0 => name[index + 1..].to_ascii_lowercase(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl UserRecord {
    /// Display name: the username alone when no last name is recorded.
    pub fn display_name(&self) -> String {
        if self.last_name.is_empty() {
            self.username.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxonomyRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub kind: TaxonomyKind,
    pub title: String,
}
