//! Shared cursor pagination helpers.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE_LIMIT: u32 = 25;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct IdCursorPayload {
    id: i64,
}

/// Keyset cursor over ascending primary keys: the next page starts after `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCursor {
    id: i64,
}

impl IdCursor {
    pub fn new(id: i64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn encode(&self) -> String {
        let payload = serde_json::json!({ "id": self.id });
        URL_SAFE_NO_PAD.encode(payload.to_string())
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        let payload: IdCursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        Ok(Self { id: payload.id })
    }
}

/// Cursor-aware pagination request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<C> {
    pub limit: u32,
    pub cursor: Option<C>,
}

impl<C> PageRequest<C> {
    pub fn new(limit: u32, cursor: Option<C>) -> Self {
        Self { limit, cursor }
    }
}

impl PageRequest<IdCursor> {
    /// Validate raw query parameters into a request.
    pub fn from_query(limit: Option<u32>, cursor: Option<&str>) -> Result<Self, PaginationError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(PaginationError::InvalidLimit(limit));
        }
        let cursor = match cursor {
            Some(raw) if !raw.is_empty() => Some(IdCursor::decode(raw)?),
            _ => None,
        };
        Ok(Self::new(limit, cursor))
    }

    pub fn after_id(&self) -> Option<i64> {
        self.cursor.map(|cursor| cursor.id())
    }
}

/// Cursor-aware page result.
#[derive(Debug, Clone, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }
}

/// Build a page from `limit + 1` rows fetched in ascending id order.
pub fn page_from_rows<T>(mut rows: Vec<T>, limit: u32, id_of: impl Fn(&T) -> i64) -> CursorPage<T> {
    let limit = limit as usize;
    if rows.len() > limit {
        rows.truncate(limit);
        let next_cursor = rows.last().map(|row| IdCursor::new(id_of(row)).encode());
        CursorPage::new(rows, next_cursor)
    } else {
        CursorPage::new(rows, None)
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("limit must be between 1 and 100, got {0}")]
    InvalidLimit(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_cursor_round_trip() {
        let encoded = IdCursor::new(42).encode();
        let decoded = IdCursor::decode(&encoded).expect("decoded cursor");
        assert_eq!(decoded.id(), 42);
    }

    #[test]
    fn decoding_invalid_cursor_reports_error() {
        let err = IdCursor::decode("not base64!").expect_err("invalid cursor rejected");
        assert!(matches!(err, PaginationError::InvalidCursor(_)));

        let garbage = URL_SAFE_NO_PAD.encode("{\"nope\":1}");
        let err = IdCursor::decode(&garbage).expect_err("wrong payload rejected");
        assert!(matches!(err, PaginationError::InvalidCursor(_)));
    }

    #[test]
    fn request_defaults_and_bounds() {
        let request = PageRequest::from_query(None, None).expect("defaults");
        assert_eq!(request.limit, DEFAULT_PAGE_LIMIT);
        assert!(request.cursor.is_none());

        assert!(matches!(
            PageRequest::from_query(Some(0), None),
            Err(PaginationError::InvalidLimit(0))
        ));
        assert!(matches!(
            PageRequest::from_query(Some(101), None),
            Err(PaginationError::InvalidLimit(101))
        ));
        assert!(PageRequest::from_query(Some(100), Some("")).is_ok());
    }

    #[test]
    fn page_from_rows_emits_cursor_only_when_more_rows_exist() {
        let page = page_from_rows(vec![1_i64, 2, 3], 2, |id| *id);
        assert_eq!(page.items, vec![1, 2]);
        let next = page.next_cursor.expect("next cursor");
        assert_eq!(IdCursor::decode(&next).expect("decodes").id(), 2);

        let last = page_from_rows(vec![4_i64, 5], 2, |id| *id);
        assert_eq!(last.items, vec![4, 5]);
        assert!(last.next_cursor.is_none());
    }
}
