use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::attachments::DownloadEntry;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub tier: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    pub tier: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DownloadSelectionRequest {
    pub items: Vec<i64>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DownloadSelectionResponse {
    pub items: Vec<DownloadEntry>,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub uuid: Uuid,
    pub removed: usize,
}
