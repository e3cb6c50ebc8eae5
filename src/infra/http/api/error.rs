use std::error::Error as StdError;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::catalog::CatalogError;
use crate::application::error::ErrorReport;
use crate::application::pagination::PaginationError;
use crate::application::repos::RepoError;
use crate::application::serializers::SerializeError;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_PATH: &str = "invalid_path";
    pub const INVALID_QUERY: &str = "invalid_query";
    pub const INVALID_BODY: &str = "invalid_body";
    pub const INVALID_CURSOR: &str = "invalid_cursor";
    pub const INVALID_TIER: &str = "invalid_tier";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const SERIALIZE: &str = "serialize_error";
    pub const ATTACHMENT_URL: &str = "attachment_url_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    chain: Vec<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            chain: Vec::new(),
        }
    }

    /// Server-side failure: the body stays generic, the chain goes to the logs.
    pub fn internal(code: &'static str, message: &'static str, source: &dyn StdError) -> Self {
        let report = ErrorReport::from_error(
            "infra::http::api",
            StatusCode::INTERNAL_SERVER_ERROR,
            source,
        );
        Self {
            chain: report.messages,
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message, None)
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, message, None)
    }

    pub fn not_found(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, hint)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let summary = format!(
            "{}: {}",
            self.code,
            self.hint.as_deref().unwrap_or(self.message)
        );
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        let report = if self.chain.is_empty() {
            ErrorReport::from_message("infra::http::api", self.status, summary)
        } else {
            ErrorReport {
                source: "infra::http::api",
                status: self.status,
                messages: self.chain,
            }
        };
        report.attach(&mut response);
        response
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Domain(DomainError::NotFound { .. }) => {
                ApiError::not_found("Record not found", Some(err.to_string()))
            }
            CatalogError::Domain(ref inner @ DomainError::Invariant { .. }) => {
                ApiError::internal(codes::INTEGRITY, "Catalogue data is inconsistent", inner)
            }
            CatalogError::NotListable(_) | CatalogError::NoDetail(_) => {
                ApiError::not_found("Resource not found", Some(err.to_string()))
            }
            CatalogError::Unauthorized => ApiError::unauthorized("Authentication required"),
            CatalogError::Serialize(inner) => serialize_error(inner),
            CatalogError::Repo(inner) => repo_error(inner),
            CatalogError::AttachmentUrl(ref inner) => ApiError::internal(
                codes::ATTACHMENT_URL,
                "Failed to resolve attachment link",
                inner,
            ),
        }
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::InvalidCursor(_) => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_CURSOR,
                "Invalid cursor",
                Some(err.to_string()),
            ),
            PaginationError::InvalidLimit(_) => {
                ApiError::bad_request("Invalid limit", Some(err.to_string()))
            }
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_PATH,
            "Invalid path parameter",
            Some(rejection.body_text()),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_QUERY,
            "Invalid query string",
            Some(rejection.body_text()),
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        ApiError::new(
            status,
            codes::INVALID_BODY,
            "Invalid request body",
            Some(rejection.body_text()),
        )
    }
}

fn serialize_error(err: SerializeError) -> ApiError {
    match err {
        SerializeError::UnsupportedTier { .. } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_TIER,
            "Tier not available for this record",
            Some(err.to_string()),
        ),
        SerializeError::Repo(inner) => repo_error(inner),
        SerializeError::AttachmentUrl(ref inner) => ApiError::internal(
            codes::ATTACHMENT_URL,
            "Failed to resolve attachment link",
            inner,
        ),
        SerializeError::Format { .. } => {
            ApiError::internal(codes::SERIALIZE, "Failed to serialize record", &err)
        }
    }
}

fn repo_error(err: RepoError) -> ApiError {
    match err {
        RepoError::Pagination(inner) => inner.into(),
        RepoError::NotFound => ApiError::not_found("Resource not found", None),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Integrity { .. } => {
            ApiError::internal(codes::INTEGRITY, "Integrity constraint violated", &err)
        }
        RepoError::Persistence(_) => ApiError::internal(codes::REPO, "Persistence error", &err),
    }
}
