use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::serializers::{Tier, Viewer};
use crate::domain::types::EntityKind;

use super::error::{ApiError, codes};
use super::models::*;
use super::state::ApiState;

pub async fn list_entities(
    kind: EntityKind,
    state: ApiState,
    viewer: Viewer,
    query: ListQuery,
) -> Result<impl IntoResponse, ApiError> {
    let tier = parse_tier(query.tier.as_deref())?;
    let page = PageRequest::from_query(query.limit, query.cursor.as_deref())?;
    let page = state.catalog.list(kind, tier, page, &viewer).await?;
    Ok(Json(page))
}

pub async fn entity_detail(
    kind: EntityKind,
    state: ApiState,
    viewer: Viewer,
    id: i64,
    query: DetailQuery,
) -> Result<impl IntoResponse, ApiError> {
    let tier = parse_tier(query.tier.as_deref())?;
    let representation = state.catalog.detail(kind, id, tier, &viewer).await?;
    Ok(Json(representation))
}

pub async fn select_downloads(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    payload: Result<Json<DownloadSelectionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let items = state
        .catalog
        .select_downloads(&payload.items, &payload.types, &viewer)
        .await?;
    Ok(Json(DownloadSelectionResponse { items }))
}

pub async fn purge_cache(
    State(state): State<ApiState>,
    Extension(viewer): Extension<Viewer>,
    uuid: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(uuid) = uuid?;
    let removed = state.catalog.purge(uuid, &viewer)?;
    Ok(Json(PurgeResponse { uuid, removed }))
}

pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    match state.db.as_ref() {
        Some(db) => crate::infra::http::db_health_response(db.health_check().await),
        None => axum::http::StatusCode::NO_CONTENT.into_response(),
    }
}

fn parse_tier(raw: Option<&str>) -> Result<Option<Tier>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<Tier>().map(Some).map_err(|err| {
            ApiError::new(
                axum::http::StatusCode::BAD_REQUEST,
                codes::INVALID_TIER,
                "Unknown tier",
                Some(err.to_string()),
            )
        }),
    }
}
