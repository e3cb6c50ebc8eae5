pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::{
        Extension, Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::Uri,
    middleware as axum_middleware,
    routing::{MethodRouter, delete, get, post},
};

use crate::application::catalog::LISTABLE_KINDS;
use crate::application::serializers::Viewer;
use crate::domain::types::EntityKind;
use crate::infra::http::middleware::{log_responses, set_request_context};

use error::ApiError;
use models::{DetailQuery, ListQuery};

/// Kinds with a detail endpoint.
const DETAIL_KINDS: [EntityKind; 6] = [
    EntityKind::Piece,
    EntityKind::Movement,
    EntityKind::Composer,
    EntityKind::Collection,
    EntityKind::Attachment,
    EntityKind::User,
];

pub fn build_router(state: ApiState) -> Router {
    let auth_state = state.clone();

    let mut api = Router::new()
        .route("/api/downloads/selection", post(handlers::select_downloads))
        .route("/api/cache/{uuid}", delete(handlers::purge_cache));

    for kind in LISTABLE_KINDS {
        if let Some(segment) = kind.route_segment() {
            api = api.route(&format!("/api/{segment}"), list_route(kind));
        }
    }
    for kind in DETAIL_KINDS {
        if let Some(segment) = kind.route_segment() {
            api = api.route(&format!("/api/{segment}/{{id}}"), detail_route(kind));
        }
    }

    let api = api.layer(axum_middleware::from_fn_with_state(
        auth_state,
        middleware::api_auth,
    ));

    Router::new()
        .route("/_health", get(handlers::health))
        .merge(api)
        .fallback(not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

fn list_route(kind: EntityKind) -> MethodRouter<ApiState> {
    get(
        move |State(state): State<ApiState>,
              Extension(viewer): Extension<Viewer>,
              query: Result<Query<ListQuery>, QueryRejection>| async move {
            let Query(query) = query?;
            handlers::list_entities(kind, state, viewer, query).await
        },
    )
}

fn detail_route(kind: EntityKind) -> MethodRouter<ApiState> {
    get(
        move |State(state): State<ApiState>,
              Extension(viewer): Extension<Viewer>,
              id: Result<Path<i64>, PathRejection>,
              query: Result<Query<DetailQuery>, QueryRejection>| async move {
            let Path(id) = id?;
            let Query(query) = query?;
            handlers::entity_detail(kind, state, viewer, id, query).await
        },
    )
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found("No such route", Some(format!("no route for {}", uri.path())))
}
