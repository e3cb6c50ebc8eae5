use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::attachments::{Authority, RequestOrigin};
use crate::application::auth::AuthError;
use crate::application::serializers::Viewer;

use super::error::ApiError;
use super::state::ApiState;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Attach the request's [`Viewer`]. No token means anonymous; a bad one is 401.
pub async fn api_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::Malformed));

    let principal = match header.transpose() {
        Ok(raw) => state.auth.principal(raw),
        Err(err) => Err(err),
    };
    let principal = match principal {
        Ok(principal) => principal,
        Err(AuthError::Malformed) => {
            return ApiError::unauthorized("Malformed authorization header").into_response();
        }
        Err(AuthError::Invalid) => {
            return ApiError::unauthorized("Unknown token").into_response();
        }
    };

    let origin = request_origin(request.headers(), &state);
    request
        .extensions_mut()
        .insert(Viewer::new(principal.clone(), origin));

    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

fn request_origin(headers: &HeaderMap, state: &ApiState) -> RequestOrigin {
    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| value == "http" || value == "https")
        .unwrap_or_else(|| state.default_scheme.clone());
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .and_then(Authority::parse)
        .filter(|authority| {
            state
                .allowed_hosts
                .iter()
                .any(|pattern| authority.matches(pattern))
        })
        .map(|authority| authority.to_string())
        .unwrap_or_else(|| state.default_host.clone());
    RequestOrigin::new(scheme, host)
}
