use std::sync::Arc;

use crate::application::auth::TokenAuthenticator;
use crate::application::catalog::CatalogService;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<CatalogService>,
    pub auth: Arc<TokenAuthenticator>,
    /// Scheme and host used when the request carries no `Host` or
    /// `X-Forwarded-Proto` header.
    pub default_scheme: String,
    pub default_host: String,
    /// `Host` values trusted for absolute links; anything else falls back
    /// to `default_host`.
    pub allowed_hosts: Vec<String>,
    /// `None` when serving a fixture catalogue.
    pub db: Option<Arc<PostgresRepositories>>,
}
