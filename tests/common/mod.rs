#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use elvis::application::attachments::{MediaLocation, Principal, RequestOrigin};
use elvis::application::auth::TokenAuthenticator;
use elvis::application::catalog::CatalogService;
use elvis::application::repos::CatalogRepo;
use elvis::application::serializers::{SiteLinks, TieredSerializer, Viewer};
use elvis::cache::{CacheConfig, MemoryCache, RepresentationCache};
use elvis::config::ApiToken;
use elvis::infra::http::{ApiState, build_router};
use elvis::infra::memory::MemoryCatalog;

pub const PUBLIC_URL: &str = "https://elvis.example.org";
pub const ADA_TOKEN: &str = "ada-secret-token";

const FIXTURE: &str = include_str!("../fixtures/catalog.toml");

pub fn catalog() -> Arc<MemoryCatalog> {
    Arc::new(MemoryCatalog::from_toml(FIXTURE).expect("fixture parses"))
}

pub fn media() -> MediaLocation {
    MediaLocation {
        root: PathBuf::from("/media/"),
        url: "/static/media/".to_string(),
    }
}

pub fn memory_cache() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new(&CacheConfig::default()))
}

pub fn serializer_with(cache: Arc<dyn RepresentationCache>) -> Arc<TieredSerializer> {
    let catalog: Arc<dyn CatalogRepo> = catalog();
    Arc::new(TieredSerializer::new(
        cache,
        catalog,
        SiteLinks::new(PUBLIC_URL),
        media(),
    ))
}

pub fn service_with(cache: Arc<dyn RepresentationCache>) -> CatalogService {
    let catalog: Arc<dyn CatalogRepo> = catalog();
    let serializer = Arc::new(TieredSerializer::new(
        cache,
        catalog.clone(),
        SiteLinks::new(PUBLIC_URL),
        media(),
    ));
    CatalogService::new(catalog, serializer)
}

pub fn origin() -> RequestOrigin {
    RequestOrigin::new("https", "example.org")
}

pub fn anonymous() -> Viewer {
    Viewer::anonymous(origin())
}

pub fn ada() -> Viewer {
    Viewer::new(Principal::user("ada"), origin())
}

pub fn router() -> axum::Router {
    let auth = TokenAuthenticator::new(&[ApiToken {
        username: "ada".to_string(),
        token: ADA_TOKEN.to_string(),
    }]);
    build_router(ApiState {
        catalog: Arc::new(service_with(memory_cache())),
        auth: Arc::new(auth),
        default_scheme: "https".to_string(),
        default_host: "elvis.example.org".to_string(),
        allowed_hosts: vec!["elvis.example.org".to_string(), ".example.net".to_string()],
        db: None,
    })
}
