use std::{future::IntoFuture, process, sync::Arc};

use elvis::{
    application::{
        attachments::MediaLocation,
        auth::TokenAuthenticator,
        catalog::CatalogService,
        error::AppError,
        repos::CatalogRepo,
        serializers::{SiteLinks, TieredSerializer},
    },
    cache::{CacheConfig, build_cache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        memory::MemoryCatalog,
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let (catalog, db) = init_catalog(&settings).await?;

    let cache = build_cache(&CacheConfig::from(&settings.cache));
    let serializer = Arc::new(TieredSerializer::new(
        cache,
        catalog.clone(),
        SiteLinks::new(&settings.site.public_url),
        MediaLocation::from(&settings.media),
    ));
    let service = Arc::new(CatalogService::new(catalog, serializer));

    if settings.cache.enabled && settings.cache.warm_on_startup {
        service.warm().await?;
    }

    let auth = TokenAuthenticator::new(&settings.auth.tokens);
    if auth.is_empty() {
        warn!(
            target = "elvis::serve",
            "No API tokens configured; every request is anonymous"
        );
    }

    let state = ApiState {
        catalog: service,
        auth: Arc::new(auth),
        default_scheme: settings.server.public_scheme.clone(),
        default_host: settings.site.host.clone(),
        allowed_hosts: settings.site.allowed_hosts.clone(),
        db,
    };

    serve_http(&settings, state).await
}

type CatalogHandles = (Arc<dyn CatalogRepo>, Option<Arc<PostgresRepositories>>);

async fn init_catalog(settings: &config::Settings) -> Result<CatalogHandles, AppError> {
    if let Some(path) = settings.database.fixture.as_ref() {
        let catalog: Arc<dyn CatalogRepo> = Arc::new(MemoryCatalog::load(path).await?);
        return Ok((catalog, None));
    }

    let database_url = settings.database.url.as_ref().ok_or_else(|| {
        InfraError::configuration("neither a database url nor a catalogue fixture is configured")
    })?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    let catalog: Arc<dyn CatalogRepo> = repositories.clone();
    Ok((catalog, Some(repositories)))
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings.database.url.as_deref().ok_or_else(|| {
        AppError::validation(
            "database url is required (provide --database-url or set ELVIS__DATABASE__URL)",
        )
    })?;

    let pool = PostgresRepositories::connect(database_url, 1)
        .await
        .map_err(InfraError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    info!(target = "elvis::migrate", "Migrations applied");
    Ok(())
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "elvis::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    let shutdown = Arc::new(Notify::new());
    let signalled = shutdown.clone();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            wait_for_signal().await;
            info!(target = "elvis::serve", "Shutdown signal received");
            signalled.notify_waiters();
        },
    );

    let grace = settings.server.graceful_shutdown;
    let deadline = async {
        shutdown.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = deadline => {
            warn!(
                target = "elvis::serve",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
        }
    }

    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
