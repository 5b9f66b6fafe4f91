use std::{process, sync::Arc};

use bazari::{
    application::auth::{AuthService, RegisterCommand},
    application::error::AppError,
    application::listing::ListingService,
    application::moderation::ModerationService,
    application::repos::{AdsRepo, AdsWriteRepo, PricesRepo, UsersRepo},
    application::stats::StatsService,
    cache::{CacheConsumer, CacheTrigger, EventQueue, SnapshotManager, SnapshotStore},
    config,
    infra::{db::PostgresRepositories, error::InfraError, http, telemetry},
};
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info};
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

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::RebuildSnapshot(_) => run_rebuild_snapshot(settings).await,
        config::Command::CreateAdmin(args) => run_create_admin(settings, args).await,
    }
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<PostgresRepositories, AppError> {
    let url = settings.database.url.as_deref().ok_or_else(|| {
        AppError::from(InfraError::configuration(
            "database.url must be set (file key database.url or BAZARI__DATABASE__URL)",
        ))
    })?;

    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)
        .map_err(AppError::from)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)
        .map_err(AppError::from)?;

    Ok(PostgresRepositories::new(pool))
}

struct CacheContext {
    store: Arc<SnapshotStore>,
    snapshots: Arc<SnapshotManager>,
    trigger: Arc<CacheTrigger>,
    consumer: Arc<CacheConsumer>,
}

fn build_cache_context(
    settings: &config::Settings,
    ads_repo: Arc<dyn AdsRepo>,
) -> CacheContext {
    let cache_config = settings.cache.clone();
    let store = Arc::new(SnapshotStore::new(cache_config.memory_ttl()));
    let snapshots = Arc::new(SnapshotManager::new(
        cache_config.snapshot_path.clone(),
        cache_config.file_ttl(),
        Arc::clone(&store),
        ads_repo,
    ));
    let queue = Arc::new(EventQueue::new());
    let consumer = Arc::new(CacheConsumer::new(
        cache_config.clone(),
        Arc::clone(&queue),
        Arc::clone(&snapshots),
    ));
    let trigger = Arc::new(CacheTrigger::new(
        cache_config,
        Arc::clone(&store),
        queue,
        Arc::clone(&consumer),
    ));
    CacheContext {
        store,
        snapshots,
        trigger,
        consumer,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let ads_repo: Arc<dyn AdsRepo> = Arc::new(repositories.clone());
    let ads_writes: Arc<dyn AdsWriteRepo> = Arc::new(repositories.clone());
    let users_repo: Arc<dyn UsersRepo> = Arc::new(repositories.clone());
    let prices_repo: Arc<dyn PricesRepo> = Arc::new(repositories.clone());

    let cache = build_cache_context(&settings, Arc::clone(&ads_repo));

    // Warm start: a fresh snapshot file skips the database entirely.
    if settings.cache.enabled {
        match cache.snapshots.load_on_startup().await {
            Ok(count) => info!(count, "snapshot ready"),
            Err(err) => {
                error!(error = %err, "startup snapshot load failed, serving cold");
                cache.trigger.warmup_on_startup();
            }
        }
    }

    let listing = Arc::new(ListingService::new(
        Arc::clone(&cache.store),
        Arc::clone(&cache.snapshots),
        Arc::clone(&ads_repo),
        &settings.cache,
    ));
    let moderation = Arc::new(ModerationService::new(
        Arc::clone(&ads_repo),
        ads_writes,
        Arc::clone(&cache.trigger),
    ));
    let auth = Arc::new(AuthService::new(
        Arc::clone(&users_repo),
        &settings.auth.token_secret,
        settings.auth.token_ttl,
    ));
    let stats = Arc::new(StatsService::new(
        Arc::clone(&listing),
        Arc::clone(&ads_repo),
        Arc::clone(&users_repo),
    ));

    let client_cache_version = OffsetDateTime::now_utc().unix_timestamp().to_string();
    let state = http::AppState {
        listing,
        moderation,
        auth,
        stats,
        prices: prices_repo,
        users: users_repo,
        snapshots: Arc::clone(&cache.snapshots),
        trigger: Arc::clone(&cache.trigger),
        db: Some(repositories),
        client_cache_version,
    };

    // Interval drain keeps the queue from sitting on events whose spawned
    // consumption raced a concurrent mutation.
    let consume_handle = {
        let consumer = Arc::clone(&cache.consumer);
        let interval_ms = settings.cache.auto_consume_interval_ms;
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_millis(interval_ms));
            interval.tick().await;
            loop {
                interval.tick().await;
                consumer.consume().await;
            }
        })
    };

    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(addr = %settings.server.addr, "listening");

    let result = axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")));

    consume_handle.abort();
    let _ = consume_handle.await;

    result
}

async fn run_rebuild_snapshot(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let ads_repo: Arc<dyn AdsRepo> = Arc::new(repositories);
    let cache = build_cache_context(&settings, ads_repo);

    let count = cache
        .snapshots
        .rebuild()
        .await
        .map_err(|err| AppError::unexpected(format!("snapshot rebuild failed: {err}")))?;
    info!(
        count,
        path = %settings.cache.snapshot_path.display(),
        "snapshot rebuilt"
    );
    Ok(())
}

async fn run_create_admin(
    settings: config::Settings,
    args: config::CreateAdminArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let users_repo: Arc<dyn UsersRepo> = Arc::new(repositories);
    let has_admin = users_repo
        .admin_exists()
        .await
        .map_err(|err| AppError::unexpected(format!("failed to query users: {err}")))?;
    if has_admin {
        return Err(AppError::unexpected(
            "an administrator account already exists",
        ));
    }
    let auth = AuthService::new(
        users_repo,
        &settings.auth.token_secret,
        settings.auth.token_ttl,
    );

    let user = auth
        .create_admin(RegisterCommand {
            name: args.name,
            email: args.email,
            password: args.password,
            phone: None,
        })
        .await
        .map_err(|err| AppError::unexpected(format!("failed to create admin: {err}")))?;

    info!(user_id = %user.id, email = %user.email, "administrator created");
    Ok(())
}
