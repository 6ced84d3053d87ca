//! Yatube server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, middleware};
use fred::prelude::*;
use tokio::signal;
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_common::{
    Config, LocalStorage, MemoryPageCache, RedisPageCache, SharedPageCache,
    config::CacheBackend,
};
use yatube_core::{CommentService, FollowService, GroupService, PostService, UserService};
use yatube_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};
use yatube_web::{AppState, auth_middleware, router};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the page cache selected in the configuration.
async fn page_cache(config: &Config) -> Result<SharedPageCache, Box<dyn std::error::Error>> {
    let ttl = Duration::from_secs(config.cache.index_ttl_secs);

    match (config.cache.backend, &config.redis) {
        (CacheBackend::Redis, Some(redis)) => {
            info!("Connecting to Redis...");
            let fred_config = fred::types::config::Config::from_url(&redis.url)?;
            let client = fred::clients::Client::new(fred_config, None, None, None);
            client.connect();
            client.wait_for_connect().await?;
            info!("Using Redis page cache");

            Ok(Arc::new(RedisPageCache::new(
                Arc::new(client),
                redis.prefix.clone(),
                ttl,
            )))
        }
        (CacheBackend::Redis, None) => {
            Err("cache.backend is \"redis\" but no [redis] section is configured".into())
        }
        (CacheBackend::Memory, _) => {
            info!("Using in-process page cache");
            Ok(Arc::new(MemoryPageCache::new(ttl)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting yatube server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(yatube_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    yatube_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));

    // Storage for post images
    tokio::fs::create_dir_all(&config.media.root).await?;
    let storage = Arc::new(LocalStorage::new(
        config.media.root.clone(),
        config.media.base_url.clone(),
    ));
    info!(root = %config.media.root.display(), "Using local media storage");

    // Initialize services
    let state = AppState {
        user_service: UserService::new(user_repo.clone(), &config),
        post_service: PostService::new(
            post_repo.clone(),
            user_repo.clone(),
            group_repo.clone(),
            storage,
        ),
        group_service: GroupService::new(group_repo),
        comment_service: CommentService::new(comment_repo, post_repo, user_repo.clone()),
        follow_service: FollowService::new(follow_repo, user_repo),
        page_cache: page_cache(&config).await?,
    };

    let app = router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.media.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
