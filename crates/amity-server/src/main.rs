use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use chrono::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use amity_api::middleware::require_auth;
use amity_api::{AppState, AppStateInner, auth, friends, requests, users};
use amity_core::{
    BlockRegistry, FriendGraph, FriendRequests, ListCache, ProfileSearch, RateLimiter,
};
use amity_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "amity=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("AMITY_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("AMITY_DB_PATH").unwrap_or_else(|_| "amity.db".into());
    let host = std::env::var("AMITY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("AMITY_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Policy knobs, injected into the core at construction
    let max_requests_per_minute: u32 = std::env::var("AMITY_MAX_REQUESTS_PER_MINUTE")
        .unwrap_or_else(|_| "3".into())
        .parse()?;
    let cooldown_secs: i64 = std::env::var("AMITY_COOLDOWN_SECS")
        .unwrap_or_else(|_| "86400".into())
        .parse()?;
    let cache_ttl_secs: u64 = std::env::var("AMITY_CACHE_TTL_SECS")
        .unwrap_or_else(|_| "30".into())
        .parse()?;
    let symmetric_blocks = std::env::var("AMITY_SYMMETRIC_BLOCKS")
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    // Init database
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);

    // Core services
    let blocks = BlockRegistry::new(db.clone(), symmetric_blocks);
    let limiter = RateLimiter::new(db.clone(), max_requests_per_minute, Duration::seconds(60));
    let cache = ListCache::new(std::time::Duration::from_secs(cache_ttl_secs));
    let request_machine = FriendRequests::new(
        db.clone(),
        blocks.clone(),
        limiter,
        cache.clone(),
        Duration::seconds(cooldown_secs),
    );
    let graph = FriendGraph::new(db.clone());
    let search = ProfileSearch::new(db.clone(), blocks.clone());

    let state: AppState = Arc::new(AppStateInner {
        db,
        blocks,
        requests: request_machine,
        graph,
        search,
        cache,
        jwt_secret,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users", get(users::search_users))
        .route("/users/{user_id}/request", post(requests::send_request))
        .route(
            "/users/{user_id}/block",
            post(users::block_user).delete(users::unblock_user),
        )
        .route("/requests/pending", get(requests::pending_requests))
        .route("/requests/{request_id}/accept", put(requests::accept_request))
        .route("/requests/{request_id}/reject", put(requests::reject_request))
        .route("/friends", get(friends::list_friends))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Amity server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
