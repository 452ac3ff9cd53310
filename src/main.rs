use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use label_backend::{
    AppState, build_router,
    config::{Config, StoreBackend},
    middleware::{RateLimiter, log_errors, rate_limit},
    routes::project::Project,
    store::{MemoryStore, PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 打开存储
    let store = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().unwrap_or_default();
            let pg = PgStore::connect(url, config.db_max_connections)
                .await
                .expect("Failed to connect to Postgres");
            pg.ensure_schema().await.expect("Failed to create schema");
            pg.ensure_unique::<Project>()
                .await
                .expect("Failed to create project id index");
            Store::postgres(pg, config.deadlines())
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Store::memory(MemoryStore::new(), config.deadlines())
        }
    };

    let state = AppState {
        store,
        config: config.clone(),
    };

    let router = build_router(state).layer(axum::middleware::from_fn(log_errors));

    // 配置了 Redis 才启用限流
    let router = match &config.redis_url {
        Some(redis_url) => {
            let redis_client =
                redis::Client::open(redis_url.as_str()).expect("Failed to create Redis client");
            let rate_limiter = Arc::new(RateLimiter::new(redis_client, &config));
            router.layer(axum::middleware::from_fn_with_state(rate_limiter, rate_limit))
        }
        None => {
            tracing::info!("REDIS_URL not set, rate limiting disabled");
            router
        }
    };

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
