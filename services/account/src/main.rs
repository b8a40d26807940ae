use std::time::Duration;

use anyhow::Context as _;
use axum::http::StatusCode;
use sea_orm::Database;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use passage_account::config::AccountConfig;
use passage_account::infra::LivePorts;
use passage_account::infra::cache::RedisCodeStore;
use passage_account::infra::db::DbUserRepository;
use passage_account::infra::hasher::Argon2Hasher;
use passage_account::infra::outbox::{LogEmailSender, OutboxRelay};
use passage_account::infra::rate_limit::RedisRateLimiter;
use passage_account::infra::token::JwtTokenIssuer;
use passage_account::router::build_router;
use passage_account::state::AppState;
use passage_account::usecase::AccountService;
use passage_core::config::Config;
use passage_core::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AccountConfig::from_env()?;
    init_tracing(config.log_format);

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    let redis = deadpool_redis::Config::from_url(&config.redis_url)
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .context("create Redis pool")?;

    let keys = config.key_set().context("load JWT signing keys")?;

    let service = AccountService::<LivePorts>::new(
        DbUserRepository { db: db.clone() },
        RedisCodeStore {
            pool: redis.clone(),
        },
        RedisRateLimiter {
            pool: redis,
            max: config.rate_limit_max,
            window: Duration::from_secs(config.rate_limit_window_secs),
        },
        Argon2Hasher::new()?,
        JwtTokenIssuer { keys },
        config.settings(),
    );

    let relay = OutboxRelay::new(db, LogEmailSender)
        .with_poll_interval(Duration::from_millis(config.outbox_poll_interval_ms))
        .with_batch_size(config.outbox_batch_size)
        .start();

    let router = build_router(AppState::new(service)).layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.request_timeout_secs),
    ));
    let addr = format!("0.0.0.0:{}", config.account_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("account service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    relay.abort();
    info!("account service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
