mod api;
mod importer;
mod middleware;
mod rate_limit;

use std::{sync::Arc, time::Duration};

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
    rate_limit::RateLimiter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = shopimport_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = shopimport_db::PoolConfig::from_app_config(&config);
    let pool = shopimport_db::connect_pool(&config.database_url, pool_config).await?;
    shopimport_db::run_migrations(&pool).await?;

    let fetcher =
        shopimport_scraper::PageFetcher::new(config.request_timeout_secs, &config.user_agent)?;
    let rate_limiter = RateLimiter::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    );
    let auth = AuthState::from_env(matches!(
        config.env,
        shopimport_core::Environment::Development
    ))?;

    let state = AppState {
        pool,
        fetcher: Arc::new(fetcher),
        rate_limiter,
        cache_ttl_days: config.cache_ttl_days,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, build_app(state, auth))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
