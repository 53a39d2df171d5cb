mod api;
mod middleware;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use carpool_geocoder::{GeocoderConfig, NominatimClient};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::WriteRateLimitState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(carpool_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting carpool server");

    let pool_config = carpool_db::PoolConfig::from_app_config(&config);
    let pool = carpool_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = carpool_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let geocoder = NominatimClient::new(&GeocoderConfig::from_app_config(&config))?;
    let rate_limit = WriteRateLimitState::new(
        config.write_rate_limit,
        Duration::from_secs(config.write_rate_window_secs),
    );
    let app = build_app(AppState::new(pool, geocoder), rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
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
