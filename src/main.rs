use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info, warn};

use infralearn::logging::init_tracing;
use infralearn::metrics::{init_metrics, metrics_app};
use infralearn::router::init_router;
use infralearn::state::init_app_state;
use infralearn_config::{AdminSeedConfig, DatabaseConfig, ServerConfig};
use infralearn_db::{SeedOutcome, connect, seed_admin};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let metrics_handle = init_metrics();

    let store = connect(&DatabaseConfig::from_env())
        .await
        .context("Failed to open storage")?;

    let state = match init_app_state(store) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    match seed_admin(
        state.store.as_ref(),
        &AdminSeedConfig::from_env(),
        state.account_policy.bcrypt_cost,
    )
    .await
    {
        Ok(SeedOutcome::Created(admin)) => info!(username = %admin.username, "Administrator created"),
        Ok(SeedOutcome::AlreadyPresent | SeedOutcome::Skipped) => {}
        Err(e) => warn!(error = %e, "Administrator seeding failed"),
    }

    let server_config = ServerConfig::from_env();

    if let Some(handle) = metrics_handle {
        let metrics_addr = format!("{}:{}", server_config.host, server_config.metrics_port);
        let listener = tokio::net::TcpListener::bind(&metrics_addr)
            .await
            .with_context(|| format!("Failed to bind metrics listener on {metrics_addr}"))?;
        info!("Metrics available on http://{metrics_addr}/metrics");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let app = init_router(state);
    let addr = server_config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🚀 Server running on http://{addr}");
    info!("📖 Scalar UI available at http://{addr}/scalar");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
