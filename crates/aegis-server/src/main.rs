use std::sync::Arc;

use aegis_commons::config::AppConfig;
use aegis_coordinator::Coordinator;
use aegis_db::Gateway;
use aegis_http::AppState;
use aegis_provisioner::{HttpProvisioner, Provisioner, RetryingProvisioner};
use clap::Parser;
use tokio_util::sync::CancellationToken;

/// Composes the library crates into a running process: config, pool,
/// gateway, provisioner, coordinator, scheduler jobs, then the HTTP server.
/// Grounded on `kftray-helper/src/main.rs`'s small-binary-composing-libraries
/// shape and `kftray-commons/src/utils/db.rs`'s pool-then-migrate sequencing.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aegis_commons::logging::init();

    let config = Arc::new(AppConfig::parse());

    let pool = aegis_db::get_or_init_pool(&config.database_url, config.db_max_connections).await?;
    let gateway = Gateway::new(pool.clone());

    let provisioner: Arc<dyn Provisioner> = Arc::new(RetryingProvisioner::new(Arc::new(
        HttpProvisioner::new(config.provisioner_base_url.clone()),
    )));

    let coordinator = Arc::new(Coordinator::new(
        gateway.clone(),
        provisioner,
        config.clone(),
    ));

    let shutdown = CancellationToken::new();
    let job_handles = aegis_scheduler::spawn_jobs(gateway.clone(), shutdown.clone());

    let state = AppState {
        coordinator,
        gateway,
        config: config.clone(),
    };
    let router = aegis_http::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "aegis-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;

    tracing::info!("http server stopped, shutting down background jobs");
    shutdown.cancel();
    for handle in job_handles {
        let _ = handle.await;
    }

    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
