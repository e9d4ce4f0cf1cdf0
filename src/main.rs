use std::{sync::Arc, time::Duration};
use tokio::{sync::Notify, task::JoinHandle};
use tracing::{error, info, warn};

use journal_backend::{create_pool, create_router, logging, run_migrations, AppState, Config};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let guard = logging::init(config.env, &config.log_dir);

    if let Err(e) = run(config).await {
        error!(error = %e, "Server stopped with an error");
        drop(guard);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), BoxError> {
    info!(env = %config.env, "Starting journal backend");

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    info!("Connected to database");

    run_migrations(&pool).await?;
    info!("Database migrations applied");

    let grace = config.shutdown_grace;
    let address = config.server_address.clone();

    let state = Arc::new(AppState::with_pool(config, pool.clone()));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("listening on {}", listener.local_addr()?);

    let shutdown = Arc::new(Notify::new());
    let mut server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        }
    });

    tokio::select! {
        result = &mut server => {
            // The server only returns on its own when accepting fails.
            result??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    info!("Shutting down server...");
    shutdown.notify_one();

    if wait_for_drain(server, grace).await? {
        info!("Server exited properly");
        pool.close().await;
    } else {
        // Connection tasks still hold pool connections; they are cancelled
        // when the runtime drops on return.
        warn!(
            grace_secs = grace.as_secs(),
            "Grace period elapsed, forcing shutdown"
        );
    }

    Ok(())
}

/// Waits up to `grace` for the server task to finish draining. Returns
/// `false` when the grace period ran out; the server task is aborted then.
async fn wait_for_drain(
    mut server: JoinHandle<std::io::Result<()>>,
    grace: Duration,
) -> Result<bool, BoxError> {
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result??;
            Ok(true)
        }
        Err(_) => {
            server.abort();
            Ok(false)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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
}
