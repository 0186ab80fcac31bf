use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{signal, sync::oneshot, time::Instant};

use filedrop::{create_router, utils, AppConfig, AppState, FileStore, PostgresFileStore};

/// Graceful shutdown signal handler
///
/// Resolves on SIGTERM or Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    utils::logging::init_logging()?;

    let config = Arc::new(AppConfig::load()?);

    let store = Arc::new(
        PostgresFileStore::connect(&config.database)
            .await
            .context("failed to initialise file store")?,
    );

    // The store is closed on every path once it has been opened. A shutdown
    // started by a signal shares one deadline between draining requests and
    // closing the store.
    let mut deadline = None;
    let result = serve(config.clone(), store.clone(), &mut deadline).await;
    let deadline =
        deadline.unwrap_or_else(|| Instant::now() + config.server.shutdown_grace());
    if !close_store(store.as_ref(), deadline).await {
        tracing::warn!("File store did not close before the shutdown deadline");
    }

    if let Err(e) = &result {
        tracing::error!("server stopped with error: {:#}", e);
    }
    result
}

/// Closes `store`, giving up at `deadline`. Returns whether it closed.
async fn close_store(store: &dyn FileStore, deadline: Instant) -> bool {
    tokio::time::timeout_at(deadline, store.close()).await.is_ok()
}

async fn serve(
    config: Arc<AppConfig>,
    store: Arc<PostgresFileStore>,
    deadline: &mut Option<Instant>,
) -> Result<()> {
    let state = AppState::new(store, config.clone());
    let app = create_router(state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Starting server on {}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
    });

    tokio::select! {
        _ = shutdown_signal() => {}
        joined = &mut server => {
            // Server ended without being asked to.
            return match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e).context("server error"),
                Err(e) => Err(e).context("server task failed"),
            };
        }
    }

    let _ = shutdown_tx.send(());
    let grace = config.server.shutdown_grace();
    let until = *deadline.insert(Instant::now() + grace);

    match tokio::time::timeout_at(until, &mut server).await {
        Ok(Ok(Ok(()))) => {
            tracing::info!("Server shut down cleanly");
            Ok(())
        }
        Ok(Ok(Err(e))) => Err(e).context("graceful shutdown problem"),
        Ok(Err(e)) => Err(e).context("server task failed"),
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "Grace period elapsed with requests still in flight; no longer waiting for them"
            );
            server.abort();
            Ok(())
        }
    }
}
