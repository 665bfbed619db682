use anyhow::{bail, Context, Result};
use axum::serve;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{TcpListener, UnixListener};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn, Level};
use userauth::api::client::FraudFeedClient;
use userauth::core::config::Config;
use userauth::core::startup::{apply_wal_operations, compact_wal, sync_fraud_feed};
use userauth::core::state::AppState;
use userauth::core::{routes, tracing_init};
use userauth::stores::user_directory::UserDirectory;
use userauth::wal::wal::Wal;

fn main() -> Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("config.toml")
    };

    // Load configuration
    let config = Config::from_file(&config_path).context(format!(
        "Failed to load configuration from '{}'. \
        Copy config.example.toml to config.toml and adjust the values.",
        config_path.display()
    ))?;

    // Initialize tracing
    tracing_init::init_tracing(&config.logging);

    // Build Tokio runtime with configured worker threads
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        port = ?config.server.port,
        unix_socket = ?config.server.unix_socket,
        num_threads = config.server.num_threads,
        authority = %config.directory.authority,
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "User directory starting"
    );

    // Initialize WAL
    let wal_path = config.persistence.wal_path.clone();
    let wal = Wal::new(wal_path.clone()).context("Failed to initialize WAL")?;

    info!(wal_path = %wal_path.display(), "WAL initialized");

    let state = AppState::new(config.clone(), wal);

    // Replay WAL operations to rebuild the directory
    let operations = state.wal.replay().context("Failed to replay WAL")?;
    apply_wal_operations(&state, &operations)?;

    info!(
        operations_replayed = operations.len(),
        users_loaded = state.directory.len(),
        fraudulent_users = state.directory.fraudulent_count(),
        "WAL replay completed"
    );

    // Pull fraud verdicts if a feed is configured
    if let Some(endpoint) = &config.sync.fraud_feed_endpoint {
        info!(endpoint = %endpoint, "Fetching fraud verdicts");

        let client = FraudFeedClient::new(endpoint.clone(), config.sync.api_key.clone())
            .context("Failed to create fraud feed client")?;

        if let Err(e) = sync_fraud_feed(&state, &client).await {
            error!(
                error = %e,
                "Failed to sync fraud feed, continuing with WAL data only"
            );
        }
    }

    // Shrink the WAL to the current state; nothing else writes to it yet
    match compact_wal(&state) {
        Ok(lines) => info!(lines, "WAL compacted"),
        Err(e) => error!(error = %e, "Failed to compact WAL, keeping existing log"),
    }

    spawn_event_logger(&state.directory);

    info!(
        users = state.directory.len(),
        fraudulent_users = state.directory.fraudulent_count(),
        "User directory startup complete"
    );

    // Build router with request tracing
    let app = routes::build_router(Arc::new(state)).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        ),
    );

    // Start TCP listener if configured
    let tcp_handle = if let Some(port) = config.server.port {
        let addr = format!("0.0.0.0:{}", port);

        let listener = TcpListener::bind(&addr)
            .await
            .context(format!("Failed to bind TCP listener to {}", addr))?;

        info!(address = %addr, "TCP listener bound");

        let app_clone = app.clone();
        Some(tokio::spawn(async move {
            serve(
                listener,
                app_clone.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("TCP server error")
        }))
    } else {
        None
    };

    // Start Unix socket listener if configured
    let unix_handle = if let Some(unix_socket) = &config.server.unix_socket {
        // Remove stale socket file from a previous run
        if unix_socket.exists() {
            std::fs::remove_file(unix_socket).context(format!(
                "Failed to remove existing Unix socket: {}",
                unix_socket.display()
            ))?;
        }

        let listener = UnixListener::bind(unix_socket).context(format!(
            "Failed to bind Unix socket listener to {}",
            unix_socket.display()
        ))?;

        info!(path = %unix_socket.display(), "Unix socket listener bound");

        let mut make_service = app.into_make_service();
        Some(tokio::spawn(async move {
            use tower::Service;

            loop {
                let (socket, _remote_addr) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!(error = %e, "Failed to accept Unix socket connection");
                        continue;
                    }
                };

                let tower_service = match make_service.call(&socket).await {
                    Ok(svc) => svc,
                    Err(infallible) => match infallible {},
                };

                tokio::spawn(async move {
                    let socket = hyper_util::rt::TokioIo::new(socket);

                    let hyper_service = hyper::service::service_fn(
                        move |request: hyper::Request<hyper::body::Incoming>| {
                            tower_service.clone().call(request)
                        },
                    );

                    if let Err(err) = hyper_util::server::conn::auto::Builder::new(
                        hyper_util::rt::TokioExecutor::new(),
                    )
                    .serve_connection_with_upgrades(socket, hyper_service)
                    .await
                    {
                        error!(error = %err, "Error serving Unix socket connection");
                    }
                });
            }
        }))
    } else {
        None
    };

    info!("HTTP server(s) started, waiting for shutdown signal");

    // Wait for the servers to finish
    match (tcp_handle, unix_handle) {
        (Some(tcp), Some(unix)) => {
            tokio::select! {
                result = tcp => log_tcp_exit(result),
                result = unix => {
                    if let Err(e) = result {
                        error!(error = %e, "Unix socket server task failed");
                    }
                }
            }
        }
        (Some(tcp), None) => log_tcp_exit(tcp.await),
        (None, Some(unix)) => {
            if let Err(e) = unix.await {
                error!(error = %e, "Unix socket server task failed");
            }
        }
        (None, None) => {
            error!("No listeners configured");
            bail!("No listeners configured");
        }
    }

    info!("Shutting down gracefully");

    Ok(())
}

fn log_tcp_exit(result: std::result::Result<Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "TCP server error"),
        Err(e) => error!(error = %e, "TCP server task failed"),
    }
}

/// Log every directory event until the directory is dropped
fn spawn_event_logger(directory: &UserDirectory) {
    let mut events = directory.subscribe();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    info!(
                        event = event.name(),
                        identity = %event.identity(),
                        details = ?event,
                        "Directory event"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
