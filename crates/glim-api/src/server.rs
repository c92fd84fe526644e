//! HTTP and HTTPS listener with graceful shutdown.

use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use glim_core::config::AppConfig;
use glim_core::error::{AppError, ErrorKind};
use glim_core::result::AppResult;
use glim_core::tls::build_acceptor;

const ALPN: &[&[u8]] = &[b"h2", b"http/1.1"];

/// Binds the configured REST address and serves `app` until `shutdown`
/// fires. HTTPS is used when a certificate and key are configured.
pub async fn serve(config: &AppConfig, app: Router, shutdown: watch::Receiver<bool>) -> AppResult<()> {
    let addr = format!("{}:{}", config.api.addr, config.api.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Internal,
            format!("Failed to bind REST API on {addr}: {e}"),
            e,
        )
    })?;

    let acceptor = if config.tls.is_enabled() {
        Some(build_acceptor(&config.tls, ALPN)?)
    } else {
        None
    };
    info!(
        addr = %addr,
        tls = acceptor.is_some(),
        "REST API listening"
    );

    serve_listener(
        listener,
        app,
        acceptor,
        Duration::from_secs(config.api.shutdown_grace_seconds),
        shutdown,
    )
    .await
}

/// Accept loop over an already bound listener.
///
/// On shutdown the listener is closed at once; open connections are
/// asked to finish and are abandoned once `grace` elapses.
pub async fn serve_listener(
    listener: TcpListener,
    app: Router,
    acceptor: Option<TlsAcceptor>,
    grace: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> AppResult<()> {
    let builder = auto::Builder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept HTTP connection");
                        continue;
                    }
                };

                let service = TowerToHyperService::new(app.clone());
                let builder = builder.clone();
                let watcher = graceful.watcher();
                let acceptor = acceptor.clone();

                tokio::spawn(async move {
                    let result = match acceptor {
                        Some(acceptor) => match acceptor.accept(stream).await {
                            Ok(tls) => {
                                let conn = builder
                                    .serve_connection_with_upgrades(TokioIo::new(tls), service)
                                    .into_owned();
                                watcher.watch(conn).await
                            }
                            Err(e) => {
                                debug!(%peer, error = %e, "TLS handshake failed");
                                return;
                            }
                        },
                        None => {
                            let conn = builder
                                .serve_connection_with_upgrades(TokioIo::new(stream), service)
                                .into_owned();
                            watcher.watch(conn).await
                        }
                    };
                    if let Err(e) = result {
                        debug!(%peer, error = %e, "HTTP connection closed with error");
                    }
                });
            }
            _ = shutdown.changed() => {
                info!("REST API stopped accepting connections");
                break;
            }
        }
    }

    drop(listener);

    tokio::select! {
        _ = graceful.shutdown() => {
            info!("All HTTP connections drained");
        }
        _ = tokio::time::sleep(grace) => {
            warn!(grace_seconds = grace.as_secs(), "Grace period elapsed with open HTTP connections");
        }
    }
    Ok(())
}
