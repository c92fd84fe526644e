//! LDAP and LDAPS listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_rustls::TlsAcceptor;
use tokio_util::codec::Framed;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, info_span, warn};

use glim_core::config::AppConfig;
use glim_core::error::{AppError, ErrorKind};
use glim_core::result::AppResult;
use glim_core::tls::build_acceptor;

use crate::error::LdapError;
use crate::handler::{LdapHandler, protocol_error};
use crate::protocol::LdapCodec;
use crate::session::Session;

/// Binds the configured LDAP address and serves until `shutdown` fires.
/// LDAPS is used unless `ldap.no_tls` is set.
pub async fn serve(
    config: &AppConfig,
    handler: Arc<LdapHandler>,
    shutdown: watch::Receiver<bool>,
) -> AppResult<()> {
    let addr = format!("{}:{}", config.ldap.addr, config.ldap.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Internal,
            format!("Failed to bind LDAP server on {addr}: {e}"),
            e,
        )
    })?;

    let acceptor = if config.ldap.no_tls {
        None
    } else {
        Some(build_acceptor(&config.tls, &[])?)
    };
    info!(
        addr = %addr,
        tls = acceptor.is_some(),
        domain = %config.ldap.domain,
        "LDAP server listening"
    );

    serve_listener(
        listener,
        handler,
        acceptor,
        Duration::from_secs(config.api.shutdown_grace_seconds),
        shutdown,
    )
    .await
}

/// Accept loop over an already bound listener.
///
/// Every connection watches `shutdown` too and is dropped as soon as it
/// fires, discarding any response not yet written.
pub async fn serve_listener(
    listener: TcpListener,
    handler: Arc<LdapHandler>,
    acceptor: Option<TlsAcceptor>,
    grace: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> AppResult<()> {
    let tracker = TaskTracker::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept LDAP connection");
                        continue;
                    }
                };
                let span = info_span!("ldap_conn", %peer);
                tracker.spawn(
                    accept(stream, peer, acceptor.clone(), handler.clone(), shutdown.clone())
                        .instrument(span),
                );
            }
            _ = shutdown.changed() => {
                info!("LDAP server stopped accepting connections");
                break;
            }
        }
    }

    drop(listener);
    tracker.close();
    if tokio::time::timeout(grace, tracker.wait()).await.is_err() {
        warn!(
            grace_seconds = grace.as_secs(),
            "Grace period elapsed with open LDAP connections"
        );
    }
    Ok(())
}

async fn accept(
    stream: TcpStream,
    peer: SocketAddr,
    acceptor: Option<TlsAcceptor>,
    handler: Arc<LdapHandler>,
    shutdown: watch::Receiver<bool>,
) {
    debug!("LDAP connection opened");
    let result = match acceptor {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(tls) => handle_connection(tls, peer, &handler, shutdown).await,
            Err(e) => {
                debug!(error = %e, "TLS handshake failed");
                return;
            }
        },
        None => handle_connection(stream, peer, &handler, shutdown).await,
    };
    match result {
        Ok(()) => debug!("LDAP connection closed"),
        Err(e) => debug!(error = %e, "LDAP connection closed with error"),
    }
}

/// Serve one connection, strictly one request at a time.
async fn handle_connection<S>(
    stream: S,
    peer: SocketAddr,
    handler: &LdapHandler,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), LdapError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, LdapCodec::new());
    let mut session = Session::new(peer);

    loop {
        let next = tokio::select! {
            next = framed.next() => next,
            _ = shutdown.changed() => return Ok(()),
        };
        let message = match next {
            None => return Ok(()),
            Some(Ok(Ok(message))) => message,
            Some(Ok(Err(err))) => {
                warn!(message_id = ?err.message_id, error = %err, "Malformed LDAP request");
                match err.message_id {
                    Some(id) => {
                        framed.send(protocol_error(id, &err.to_string())).await?;
                        continue;
                    }
                    None => return Err(err.into()),
                }
            }
            Some(Err(err)) => {
                warn!(error = %err, "Unrecoverable LDAP stream");
                return Err(err);
            }
        };

        let outcome = tokio::select! {
            outcome = handler.handle(&mut session, message) => outcome,
            _ = shutdown.changed() => return Ok(()),
        };
        for response in outcome.responses {
            framed.feed(response).await?;
        }
        framed.flush().await?;
        if outcome.close {
            return Ok(());
        }
    }
}
