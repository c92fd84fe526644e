//! Process lifecycle: wiring, listeners, signals and teardown.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use glim_api::{AppState, build_router};
use glim_core::config::AppConfig;
use glim_core::result::AppResult;
use glim_core::traits::session_store::SessionStore;
use glim_database::DatabasePool;
use glim_database::migration::run_migrations;
use glim_ldap::LdapHandler;
use glim_service::ensure_bootstrap_accounts;
use glim_session::SessionStoreManager;

/// Removes the PID file when dropped.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// `<tempdir>/glim.pid`.
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("glim.pid")
    }

    /// Write the current process id to `path`.
    pub fn create(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        std::fs::write(&path, format!("{}\n", std::process::id()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove PID file");
        }
    }
}

/// Run both servers until a signal arrives or one of them fails.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Glim");

    // ── Step 1: PID file ─────────────────────────────────────────
    let pid_file = PidFile::create(PidFile::default_path()).context("Failed to write PID file")?;
    info!(path = %pid_file.path().display(), "PID file written");

    // ── Step 2: Catalog ──────────────────────────────────────────
    let db = DatabasePool::connect(&config.database).await?;
    run_migrations(&db).await?;

    // ── Step 3: Session store ────────────────────────────────────
    info!(provider = config.session.provider(), "Opening session store");
    let sessions: Arc<dyn SessionStore> = Arc::new(SessionStoreManager::new(&config.session).await?);

    // ── Step 4: Services and bootstrap accounts ──────────────────
    let config = Arc::new(config);
    let state = AppState::new(config.clone(), db.clone(), sessions.clone());
    ensure_bootstrap_accounts(&state.users, &config.bootstrap).await?;
    let app = build_router(state);
    let ldap = Arc::new(LdapHandler::new(&config.ldap, &db)?);

    // ── Step 5: Listeners ────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut api_task = spawn_server("REST API", {
        let config = config.clone();
        let shutdown = shutdown_rx.clone();
        async move { glim_api::serve(&config, app, shutdown).await }
    });
    let mut ldap_task = spawn_server("LDAP", {
        let config = config.clone();
        let shutdown = shutdown_rx.clone();
        async move { glim_ldap::serve(&config, ldap, shutdown).await }
    });

    // ── Step 6: Wait for a signal or a failed listener ───────────
    let mut failed = false;
    let mut running = Vec::new();
    tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received, starting graceful shutdown");
            running.push(("REST API", api_task));
            running.push(("LDAP", ldap_task));
        }
        result = &mut api_task => {
            failed = server_failed("REST API", result);
            running.push(("LDAP", ldap_task));
        }
        result = &mut ldap_task => {
            failed = server_failed("LDAP", result);
            running.push(("REST API", api_task));
        }
    }
    let _ = shutdown_tx.send(true);

    // ── Step 7: Drain and close stores ───────────────────────────
    let grace = Duration::from_secs(config.api.shutdown_grace_seconds + 1);
    for (name, task) in running {
        match tokio::time::timeout(grace, task).await {
            Ok(result) => failed |= server_failed(name, result),
            Err(_) => warn!(server = name, "Server did not stop within the grace period"),
        }
    }

    if let Err(e) = sessions.close().await {
        warn!(error = %e, "Failed to close session store");
    }
    db.close().await;
    drop(pid_file);

    if failed {
        anyhow::bail!("a server stopped unexpectedly");
    }
    info!("Glim shut down gracefully");
    Ok(())
}

fn spawn_server<F>(name: &'static str, server: F) -> JoinHandle<AppResult<()>>
where
    F: Future<Output = AppResult<()>> + Send + 'static,
{
    info!(server = name, "Starting server");
    tokio::spawn(server)
}

/// Log a finished server task; `true` when it ended in error.
fn server_failed(name: &str, result: Result<AppResult<()>, tokio::task::JoinError>) -> bool {
    match result {
        Ok(Ok(())) => {
            info!(server = name, "Server stopped");
            false
        }
        Ok(Err(e)) => {
            error!(server = name, error = %e, "Server failed");
            true
        }
        Err(e) => {
            error!(server = name, error = %e, "Server task panicked");
            true
        }
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_file_written_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glim.pid");

        let pid_file = PidFile::create(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());

        drop(pid_file);
        assert!(!path.exists());
    }

    #[test]
    fn test_default_pid_path() {
        assert!(PidFile::default_path().ends_with("glim.pid"));
    }
}
