//! PEM certificate loading for the HTTPS and LDAPS listeners.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::{
    self,
    pki_types::{CertificateDer, PrivateKeyDer},
};
use tracing::info;

use crate::config::TlsConfig;
use crate::error::AppError;
use crate::result::AppResult;

/// Build a TLS acceptor from the configured PEM files.
///
/// `alpn` lists the protocols advertised during the handshake; the LDAP
/// listener passes an empty list.
pub fn build_acceptor(config: &TlsConfig, alpn: &[&[u8]]) -> AppResult<TlsAcceptor> {
    let cert_path = config
        .cert
        .as_deref()
        .ok_or_else(|| AppError::configuration("Certificate file not specified"))?;
    let key_path = config
        .key
        .as_deref()
        .ok_or_else(|| AppError::configuration("Key file not specified"))?;

    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;
    info!(certificates = certs.len(), cert = %cert_path.display(), "Loaded TLS material");

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut server_config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| AppError::configuration(format!("TLS protocol error: {e}")))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| AppError::configuration(format!("TLS config error: {e}")))?;
    server_config.alpn_protocols = alpn.iter().map(|p| p.to_vec()).collect();

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

/// Load certificates from a PEM file.
pub fn load_certs(path: &Path) -> AppResult<Vec<CertificateDer<'static>>> {
    let file = File::open(path).map_err(|e| {
        AppError::configuration(format!(
            "Failed to open certificate file {}: {e}",
            path.display()
        ))
    })?;
    let mut reader = BufReader::new(file);

    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::configuration(format!("Failed to parse certificates: {e}")))?;

    if certs.is_empty() {
        return Err(AppError::configuration(format!(
            "No certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

/// Load the first private key (PKCS#1, PKCS#8 or SEC1) from a PEM file.
pub fn load_private_key(path: &Path) -> AppResult<PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|e| {
        AppError::configuration(format!("Failed to open key file {}: {e}", path.display()))
    })?;
    let mut reader = BufReader::new(file);

    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(rustls_pemfile::Item::Pkcs1Key(key))) => return Ok(PrivateKeyDer::Pkcs1(key)),
            Ok(Some(rustls_pemfile::Item::Pkcs8Key(key))) => return Ok(PrivateKeyDer::Pkcs8(key)),
            Ok(Some(rustls_pemfile::Item::Sec1Key(key))) => return Ok(PrivateKeyDer::Sec1(key)),
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                return Err(AppError::configuration(format!(
                    "Failed to parse private key: {e}"
                )));
            }
        }
    }

    Err(AppError::configuration(format!(
        "No private key found in {}",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_are_configuration_errors() {
        let err = load_certs(Path::new("/nonexistent/cert.pem")).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
        assert!(load_private_key(Path::new("/nonexistent/key.pem")).is_err());
    }

    #[test]
    fn test_pem_without_certificates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not a pem file\n").unwrap();
        assert!(load_certs(file.path()).is_err());
        assert!(load_private_key(file.path()).is_err());
    }

    #[test]
    fn test_acceptor_requires_paths() {
        assert!(build_acceptor(&TlsConfig::default(), &[]).is_err());
    }
}
