//! TLS listener
//!
//! Serves HTTPS from a certificate and key on disk. Provisioning those files
//! (ACME, secret manager) happens outside this process.

use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, pem::PemObject};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;

use crate::config::TlsSettings;

/// How long a client may take to complete the TLS handshake
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read certificate chain from {path}: {source}")]
    Certificate {
        path: PathBuf,
        #[source]
        source: rustls::pki_types::pem::Error,
    },

    #[error("no certificates found in {0}")]
    EmptyChain(PathBuf),

    #[error("failed to read private key from {path}: {source}")]
    PrivateKey {
        path: PathBuf,
        #[source]
        source: rustls::pki_types::pem::Error,
    },

    #[error("invalid TLS configuration: {0}")]
    Config(#[from] rustls::Error),
}

/// Builds the rustls server configuration from PEM files
pub fn load_server_config(settings: &TlsSettings) -> Result<Arc<ServerConfig>, TlsError> {
    let certs = load_certificates(&settings.cert_file)?;
    let key = PrivateKeyDer::from_pem_file(&settings.key_file).map_err(|source| {
        TlsError::PrivateKey {
            path: settings.key_file.clone(),
            source,
        }
    })?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let to_error = |source| TlsError::Certificate {
        path: path.to_path_buf(),
        source,
    };

    let certs = CertificateDer::pem_file_iter(path)
        .map_err(to_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_error)?;

    if certs.is_empty() {
        return Err(TlsError::EmptyChain(path.to_path_buf()));
    }
    Ok(certs)
}

/// TCP listener that completes the TLS handshake before handing out streams
///
/// Handshakes run one at a time, each bounded by the handshake timeout, so a
/// silent client delays the next connection by at most that long.
pub struct TlsListener {
    inner: TcpListener,
    acceptor: TlsAcceptor,
    handshake_timeout: Duration,
}

impl TlsListener {
    pub async fn bind(addr: &str, config: Arc<ServerConfig>) -> io::Result<Self> {
        let inner = TcpListener::bind(addr).await?;
        Ok(Self {
            inner,
            acceptor: TlsAcceptor::from(config),
            handshake_timeout: HANDSHAKE_TIMEOUT,
        })
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

impl axum::serve::Listener for TlsListener {
    type Io = TlsStream<TcpStream>;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            let (stream, addr) = match self.inner.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!(error = %e, "failed to accept connection");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            let handshake = self.acceptor.accept(stream);
            match tokio::time::timeout(self.handshake_timeout, handshake).await {
                Ok(Ok(tls)) => return (tls, addr),
                Ok(Err(e)) => {
                    tracing::warn!(remote_address = %addr, error = %e, "TLS handshake failed");
                }
                Err(_) => {
                    tracing::warn!(
                        remote_address = %addr,
                        timeout = ?self.handshake_timeout,
                        "TLS handshake timed out"
                    );
                }
            }
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.inner.local_addr()
    }
}
