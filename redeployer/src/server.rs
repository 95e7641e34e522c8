//! Listener binding and serving
//!
//! Binds plain TCP or TLS and runs the router on it until cancelled. The
//! peer address reaches handlers as `ConnectInfo<RemoteAddr>` on both
//! transports.

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, TlsSettings};
use crate::tls::{self, TlsListener};

/// Address of the connected peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAddr(pub SocketAddr);

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Connected<IncomingStream<'_, TcpListener>> for RemoteAddr {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        RemoteAddr(*stream.remote_addr())
    }
}

impl Connected<IncomingStream<'_, TlsListener>> for RemoteAddr {
    fn connect_info(stream: IncomingStream<'_, TlsListener>) -> Self {
        RemoteAddr(*stream.remote_addr())
    }
}

pub enum BoundListener {
    Plain(TcpListener),
    Tls(TlsListener),
}

impl BoundListener {
    /// Binds the transport selected by `config`; any failure here aborts startup
    pub async fn bind(config: &Config) -> Result<Self> {
        let addr = config.bind_addr();
        match &config.tls {
            Some(settings) => Self::bind_tls(&addr, settings).await,
            None => Self::bind_plain(&addr).await,
        }
    }

    pub async fn bind_plain(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        Ok(Self::Plain(listener))
    }

    pub async fn bind_tls(addr: &str, settings: &TlsSettings) -> Result<Self> {
        let server_config = tls::load_server_config(settings).with_context(|| {
            format!("Failed to load TLS certificate for {}", settings.common_name)
        })?;
        let listener = TlsListener::bind(addr, server_config)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        Ok(Self::Tls(listener))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Self::Plain(listener) => listener.local_addr(),
            Self::Tls(listener) => listener.local_addr(),
        }
    }
}

/// Serves `app` until `cancel` fires, then drains open connections
pub async fn serve(listener: BoundListener, app: Router, cancel: CancellationToken) -> io::Result<()> {
    let shutdown = async move { cancel.cancelled().await };
    let app = app.into_make_service_with_connect_info::<RemoteAddr>();

    match listener {
        BoundListener::Plain(listener) => {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
        }
        BoundListener::Tls(listener) => {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
        }
    }
}
