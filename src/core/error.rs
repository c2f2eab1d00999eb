//! Errors raised inside probes.
//!
//! A `ProbeError` never leaves its probe: every probe converts it into a Finding
//! before returning to the orchestrator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TlsConnector error: {0}")]
    Tls(#[from] native_tls::Error),

    /// The TLS handshake itself was rejected by the peer.
    #[error("SSL handshake failed: {0}")]
    Handshake(String),

    #[error("X.509 parse error: {0}")]
    Certificate(String),

    #[error("Could not resolve hostname {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Task failed: {0}")]
    Task(String),
}

pub type ProbeResult<T> = Result<T, ProbeError>;
