// src/core/scanner/context.rs

use crate::config::ScanConfig;
use crate::core::error::{ProbeError, ProbeResult};
use reqwest::Client;
use reqwest::redirect::Policy;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Everything one scan owns: the normalized target, its configuration, its own
/// HTTP clients and its deadline.
///
/// A context is created per `run_full_scan` call and shared read-only by the
/// probes of that scan. Nothing in it outlives the scan.
pub struct ScanContext {
    pub target: Url,
    pub config: ScanConfig,
    /// Follows redirects. Used for page fetches and injection requests.
    pub client: Client,
    /// Never follows redirects, so 301/302 can be observed during enumeration.
    pub no_redirect_client: Client,
    pub deadline: Option<Instant>,
}

impl ScanContext {
    pub fn new(target: Url, config: ScanConfig) -> ProbeResult<Self> {
        let client = build_client(&config, true)?;
        let no_redirect_client = build_client(&config, false)?;
        let deadline = config.scan_deadline().map(|d| Instant::now() + d);
        debug!(target = %target, ?deadline, "Scan context created.");
        Ok(Self {
            target,
            config,
            client,
            no_redirect_client,
            deadline,
        })
    }

    pub fn host(&self) -> Option<&str> {
        self.target.host_str()
    }

    /// Resolves `path` against the target with a trailing slash, so `admin` under
    /// `https://example.com/app` becomes `https://example.com/app/admin`.
    pub fn join_path(&self, path: &str) -> ProbeResult<Url> {
        let mut base = self.target.clone();
        base.set_query(None);
        base.set_fragment(None);
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path)
            .map_err(|e| ProbeError::InvalidTarget(format!("{}: {}", path, e)))
    }

    /// Time left before the deadline. `None` when the scan is unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Caps a per-operation timeout by the time left in the scan.
    pub fn bounded(&self, timeout: Duration) -> Duration {
        match self.remaining() {
            Some(left) => timeout.min(left),
            None => timeout,
        }
    }
}

fn build_client(config: &ScanConfig, follow_redirects: bool) -> ProbeResult<Client> {
    let policy = if follow_redirects {
        Policy::default()
    } else {
        Policy::none()
    };
    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .redirect(policy)
        .build()?;
    Ok(client)
}

/// Fixed pause between consecutive requests of an enumeration loop.
pub async fn pace(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
