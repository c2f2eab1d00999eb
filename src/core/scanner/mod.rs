// src/core/scanner/mod.rs

// Public interface of the `scanner` module: one sub-module per probe plus the
// shared scan context and form extraction.
pub mod context;
pub mod directory_scanner;
pub mod forms;
pub mod headers_scanner;
pub mod port_scanner;
pub mod sensitive_scanner;
pub mod sqli_scanner;
pub mod ssl_scanner;
pub mod xss_scanner;

#[cfg(test)]
pub mod test_server;

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use strum::{Display, EnumIter, IntoEnumIterator};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};
use url::Url;

use crate::config::ScanConfig;
use crate::core::models::{Finding, FindingCategory, ScanError, ScanReport, Severity};
use self::context::ScanContext;
use self::directory_scanner::run_directory_scan;
use self::headers_scanner::run_headers_scan;
use self::port_scanner::run_port_scan;
use self::sensitive_scanner::run_sensitive_scan;
use self::sqli_scanner::run_sqli_scan;
use self::ssl_scanner::run_ssl_scan;
use self::xss_scanner::run_xss_scan;

/// The seven probes, declared in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ProbeKind {
    #[strum(serialize = "TLS")]
    Tls,
    #[strum(serialize = "Headers")]
    Headers,
    #[strum(serialize = "SQL Injection")]
    SqlInjection,
    #[strum(serialize = "XSS")]
    Xss,
    #[strum(serialize = "Directory")]
    Directory,
    #[strum(serialize = "Port")]
    Port,
    #[strum(serialize = "Sensitive Info")]
    SensitiveInfo,
}

impl ProbeKind {
    async fn run(self, ctx: &ScanContext) -> Vec<Finding> {
        match self {
            ProbeKind::Tls => run_ssl_scan(ctx).await,
            ProbeKind::Headers => run_headers_scan(ctx).await,
            ProbeKind::SqlInjection => run_sqli_scan(ctx).await,
            ProbeKind::Xss => run_xss_scan(ctx).await,
            ProbeKind::Directory => run_directory_scan(ctx).await,
            ProbeKind::Port => run_port_scan(ctx).await,
            ProbeKind::SensitiveInfo => run_sensitive_scan(ctx).await,
        }
    }
}

/// Trims the input and prepends `https://` when no http(s) scheme is present.
pub fn normalize_url(url: &str) -> Result<String, ScanError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ScanError::new("URL cannot be empty", url));
    }
    let lowered = trimmed.to_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{}", trimmed))
    }
}

/// Runs every probe against `url` and aggregates their findings into one report.
///
/// Probes run one after another in a fixed order, each in its own task. A probe
/// that panics, overruns the scan deadline or is never reached before it
/// contributes a single info Finding instead of its results. Only a target
/// that cannot be scanned at all produces a `ScanError`.
///
/// # Arguments
///
/// * `url` - The target, with or without a scheme (e.g., "example.com").
/// * `config` - Timeouts, pacing and the optional overall deadline.
///
/// # Returns
///
/// A `ScanReport` whose findings are ordered by probe, then by discovery.
pub async fn run_full_scan(url: &str, config: &ScanConfig) -> Result<ScanReport, ScanError> {
    let normalized = normalize_url(url)?;
    let target = Url::parse(&normalized)
        .map_err(|e| ScanError::new(format!("Invalid URL: {}", e), &normalized))?;
    if target.host_str().is_none() {
        return Err(ScanError::new("URL has no host", &normalized));
    }

    let ctx = ScanContext::new(target, config.clone()).map_err(|e| {
        error!(error = %e, "Could not prepare scan.");
        ScanError::new(format!("Could not prepare scan: {}", e), &normalized)
    })?;
    let deadline = ctx.deadline;
    let ctx = Arc::new(ctx);

    info!(target = %normalized, "Starting full scan.");
    let mut findings = Vec::new();
    for probe in ProbeKind::iter() {
        let probe_ctx = Arc::clone(&ctx);
        let probe_findings =
            run_isolated(probe, async move { probe.run(&probe_ctx).await }, deadline).await;
        info!(%probe, findings = %probe_findings.len(), "Probe finished.");
        findings.extend(probe_findings);
    }

    let report = ScanReport::new(normalized, Utc::now(), findings);
    info!(
        total = report.summary.total_issues,
        critical = report.summary.critical,
        high = report.summary.high,
        "Full scan finished."
    );
    Ok(report)
}

/// Runs one probe in its own task, bounded by the scan deadline.
///
/// The task lives in a `JoinSet`, so dropping this future (or running out of
/// time) aborts the probe along with everything it was awaiting.
async fn run_isolated<F>(probe: ProbeKind, work: F, deadline: Option<Instant>) -> Vec<Finding>
where
    F: Future<Output = Vec<Finding>> + Send + 'static,
{
    if deadline.is_some_and(|d| Instant::now() >= d) {
        warn!(%probe, "Scan deadline passed, skipping probe.");
        return vec![
            scanner_finding(format!("Probe Skipped: {}", probe))
                .description(format!("{} probe was not started before the scan deadline", probe))
                .impact("No results for this probe")
                .recommendation("Increase the scan deadline to run every probe"),
        ];
    }

    let mut task = JoinSet::new();
    task.spawn(work);

    let joined = match deadline {
        Some(d) => match tokio::time::timeout_at(d, task.join_next()).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort_all();
                warn!(%probe, "Probe exceeded the scan deadline.");
                return vec![
                    scanner_finding(format!("Probe Timed Out: {}", probe))
                        .description(format!("{} probe did not finish before the scan deadline", probe))
                        .impact("Results for this probe are missing")
                        .recommendation("Increase the scan deadline or rescan this target"),
                ];
            }
        },
        None => task.join_next().await,
    };

    let reason = match joined {
        Some(Ok(findings)) => return findings,
        Some(Err(e)) if e.is_panic() => panic_message(e.into_panic()),
        Some(Err(e)) => e.to_string(),
        None => "task was never scheduled".to_string(),
    };
    error!(%probe, reason = %reason, "Probe failed.");
    vec![
        scanner_finding(format!("Probe Failed: {}", probe))
            .description(format!("{} probe failed: {}", probe, reason))
            .impact("Results for this probe are missing")
            .recommendation("Rescan the target or test this area manually"),
    ]
}

fn scanner_finding(title: String) -> Finding {
    Finding::new(FindingCategory::Scanner, Severity::Info, title)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::test_server::{TestResponse, TestServer};
    use std::time::Duration;

    #[test]
    fn urls_are_normalized() {
        assert_eq!(normalize_url("  example.com ").unwrap(), "https://example.com");
        assert_eq!(normalize_url("http://example.com").unwrap(), "http://example.com");
        assert_eq!(normalize_url("HTTPS://Example.com").unwrap(), "HTTPS://Example.com");
        assert_eq!(normalize_url("   ").unwrap_err().message, "URL cannot be empty");
    }

    #[test]
    fn probes_dispatch_in_fixed_order() {
        let names: Vec<String> = ProbeKind::iter().map(|p| p.to_string()).collect();
        assert_eq!(
            names,
            vec!["TLS", "Headers", "SQL Injection", "XSS", "Directory", "Port", "Sensitive Info"]
        );
    }

    #[tokio::test]
    async fn panicking_probe_becomes_info_finding() {
        let findings = run_isolated(
            ProbeKind::Xss,
            async {
                if true {
                    panic!("parser exploded");
                }
                Vec::<Finding>::new()
            },
            None,
        )
        .await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Probe Failed: XSS");
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(findings[0].description, "XSS probe failed: parser exploded");
    }

    #[tokio::test]
    async fn slow_probe_is_cut_at_deadline() {
        let deadline = Instant::now() + Duration::from_millis(50);
        let findings = run_isolated(
            ProbeKind::Port,
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Vec::<Finding>::new()
            },
            Some(deadline),
        )
        .await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Probe Timed Out: Port");
    }

    #[tokio::test]
    async fn invalid_targets_are_scan_errors() {
        let config = ScanConfig::default();
        assert_eq!(
            run_full_scan("", &config).await.unwrap_err().message,
            "URL cannot be empty"
        );
        assert!(run_full_scan("http://", &config).await.is_err());
    }

    #[tokio::test]
    async fn expired_deadline_skips_every_probe() {
        let config = ScanConfig {
            scan_deadline_secs: Some(0),
            ..Default::default()
        };
        let report = run_full_scan("https://example.com", &config).await.unwrap();
        assert_eq!(report.findings.len(), ProbeKind::iter().count());
        assert!(report.findings.iter().all(|f| f.title.starts_with("Probe Skipped: ")));
        assert_eq!(report.summary.info, report.summary.total_issues);
    }

    #[tokio::test]
    async fn full_scan_against_local_server() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/" => TestResponse::ok("<html><body>Contact jane.doe@corp.io</body></html>")
                .with_header("Server", "test-server"),
            "/admin" => TestResponse::ok("admin"),
            _ => TestResponse::not_found(),
        })
        .await;
        let config = ScanConfig {
            directory_delay_ms: 0,
            sensitive_file_delay_ms: 0,
            xss_form_delay_ms: 0,
            port_connect_timeout_ms: 200,
            ..Default::default()
        };

        let report = run_full_scan(&server.url("/"), &config).await.unwrap();

        assert_eq!(report.summary.total_issues, report.findings.len());
        assert_eq!(report.summary.bucket_total(), report.summary.total_issues);
        assert_eq!(report.findings[0].title, "HTTPS Not Enforced");
        let titles: Vec<&str> = report.findings.iter().map(|f| f.title.as_str()).collect();
        assert!(titles.contains(&"Missing Content Security Policy"));
        assert!(titles.contains(&"Server Information Disclosure"));
        assert!(titles.contains(&"No Parameters to Test"));
        assert!(titles.contains(&"Exposed Path: /admin"));
        assert!(titles.contains(&"Sensitive Information Exposure - Email"));
        assert!(!titles.iter().any(|t| t.starts_with("Probe ")));
    }

    fn signature(findings: &[Finding]) -> Vec<(String, String, Severity)> {
        let mut tuples: Vec<_> = findings
            .iter()
            .map(|f| (f.category.to_string(), f.title.clone(), f.severity))
            .collect();
        tuples.sort();
        tuples
    }

    #[tokio::test]
    async fn repeated_runs_on_a_static_target_agree() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/" => TestResponse::ok("<html>Reach ops@corp.io or 555-123-4567</html>")
                .with_header("X-Powered-By", "PHP/8.1")
                .with_header("Strict-Transport-Security", "max-age=100"),
            "/admin" => TestResponse::ok("admin"),
            "/backup" => TestResponse::status(403),
            "/.env" => TestResponse::ok("DB_PASSWORD=hunter2"),
            _ => TestResponse::not_found(),
        })
        .await;
        let config = ScanConfig {
            directory_delay_ms: 0,
            sensitive_file_delay_ms: 0,
            ..Default::default()
        };
        let ctx = ScanContext::new(Url::parse(&server.url("/")).unwrap(), config).unwrap();

        for kind in [ProbeKind::Headers, ProbeKind::Directory, ProbeKind::SensitiveInfo] {
            let first = kind.run(&ctx).await;
            let second = kind.run(&ctx).await;
            assert!(!first.is_empty(), "{} reported nothing", kind);
            assert_eq!(signature(&first), signature(&second), "{} changed between runs", kind);
        }
    }
}
