// src/core/scanner/directory_scanner.rs

use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::knowledge_base::{
    HIGH_RISK_PATHS, MEDIUM_RISK_PATHS, STATIC_ASSET_PATHS, path_description, path_recommendation,
};
use crate::core::models::{Finding, FindingCategory, Severity};
use crate::core::scanner::context::{ScanContext, pace};

pub static COMMON_PATHS: &[&str] = &[
    "admin", "admin.php", "administrator", "wp-admin", "backup", "backups", "config", "database",
    "db", "logs", "log", "temp", "tmp", "uploads", "upload", "files", "images", "css", "js",
    "assets", "static", "api", "test", "tests", "dev", "phpmyadmin", "phpinfo.php", "info.php",
    "robots.txt", "sitemap.xml", ".htaccess", ".env", ".git", ".svn", "composer.json",
];

/// A path that answered with an interesting status.
#[derive(Debug, Clone)]
struct FoundPath {
    path: &'static str,
    url: Url,
    status: u16,
    severity: Severity,
}

fn matches_any(path: &str, names: &[&str]) -> bool {
    let lowered = path.to_lowercase();
    names.iter().any(|name| lowered.contains(name))
}

/// Severity of a discovered path given the status it answered with.
///
/// Risk names match as substrings of the lower-cased path, so `admin.php` is
/// treated like `admin`.
pub fn assess_severity(path: &str, status: u16) -> Severity {
    match status {
        403 if matches_any(path, HIGH_RISK_PATHS) => Severity::Medium,
        403 => Severity::Low,
        200 if matches_any(path, HIGH_RISK_PATHS) => Severity::High,
        200 if matches_any(path, MEDIUM_RISK_PATHS) => Severity::Medium,
        200 | 301 | 302 => Severity::Low,
        _ => Severity::Info,
    }
}

fn is_interesting(status: StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 301 | 302 | 403)
}

fn impact_for(severity: Severity) -> &'static str {
    match severity {
        Severity::High | Severity::Critical => "Sensitive resources may be directly accessible to attackers",
        Severity::Medium => "Resource exposure may aid attackers in reconnaissance",
        _ => "Reveals application structure",
    }
}

/// Probes a fixed list of common paths below the target without following
/// redirects.
pub async fn run_directory_scan(ctx: &ScanContext) -> Vec<Finding> {
    info!(target = %ctx.target, paths = COMMON_PATHS.len(), "Starting directory scan.");

    let mut found = Vec::new();
    for &path in COMMON_PATHS {
        let url = match ctx.join_path(path) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Cannot build directory URL.");
                return vec![
                    Finding::new(FindingCategory::DirectoryEnumeration, Severity::Info, "Directory Scan Error")
                        .description(format!("Directory scanning failed: {}", e))
                        .impact("Unable to enumerate common directories")
                        .recommendation("Manual directory enumeration recommended"),
                ];
            }
        };

        let response = ctx
            .no_redirect_client
            .get(url.clone())
            .timeout(ctx.bounded(ctx.config.enumeration_timeout()))
            .send()
            .await;
        match response {
            Ok(r) if is_interesting(r.status()) => {
                let status = r.status().as_u16();
                let severity = assess_severity(path, status);
                debug!(path, status, %severity, "Interesting path found.");
                found.push(FoundPath { path, url, status, severity });
            }
            Ok(r) => debug!(path, status = %r.status(), "Path not present."),
            Err(e) => debug!(path, error = %e, "Path request failed, skipping."),
        }

        pace(ctx.config.directory_delay()).await;
    }

    let findings: Vec<Finding> = found.into_iter().filter_map(report).collect();
    info!(findings = %findings.len(), "Directory scan finished.");
    findings
}

fn report(found: FoundPath) -> Option<Finding> {
    if found.severity == Severity::Low && STATIC_ASSET_PATHS.contains(&found.path) {
        return None;
    }
    Some(
        Finding::new(
            FindingCategory::DirectoryEnumeration,
            found.severity,
            format!("Exposed Path: /{}", found.path),
        )
        .description(format!("{} (Status: {})", path_description(found.path), found.status))
        .impact(impact_for(found.severity))
        .recommendation(path_recommendation(found.severity))
        .details(format!("Found at: {}", found.url)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::core::scanner::test_server::{TestResponse, TestServer};

    fn context(url: &str) -> ScanContext {
        let config = ScanConfig {
            directory_delay_ms: 0,
            ..Default::default()
        };
        ScanContext::new(Url::parse(url).unwrap(), config).unwrap()
    }

    #[test]
    fn severity_policy() {
        assert_eq!(assess_severity("admin", 200), Severity::High);
        assert_eq!(assess_severity("admin.php", 200), Severity::High);
        assert_eq!(assess_severity("uploads", 200), Severity::Medium);
        assert_eq!(assess_severity("css", 200), Severity::Low);
        assert_eq!(assess_severity(".git", 403), Severity::Medium);
        assert_eq!(assess_severity("uploads", 403), Severity::Low);
        assert_eq!(assess_severity("phpmyadmin", 301), Severity::Low);
        assert_eq!(assess_severity("admin", 500), Severity::Info);
    }

    #[tokio::test]
    async fn admin_is_reported_and_css_is_suppressed() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/admin" | "/css" => TestResponse::ok("ok"),
            _ => TestResponse::not_found(),
        })
        .await;
        let ctx = context(&server.url("/"));

        let findings = run_directory_scan(&ctx).await;

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].title, "Exposed Path: /admin");
        assert!(findings[0].description.contains("Administrative interface discovered"));
        assert!(findings[0].description.contains("Status: 200"));
        assert_eq!(server.request_count(), COMMON_PATHS.len());
    }

    #[tokio::test]
    async fn redirects_are_observed_not_followed() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/wp-admin" => TestResponse::status(302).with_header("Location", "/wp-login.php"),
            "/.env" => TestResponse::status(403),
            _ => TestResponse::not_found(),
        })
        .await;
        let ctx = context(&server.url("/"));

        let findings = run_directory_scan(&ctx).await;

        let summary: Vec<(&str, Severity)> =
            findings.iter().map(|f| (f.title.as_str(), f.severity)).collect();
        assert_eq!(
            summary,
            vec![("Exposed Path: /wp-admin", Severity::Low), ("Exposed Path: /.env", Severity::Medium)]
        );
        assert_eq!(server.request_count(), COMMON_PATHS.len());
    }
}
