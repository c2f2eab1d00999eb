// src/core/scanner/sensitive_scanner.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::core::knowledge_base::{file_recommendation, file_severity};
use crate::core::models::{Finding, FindingCategory, Severity};
use crate::core::scanner::context::{ScanContext, pace};

/// Files probed below the target, in order.
pub static SENSITIVE_FILES: &[&str] = &[
    "robots.txt",
    "sitemap.xml",
    ".htaccess",
    ".env",
    "config.php",
    "wp-config.php",
    "database.php",
    "settings.php",
    "web.config",
    "phpinfo.php",
    "info.php",
    "test.php",
    "backup.sql",
    "dump.sql",
    "readme.txt",
    "changelog.txt",
    "license.txt",
    "composer.json",
    "package.json",
];

const MAX_MATCHES: usize = 3;
const SAMPLE_CHARS: usize = 50;

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap());
static RE_PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap());
static RE_CREDIT_CARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b").unwrap());
static RE_SSN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static RE_API_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(api_key|apikey|api-key)[\s=:]+["']?[a-zA-Z0-9]{20,}["']?"#).unwrap()
});
// The second group holds the password value itself.
static RE_PASSWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(password|passwd|pwd)[\s=:]+["']?([^\s"'<>]{6,})["']?"#).unwrap()
});
static RE_DATABASE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(database_url|db_url)[\s=:]+["']?[^\s"'<>]+["']?"#).unwrap());
static RE_SECRET_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(secret_key|secret)[\s=:]+["']?[a-zA-Z0-9]{20,}["']?"#).unwrap()
});

static RE_DISALLOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Disallow:\s*(.+)").unwrap());
static RE_ENV_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[A-Z_]+=").unwrap());

/// How matches of a pattern are screened for common false positives.
#[derive(Clone, Copy)]
enum MatchFilter {
    None,
    /// Role mailboxes such as `info@` are not personal data.
    RoleMailbox,
    /// Placeholder passwords (`example`, `test`, `****`) are ignored.
    PlaceholderPassword,
}

/// A content pattern applied to the main page.
struct ContentPattern<'a> {
    name: &'a str,
    label: &'a str,
    severity: Severity,
    regex: &'a Lazy<Regex>,
    filter: MatchFilter,
}

static PATTERNS: &[ContentPattern] = &[
    ContentPattern { name: "email", label: "Email", severity: Severity::Medium, regex: &RE_EMAIL, filter: MatchFilter::RoleMailbox },
    ContentPattern { name: "phone", label: "Phone", severity: Severity::Medium, regex: &RE_PHONE, filter: MatchFilter::None },
    ContentPattern { name: "credit card", label: "Credit Card", severity: Severity::High, regex: &RE_CREDIT_CARD, filter: MatchFilter::None },
    ContentPattern { name: "SSN", label: "SSN", severity: Severity::High, regex: &RE_SSN, filter: MatchFilter::None },
    ContentPattern { name: "API key", label: "API Key", severity: Severity::High, regex: &RE_API_KEY, filter: MatchFilter::None },
    ContentPattern { name: "password", label: "Password", severity: Severity::High, regex: &RE_PASSWORD, filter: MatchFilter::PlaceholderPassword },
    ContentPattern { name: "database URL", label: "Database URL", severity: Severity::High, regex: &RE_DATABASE_URL, filter: MatchFilter::None },
    ContentPattern { name: "secret key", label: "Secret Key", severity: Severity::High, regex: &RE_SECRET_KEY, filter: MatchFilter::None },
];

const ROLE_MAILBOXES: &[&str] = &["admin@", "info@", "contact@", "noreply@", "no-reply@"];
const PLACEHOLDER_PASSWORDS: &[&str] = &["example", "test", "****"];

impl ContentPattern<'_> {
    /// Up to three surviving matches, in document order.
    fn matches(&self, content: &str) -> Vec<String> {
        self.regex
            .captures_iter(content)
            .filter(|caps| match self.filter {
                MatchFilter::None => true,
                MatchFilter::RoleMailbox => {
                    let lowered = caps[0].to_lowercase();
                    !ROLE_MAILBOXES.iter().any(|m| lowered.contains(m))
                }
                MatchFilter::PlaceholderPassword => {
                    let value = caps.get(2).map_or("", |m| m.as_str()).to_lowercase();
                    !PLACEHOLDER_PASSWORDS.iter().any(|p| value.contains(p))
                }
            })
            .map(|caps| caps[0].to_string())
            .take(MAX_MATCHES)
            .collect()
    }
}

fn sample(first: &str) -> String {
    if first.chars().count() > SAMPLE_CHARS {
        let head: String = first.chars().take(SAMPLE_CHARS).collect();
        format!("Sample: {}...", head)
    } else {
        format!("Found: {}", first)
    }
}

/// Applies every content pattern to a page body. One Finding per pattern with
/// at least one match surviving its filter.
pub fn scan_content(content: &str) -> Vec<Finding> {
    PATTERNS
        .iter()
        .filter_map(|pattern| {
            let matches = pattern.matches(content);
            let first = matches.first()?;
            debug!(pattern = pattern.name, count = matches.len(), "Sensitive pattern matched.");
            Some(
                Finding::new(
                    FindingCategory::SensitiveInformation,
                    pattern.severity,
                    format!("Sensitive Information Exposure - {}", pattern.label),
                )
                .description(format!("Found {} potential {} disclosure(s)", matches.len(), pattern.name))
                .impact("Publicly visible data may be harvested by attackers")
                .recommendation(format!("Remove or protect {} information from public pages", pattern.name))
                .details(sample(first)),
            )
        })
        .collect()
}

/// Extra evidence drawn from the content of an exposed file, when the file
/// type has something worth summarizing.
pub fn analyze_file_content(filename: &str, content: &str) -> Option<String> {
    match filename {
        "robots.txt" => {
            let disallowed = RE_DISALLOW.find_iter(content).count();
            (disallowed > 0).then(|| format!("Reveals {} hidden directories", disallowed))
        }
        "phpinfo.php" | "info.php" => content
            .contains("PHP Version")
            .then(|| "Exposes PHP configuration and server details".to_string()),
        ".env" => {
            let vars = RE_ENV_VAR.find_iter(content).count();
            (vars > 0).then(|| format!("Contains {} environment variables", vars))
        }
        _ => None,
    }
}

/// Scans the main page for sensitive data patterns, then probes for commonly
/// exposed files.
pub async fn run_sensitive_scan(ctx: &ScanContext) -> Vec<Finding> {
    info!(target = %ctx.target, "Starting sensitive information scan.");
    let mut findings = Vec::new();

    match ctx.client.get(ctx.target.as_str()).send().await {
        Ok(response) => match response.text().await {
            Ok(body) => findings.extend(scan_content(&body)),
            Err(e) => debug!(error = %e, "Could not read main page body."),
        },
        Err(e) => debug!(error = %e, "Could not fetch main page for pattern scan."),
    }

    for &filename in SENSITIVE_FILES {
        let file_url = match ctx.join_path(filename) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Cannot build sensitive file URL.");
                findings.push(
                    Finding::new(FindingCategory::SensitiveInformation, Severity::Info, "Sensitive Info Scan Error")
                        .description(format!("Sensitive information scanning failed: {}", e))
                        .impact("Unable to check for exposed sensitive files")
                        .recommendation("Manual review recommended"),
                );
                break;
            }
        };

        let response = ctx
            .client
            .get(file_url.clone())
            .timeout(ctx.bounded(ctx.config.enumeration_timeout()))
            .send()
            .await;
        let body = match response {
            Ok(r) if r.status().as_u16() == 200 => r.text().await.unwrap_or_default(),
            Ok(r) => {
                debug!(file = filename, status = %r.status(), "Sensitive file not served.");
                String::new()
            }
            Err(e) => {
                debug!(file = filename, error = %e, "Sensitive file request failed, skipping.");
                String::new()
            }
        };

        if !body.is_empty() {
            let mut details = format!("File found at: {}", file_url);
            if let Some(extra) = analyze_file_content(filename, &body) {
                details.push_str(&format!(" | {}", extra));
            }
            let severity = file_severity(filename);
            info!(file = filename, %severity, "Sensitive file exposed.");
            findings.push(
                Finding::new(
                    FindingCategory::SensitiveInformation,
                    severity,
                    format!("Sensitive File Exposure - {}", filename),
                )
                .description(format!("Sensitive file \"{}\" is publicly accessible", filename))
                .impact("File contents may disclose configuration, credentials or internal paths")
                .recommendation(file_recommendation(filename))
                .details(details),
            );
        }

        pace(ctx.config.sensitive_file_delay()).await;
    }

    info!(findings = %findings.len(), "Sensitive information scan finished.");
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::core::scanner::test_server::{TestResponse, TestServer};
    use url::Url;

    #[test]
    fn role_mailboxes_are_filtered_and_matches_capped() {
        let page = "Write to admin@corp.io, a@corp.io, b@corp.io, c@corp.io or d@corp.io";
        let findings = scan_content(page);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Sensitive Information Exposure - Email");
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].description, "Found 3 potential email disclosure(s)");
        assert_eq!(findings[0].details.as_deref(), Some("Found: a@corp.io"));
    }

    #[test]
    fn placeholder_passwords_are_ignored() {
        assert!(scan_content("password=test1234").is_empty());
        assert!(scan_content("pwd: ********").is_empty());
        let findings = scan_content("db password=hunter2secret");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].details.as_deref(), Some("Found: password=hunter2secret"));
    }

    #[test]
    fn long_matches_are_sampled() {
        let key = "a".repeat(60);
        let findings = scan_content(&format!("api_key={}", key));
        assert_eq!(findings.len(), 1);
        let details = findings[0].details.as_deref().unwrap();
        assert!(details.starts_with("Sample: api_key="));
        assert!(details.ends_with("..."));
    }

    #[test]
    fn file_content_addenda() {
        assert_eq!(
            analyze_file_content("robots.txt", "User-agent: *\nDisallow: /admin\nDisallow: /tmp\n"),
            Some("Reveals 2 hidden directories".to_string())
        );
        assert_eq!(
            analyze_file_content("info.php", "<h1>PHP Version 8.2.1</h1>"),
            Some("Exposes PHP configuration and server details".to_string())
        );
        assert_eq!(
            analyze_file_content(".env", "APP_KEY=x\nDB_HOST=db\n# comment\n"),
            Some("Contains 2 environment variables".to_string())
        );
        assert_eq!(analyze_file_content("readme.txt", "hello"), None);
    }

    #[tokio::test]
    async fn exposed_env_file_is_high() {
        let server = TestServer::start(|req| match req.path.as_str() {
            "/" => TestResponse::ok("<html>hello</html>"),
            "/.env" => TestResponse::ok("APP_KEY=abc\nDB_PASSWORD=xyz\n"),
            "/readme.txt" => TestResponse::ok(""),
            _ => TestResponse::not_found(),
        })
        .await;
        let config = ScanConfig {
            sensitive_file_delay_ms: 0,
            ..Default::default()
        };
        let ctx = ScanContext::new(Url::parse(&server.url("/")).unwrap(), config).unwrap();

        let findings = run_sensitive_scan(&ctx).await;

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Sensitive File Exposure - .env");
        assert_eq!(findings[0].severity, Severity::High);
        let details = findings[0].details.as_deref().unwrap();
        assert!(details.ends_with("/.env | Contains 2 environment variables"));
        assert_eq!(server.request_count(), 1 + SENSITIVE_FILES.len());
    }
}
