// src/core/scanner/headers_scanner.rs

use tracing::{debug, error, info, warn};

use crate::core::knowledge_base::{DISCLOSURE_HEADERS, REQUIRED_HEADERS};
use crate::core::models::{Finding, FindingCategory, Severity};
use crate::core::scanner::context::ScanContext;
use reqwest::header::HeaderMap;

/// HSTS max-age below one year is considered too short.
const MIN_HSTS_MAX_AGE: i64 = 31_536_000;

/// Reads a header as a string. Header names in a `HeaderMap` are already
/// lower-case, so `name` must be lower-case too.
///
/// Non-UTF-8 values are reported as a placeholder rather than dropped, so the
/// header still counts as present.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).map(|value| match value.to_str() {
        Ok(s) => s.to_string(),
        Err(_) => {
            warn!(header_name = name, "Header found but contained invalid UTF-8.");
            "[Invalid UTF-8]".to_string()
        }
    })
}

/// Runs a scan for common security-related HTTP headers.
///
/// One GET is sent to the target (redirects followed) and the final response's
/// headers are analyzed. A failed request degrades to a single info finding.
pub async fn run_headers_scan(ctx: &ScanContext) -> Vec<Finding> {
    info!(target = %ctx.target, "Starting headers scan.");

    match ctx.client.get(ctx.target.as_str()).send().await {
        Ok(response) => {
            info!(status = %response.status(), "Received HTTP response for headers scan.");
            let findings = analyze_headers(response.headers());
            info!(findings = %findings.len(), "Headers scan finished.");
            findings
        }
        Err(e) => {
            error!(url = %ctx.target, error = %e, "HTTP request failed for headers scan.");
            vec![
                Finding::new(FindingCategory::SecurityHeaders, Severity::Info, "Headers Check Failed")
                    .description(format!("Could not retrieve headers: {}", e))
                    .impact("Unable to verify security headers")
                    .recommendation("Ensure website is accessible and retry scan"),
            ]
        }
    }
}

/// Analyzes response headers and produces findings.
///
/// Order: missing required headers, CSP weaknesses, X-Frame-Options weakness,
/// information-disclosure headers, HSTS max-age.
pub fn analyze_headers(headers: &HeaderMap) -> Vec<Finding> {
    debug!("Analyzing collected header data.");
    let mut findings = Vec::new();

    for rule in REQUIRED_HEADERS {
        if !headers.contains_key(rule.name) {
            debug!(header_name = rule.name, "Required header missing.");
            findings.push(
                Finding::new(FindingCategory::SecurityHeaders, rule.severity, rule.title)
                    .description(rule.description)
                    .impact(rule.impact)
                    .recommendation(rule.recommendation),
            );
        }
    }

    if let Some(csp) = header_value(headers, "content-security-policy") {
        findings.extend(check_csp(&csp.to_lowercase()));
    }

    if let Some(xfo) = header_value(headers, "x-frame-options") {
        let xfo = xfo.trim().to_lowercase();
        if xfo != "deny" && xfo != "sameorigin" {
            findings.push(
                Finding::new(FindingCategory::SecurityHeaders, Severity::Low, "Weak X-Frame-Options")
                    .description(format!("X-Frame-Options set to: {}", xfo))
                    .impact("May not provide adequate clickjacking protection")
                    .recommendation("Set X-Frame-Options to DENY or SAMEORIGIN"),
            );
        }
    }

    for name in DISCLOSURE_HEADERS {
        if let Some(value) = header_value(headers, name) {
            findings.push(
                Finding::new(
                    FindingCategory::InformationDisclosure,
                    Severity::Info,
                    "Server Information Disclosure",
                )
                .description(format!("{} header reveals server information: {}", name, value))
                .impact("Server/technology stack information disclosed")
                .recommendation(format!("Remove or obfuscate {} header", name))
                .details(format!("{}: {}", name, value)),
            );
        }
    }

    if let Some(hsts) = header_value(headers, "strict-transport-security") {
        findings.extend(check_hsts(&hsts));
    }

    findings
}

fn check_csp(csp: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    if csp.contains("unsafe-inline") || csp.contains("unsafe-eval") {
        findings.push(
            Finding::new(FindingCategory::SecurityHeaders, Severity::Medium, "Weak Content Security Policy")
                .description("CSP contains unsafe-inline or unsafe-eval directives")
                .impact("Reduced protection against XSS attacks")
                .recommendation("Remove unsafe-inline and unsafe-eval from CSP"),
        );
    }
    if csp.contains('*') {
        findings.push(
            Finding::new(FindingCategory::SecurityHeaders, Severity::Medium, "Overly Permissive CSP")
                .description("CSP contains wildcard (*) sources")
                .impact("CSP provides minimal protection")
                .recommendation("Use specific sources instead of wildcards in CSP"),
        );
    }
    findings
}

fn check_hsts(hsts: &str) -> Option<Finding> {
    let lowered = hsts.to_lowercase();
    let (_, rest) = lowered.split_once("max-age=")?;
    let raw = rest.split(';').next().unwrap_or("").trim();

    match raw.parse::<i64>() {
        Ok(max_age) if max_age < MIN_HSTS_MAX_AGE => Some(
            Finding::new(FindingCategory::SecurityHeaders, Severity::Low, "Short HSTS Max-Age")
                .description(format!("HSTS max-age is only {} seconds", max_age))
                .impact("HSTS protection expires quickly")
                .recommendation("Set HSTS max-age to at least 31536000 (1 year)"),
        ),
        Ok(_) => None,
        Err(_) => {
            debug!(value = raw, "Unparsable HSTS max-age.");
            Some(
                Finding::new(FindingCategory::SecurityHeaders, Severity::Medium, "Invalid HSTS Configuration")
                    .description("HSTS header has invalid max-age value")
                    .impact("HSTS protection may not work correctly")
                    .recommendation("Fix HSTS max-age directive"),
            )
        }
    }
}
