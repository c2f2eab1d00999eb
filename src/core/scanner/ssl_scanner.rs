// src/core/scanner/ssl_scanner.rs

use tracing::{debug, error, info};

use crate::core::error::{ProbeError, ProbeResult};
use crate::core::models::{Finding, FindingCategory, Severity};
use crate::core::scanner::context::ScanContext;
use chrono::{DateTime, Utc};
use native_tls::{HandshakeError, Protocol, TlsConnector};
use reqwest::StatusCode;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tokio::task::spawn_blocking;
use url::{Host, Url};
use x509_parser::prelude::*;

const TLS_PORT: u16 = 443;

/// The parts of the peer certificate the analysis looks at.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    pub subject_name: String,
    pub issuer_name: String,
    /// `None` when the certificate's expiry cannot be mapped to a calendar date.
    pub not_after: Option<DateTime<Utc>>,
}

/// Outcome of the blocking TLS inspection.
#[derive(Debug, Clone)]
struct TlsScan {
    certificate: Option<CertificateInfo>,
    /// The server completed a second handshake capped at TLS 1.1.
    legacy_protocol_accepted: bool,
}

/// Inspects the transport security of the target.
///
/// Plain `http` targets are checked for HTTPS enforcement. `https` targets get a
/// TLS handshake on port 443 and an inspection of the peer certificate.
pub async fn run_ssl_scan(ctx: &ScanContext) -> Vec<Finding> {
    info!(target = %ctx.target, "Starting SSL/TLS scan.");

    let findings = if ctx.target.scheme() == "http" {
        check_https_enforcement(ctx).await
    } else {
        inspect_certificate(ctx).await
    };

    info!(findings = %findings.len(), "SSL/TLS scan finished.");
    findings
}

async fn check_https_enforcement(ctx: &ScanContext) -> Vec<Finding> {
    let mut findings = vec![
        Finding::new(FindingCategory::Tls, Severity::High, "HTTPS Not Enforced")
            .description("Website is accessible over HTTP (unencrypted connection)")
            .impact("Data transmitted between client and server is not encrypted")
            .recommendation("Enforce HTTPS and redirect all HTTP traffic to HTTPS"),
    ];

    let mut https_url = ctx.target.clone();
    if https_url.set_scheme("https").is_err() {
        return findings;
    }

    debug!(url = %https_url, "Checking whether HTTPS is also served.");
    match ctx.client.get(https_url.as_str()).send().await {
        Ok(response) if response.status() == StatusCode::OK => {
            findings.push(
                Finding::new(FindingCategory::Tls, Severity::Medium, "HTTPS Available but Not Enforced")
                    .description("HTTPS is available but HTTP is not redirected")
                    .impact("Users may accidentally use insecure HTTP connection")
                    .recommendation("Configure automatic HTTP to HTTPS redirection")
                    .details(format!("HTTPS endpoint: {}", https_url)),
            );
        }
        Ok(response) => debug!(status = %response.status(), "HTTPS endpoint did not answer 200."),
        Err(e) => debug!(error = %e, "HTTPS endpoint unreachable."),
    }

    findings
}

async fn inspect_certificate(ctx: &ScanContext) -> Vec<Finding> {
    let Some(host) = connect_host(&ctx.target) else {
        return vec![failure_finding(ProbeError::InvalidTarget("URL has no host".into()))];
    };
    let timeout = ctx.bounded(ctx.config.request_timeout());
    let accept_invalid = ctx.config.accept_invalid_certs;

    debug!("Spawning blocking task for TLS connection.");
    let scan_result = spawn_blocking(move || perform_tls_scan(&host, timeout, accept_invalid))
        .await
        .unwrap_or_else(|e| {
            error!(panic = %e, "Blocking SSL scan task panicked!");
            Err(ProbeError::Task(e.to_string()))
        });

    let scan = match scan_result {
        Ok(scan) => scan,
        Err(e) => return vec![failure_finding(e)],
    };

    let mut findings = match &scan.certificate {
        Some(info) => assess_certificate(info, Utc::now()),
        None => vec![
            Finding::new(FindingCategory::Tls, Severity::Medium, "No Certificate Presented")
                .description("TLS handshake completed but the server did not present a certificate")
                .impact("Server identity cannot be verified")
                .recommendation("Install a certificate issued by a trusted Certificate Authority"),
        ],
    };
    findings.extend(assess_protocol_support(scan.legacy_protocol_accepted));
    findings
}

/// Host to dial and present for SNI. IPv6 literals lose the brackets they carry
/// inside URLs.
fn connect_host(target: &Url) -> Option<String> {
    match target.host()? {
        Host::Domain(domain) => Some(domain.to_string()),
        Host::Ipv4(ip) => Some(ip.to_string()),
        Host::Ipv6(ip) => Some(ip.to_string()),
    }
}

fn perform_tls_scan(host: &str, timeout: Duration, accept_invalid: bool) -> ProbeResult<TlsScan> {
    debug!(host, "Performing TLS connection and handshake.");

    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(accept_invalid)
        .danger_accept_invalid_hostnames(accept_invalid)
        .build()
        .map_err(|e| {
            error!(error = %e, "Failed to create TlsConnector");
            ProbeError::Tls(e)
        })?;

    let addr = (host, TLS_PORT)
        .to_socket_addrs()
        .map_err(|e| ProbeError::Resolve { host: host.to_string(), reason: e.to_string() })?
        .next()
        .ok_or_else(|| ProbeError::Resolve {
            host: host.to_string(),
            reason: "no addresses".to_string(),
        })?;

    debug!(%addr, "Connecting TCP stream to port 443.");
    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| {
        error!(error = %e, "TCP connection failed");
        ProbeError::Io(e)
    })?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let stream = match connector.connect(host, stream) {
        Ok(s) => s,
        Err(HandshakeError::Failure(e)) => {
            error!(error = %e, "TLS handshake failed");
            return Err(ProbeError::Handshake(e.to_string()));
        }
        Err(HandshakeError::WouldBlock(_)) => {
            return Err(ProbeError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "TLS handshake timed out",
            )));
        }
    };

    let cert = match stream.peer_certificate() {
        Ok(Some(c)) => c,
        Ok(None) => {
            debug!("TLS connection successful, but no peer certificate provided.");
            return Ok(TlsScan {
                certificate: None,
                legacy_protocol_accepted: accepts_legacy_protocol(host, addr, timeout),
            });
        }
        Err(e) => {
            error!(error = %e, "Failed to retrieve peer certificate from stream");
            return Err(ProbeError::Tls(e));
        }
    };

    let cert_der = cert.to_der()?;
    let (_, x509) = parse_x509_certificate(&cert_der).map_err(|e| {
        error!(error = %e, "Failed to parse X.509 certificate");
        ProbeError::Certificate(e.to_string())
    })?;

    info!(subject = %x509.subject(), issuer = %x509.issuer(), "Successfully parsed certificate.");

    let certificate = CertificateInfo {
        subject_name: x509.subject().to_string(),
        issuer_name: x509.issuer().to_string(),
        not_after: asn1_time_to_chrono_utc(&x509.validity().not_after),
    };

    Ok(TlsScan {
        certificate: Some(certificate),
        legacy_protocol_accepted: accepts_legacy_protocol(host, addr, timeout),
    })
}

/// Tries a second handshake that offers nothing newer than TLS 1.1. Any failure,
/// including a local TLS library that refuses the old versions, counts as "not
/// accepted".
fn accepts_legacy_protocol(host: &str, addr: SocketAddr, timeout: Duration) -> bool {
    let connector = match TlsConnector::builder()
        .min_protocol_version(Some(Protocol::Tlsv10))
        .max_protocol_version(Some(Protocol::Tlsv11))
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
    {
        Ok(connector) => connector,
        Err(e) => {
            debug!(error = %e, "Legacy TLS connector unavailable.");
            return false;
        }
    };

    let Ok(stream) = TcpStream::connect_timeout(&addr, timeout) else {
        return false;
    };
    if stream.set_read_timeout(Some(timeout)).is_err() || stream.set_write_timeout(Some(timeout)).is_err() {
        return false;
    }

    let accepted = connector.connect(host, stream).is_ok();
    debug!(accepted, "Legacy TLS handshake attempted.");
    accepted
}

/// Medium finding when the server still negotiates TLS 1.0 or 1.1.
pub fn assess_protocol_support(legacy_protocol_accepted: bool) -> Option<Finding> {
    legacy_protocol_accepted.then(|| {
        Finding::new(FindingCategory::Tls, Severity::Medium, "Weak TLS Version")
            .description("Server supports weak TLS versions")
            .impact("Connection may be vulnerable to downgrade attacks")
            .recommendation("Disable TLS 1.0 and 1.1, use TLS 1.2 or higher")
            .details("Handshake completed with TLS 1.1 or lower")
    })
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
}

/// Turns certificate facts into findings, relative to `now`.
pub fn assess_certificate(info: &CertificateInfo, now: DateTime<Utc>) -> Vec<Finding> {
    let mut findings = Vec::new();

    match info.not_after {
        Some(not_after) => {
            let days_left = not_after.signed_duration_since(now).num_days();
            if days_left < 30 {
                let severity = if days_left < 7 { Severity::Critical } else { Severity::High };
                let (title, description) = if days_left < 0 {
                    ("SSL Certificate Expired", format!("SSL certificate expired {} days ago", -days_left))
                } else {
                    ("SSL Certificate Expiring Soon", format!("SSL certificate expires in {} days", days_left))
                };
                debug!(days_left, "Certificate expiry finding.");
                findings.push(
                    Finding::new(FindingCategory::Tls, severity, title)
                        .description(description)
                        .impact("Website will become inaccessible when certificate expires")
                        .recommendation("Renew SSL certificate immediately")
                        .details(format!("Not after: {}", not_after.to_rfc3339())),
                );
            }
        }
        None => findings.push(
            Finding::new(FindingCategory::Tls, Severity::Medium, "Unexpected Certificate Format")
                .description("Could not parse \"notAfter\" field in certificate")
                .impact("May not detect certificate expiration accurately")
                .recommendation("Check certificate format or manually validate"),
        ),
    }

    if info.issuer_name == info.subject_name {
        findings.push(
            Finding::new(FindingCategory::Tls, Severity::High, "Self-Signed Certificate")
                .description("Website uses a self-signed SSL certificate")
                .impact("Browsers will show security warnings to users")
                .recommendation("Use a certificate from a trusted Certificate Authority")
                .details(format!("Issuer: {}", info.issuer_name)),
        );
    }

    findings
}

fn failure_finding(error: ProbeError) -> Finding {
    match error {
        ProbeError::Handshake(message) => {
            Finding::new(FindingCategory::Tls, Severity::High, "SSL Configuration Error")
                .description(format!("SSL handshake failed: {}", message))
                .impact("SSL connection cannot be established")
                .recommendation("Fix SSL configuration issues")
        }
        other => Finding::new(FindingCategory::Tls, Severity::Info, "SSL Analysis Failed")
            .description(format!("Could not analyze SSL configuration: {}", other))
            .impact("Unable to determine SSL security status")
            .recommendation("Manually verify SSL configuration"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::core::scanner::test_server::{TestResponse, TestServer};
    use chrono::Duration as ChronoDuration;

    fn cert(days: Option<i64>, self_signed: bool, now: DateTime<Utc>) -> CertificateInfo {
        CertificateInfo {
            subject_name: "CN=example.com".to_string(),
            issuer_name: if self_signed { "CN=example.com" } else { "CN=Trusted CA" }.to_string(),
            not_after: days.map(|d| now + ChronoDuration::days(d) + ChronoDuration::hours(1)),
        }
    }

    #[test]
    fn expiry_thresholds() {
        let now = Utc::now();
        let critical = assess_certificate(&cert(Some(3), false, now), now);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].severity, Severity::Critical);
        assert_eq!(critical[0].title, "SSL Certificate Expiring Soon");

        let high = assess_certificate(&cert(Some(20), false, now), now);
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].severity, Severity::High);

        assert!(assess_certificate(&cert(Some(200), false, now), now).is_empty());
    }

    #[test]
    fn expired_certificate_is_critical() {
        let now = Utc::now();
        let findings = assess_certificate(&cert(Some(-5), false, now), now);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].title, "SSL Certificate Expired");
    }

    #[test]
    fn unparsable_expiry_is_medium() {
        let now = Utc::now();
        let findings = assess_certificate(&cert(None, false, now), now);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].title, "Unexpected Certificate Format");
    }

    #[test]
    fn self_signed_is_high() {
        let now = Utc::now();
        let findings = assess_certificate(&cert(Some(365), true, now), now);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Self-Signed Certificate");
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn handshake_failures_are_high_everything_else_info() {
        let handshake = failure_finding(ProbeError::Handshake("bad record mac".into()));
        assert_eq!(handshake.severity, Severity::High);
        assert!(handshake.description.contains("bad record mac"));

        let refused = failure_finding(ProbeError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        )));
        assert_eq!(refused.severity, Severity::Info);
        assert_eq!(refused.title, "SSL Analysis Failed");
    }

    #[test]
    fn legacy_protocol_support_is_medium() {
        let finding = assess_protocol_support(true).unwrap();
        assert_eq!(finding.title, "Weak TLS Version");
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.recommendation, "Disable TLS 1.0 and 1.1, use TLS 1.2 or higher");
        assert!(assess_protocol_support(false).is_none());
    }

    #[test]
    fn ipv6_hosts_are_dialed_without_brackets() {
        let v6 = Url::parse("https://[::1]/").unwrap();
        assert_eq!(connect_host(&v6).as_deref(), Some("::1"));
        let v4 = Url::parse("https://127.0.0.1/").unwrap();
        assert_eq!(connect_host(&v4).as_deref(), Some("127.0.0.1"));
        let named = Url::parse("https://example.com/login").unwrap();
        assert_eq!(connect_host(&named).as_deref(), Some("example.com"));
    }

    #[tokio::test]
    async fn ipv6_target_is_not_a_resolution_failure() {
        let ctx = ScanContext::new(Url::parse("https://[::1]/").unwrap(), ScanConfig::default()).unwrap();

        let findings = run_ssl_scan(&ctx).await;

        // Nothing listens on [::1]:443, so the dial fails, but the literal resolves.
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].description.contains("Could not resolve hostname"));
    }

    #[tokio::test]
    async fn plain_http_target_is_flagged() {
        let server = TestServer::start(|_| TestResponse::ok("hello")).await;
        let ctx = ScanContext::new(Url::parse(&server.url("/")).unwrap(), ScanConfig::default()).unwrap();

        let findings = run_ssl_scan(&ctx).await;

        // The test server only speaks plain HTTP, so the HTTPS retry fails.
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "HTTPS Not Enforced");
        assert_eq!(findings[0].severity, Severity::High);
    }
}
