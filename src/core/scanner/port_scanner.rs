// src/core/scanner/port_scanner.rs

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::error::ResolveError;
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::core::error::{ProbeError, ProbeResult};
use crate::core::knowledge_base::{HIGH_RISK_PORTS, MEDIUM_RISK_PORTS, port_service};
use crate::core::models::{Finding, FindingCategory, Severity};
use crate::core::scanner::context::ScanContext;

/// Ports probed on every target, in reporting order.
pub static COMMON_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 143, 443, 993, 995, 1433, 3306, 3389, 5432, 5900, 6379, 8080,
    8443, 27017,
];

/// Runs a TCP connect scan of the common ports on the target's host.
///
/// # Arguments
/// * `ctx` - The scan context; only the host of its target is used.
///
/// # Returns
/// A summary Finding plus one Finding per risky open port, or a single info
/// Finding when the host cannot be resolved.
pub async fn run_port_scan(ctx: &ScanContext) -> Vec<Finding> {
    let Some(host) = ctx.host() else {
        return vec![error_finding("Could not extract hostname from URL")];
    };
    info!(target = %host, "Starting port scan.");

    let ip = match resolve_host(host).await {
        Ok(ip) => ip,
        Err(e) => {
            warn!(error = %e, "Port scan aborted.");
            return vec![error_finding(&e.to_string())];
        }
    };
    debug!(host, %ip, "Host resolved for port scan.");

    let timeout = ctx.bounded(ctx.config.port_connect_timeout());
    let open = scan_ports(ip, COMMON_PORTS, timeout).await;
    let findings = analyze_open_ports(host, ip, &open);
    info!(open = ?open, findings = %findings.len(), "Port scan finished.");
    findings
}

fn error_finding(description: &str) -> Finding {
    Finding::new(FindingCategory::PortScan, Severity::Info, "Port Scan Error")
        .description(description)
        .impact("Unable to determine exposed network services")
        .recommendation("Check if the hostname is correct or scan ports manually")
}

/// Resolves a host to a single address, preferring IPv4. IP literals are
/// returned as-is without a lookup.
///
/// Names are looked up with the system resolver configuration. If that cannot
/// be loaded or the lookup fails, the OS resolver is asked directly.
async fn resolve_host(host: &str) -> ProbeResult<IpAddr> {
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return Ok(ip);
    }

    let addrs = match lookup_with_system_conf(host).await {
        Ok(addrs) if !addrs.is_empty() => addrs,
        Ok(_) => lookup_with_os(host).await?,
        Err(e) => {
            debug!(host, error = %e, "Resolver lookup failed, asking the OS resolver.");
            lookup_with_os(host).await?
        }
    };

    preferred_address(&addrs).ok_or_else(|| ProbeError::Resolve {
        host: host.to_string(),
        reason: "no addresses returned".to_string(),
    })
}

async fn lookup_with_system_conf(host: &str) -> Result<Vec<IpAddr>, ResolveError> {
    let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
    let lookup = resolver.lookup_ip(host).await?;
    Ok(lookup.iter().collect())
}

async fn lookup_with_os(host: &str) -> ProbeResult<Vec<IpAddr>> {
    let addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| ProbeError::Resolve {
            host: host.to_string(),
            reason: e.to_string(),
        })?;
    Ok(addrs.map(|addr| addr.ip()).collect())
}

/// First IPv4 address, else the first address of any family.
fn preferred_address(addrs: &[IpAddr]) -> Option<IpAddr> {
    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}

/// Attempts one TCP connection per port concurrently and returns the ports that
/// accepted, ascending.
///
/// Each worker owns its result; the set is fully joined before anything is read.
/// Dropping the returned future aborts every outstanding dial.
pub async fn scan_ports(ip: IpAddr, ports: &[u16], timeout: Duration) -> Vec<u16> {
    let mut workers = JoinSet::new();
    for &port in ports {
        workers.spawn(async move {
            let addr = SocketAddr::new(ip, port);
            match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
                Ok(Ok(_)) => Some(port),
                Ok(Err(_)) | Err(_) => None,
            }
        });
    }

    let mut open = Vec::new();
    while let Some(result) = workers.join_next().await {
        match result {
            Ok(Some(port)) => open.push(port),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Port worker did not complete."),
        }
    }
    open.sort_unstable();
    open
}

/// Turns the open-port list into findings. Nothing is reported when no port
/// is open.
pub fn analyze_open_ports(host: &str, ip: IpAddr, open: &[u16]) -> Vec<Finding> {
    let mut findings = Vec::new();
    if open.is_empty() {
        return findings;
    }

    let listing = open
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    findings.push(
        Finding::new(FindingCategory::PortScan, Severity::Info, "Open Ports Discovered")
            .description(format!("Found {} open ports on {} ({})", open.len(), host, ip))
            .impact("Each open port increases the attack surface")
            .recommendation("Review if all open ports are necessary and properly secured")
            .details(format!("Open ports: {}", listing)),
    );

    for &port in open {
        let (service, description) = port_service(port);
        let (severity, recommendation) = if HIGH_RISK_PORTS.contains(&port) {
            (Severity::High, format!("Secure or close {} service if not required", service))
        } else if MEDIUM_RISK_PORTS.contains(&port) {
            (Severity::Medium, format!("Ensure {} service is properly configured", service))
        } else {
            continue;
        };

        findings.push(
            Finding::new(FindingCategory::PortScan, severity, format!("{} Service Exposed", service))
                .description(format!("{} service running on port {}", service, port))
                .impact(format!("Exposed {} service can be targeted directly", service))
                .recommendation(recommendation)
                .details(description),
        );
    }

    findings
}
