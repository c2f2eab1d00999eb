//! Static, read-only advisory data used by the probes.
//!
//! Every table here is pure data: built at compile time, never mutated, and shared
//! by all scans without synchronization.

use crate::core::models::Severity;

/// Advisory record for one required security header.
pub struct HeaderRule {
    /// Lower-case header name.
    pub name: &'static str,
    pub severity: Severity,
    pub title: &'static str,
    pub description: &'static str,
    pub impact: &'static str,
    pub recommendation: &'static str,
}

/// The security headers every response should carry, in reporting order.
pub static REQUIRED_HEADERS: &[HeaderRule] = &[
    HeaderRule {
        name: "content-security-policy",
        severity: Severity::High,
        title: "Missing Content Security Policy",
        description: "Content-Security-Policy header is not present",
        impact: "Website is vulnerable to XSS and data injection attacks",
        recommendation: "Implement Content-Security-Policy header to prevent XSS attacks",
    },
    HeaderRule {
        name: "x-frame-options",
        severity: Severity::Medium,
        title: "Missing X-Frame-Options",
        description: "X-Frame-Options header is not present",
        impact: "Website may be vulnerable to clickjacking attacks",
        recommendation: "Set X-Frame-Options to DENY or SAMEORIGIN",
    },
    HeaderRule {
        name: "strict-transport-security",
        severity: Severity::Medium,
        title: "Missing Strict Transport Security",
        description: "Strict-Transport-Security header is not present",
        impact: "Website is vulnerable to protocol downgrade attacks",
        recommendation: "Implement HSTS header to enforce HTTPS connections",
    },
    HeaderRule {
        name: "x-content-type-options",
        severity: Severity::Low,
        title: "Missing X-Content-Type-Options",
        description: "X-Content-Type-Options header is not present",
        impact: "Browser may perform MIME type sniffing attacks",
        recommendation: "Set X-Content-Type-Options to nosniff",
    },
    HeaderRule {
        name: "referrer-policy",
        severity: Severity::Low,
        title: "Missing Referrer Policy",
        description: "Referrer-Policy header is not present",
        impact: "Referrer information may leak to external sites",
        recommendation: "Set appropriate Referrer-Policy header",
    },
    HeaderRule {
        name: "permissions-policy",
        severity: Severity::Low,
        title: "Missing Permissions Policy",
        description: "Permissions-Policy header is not present",
        impact: "Browser features are not restricted",
        recommendation: "Implement Permissions-Policy to control browser features",
    },
];

/// Response headers that reveal the server's technology stack.
pub static DISCLOSURE_HEADERS: &[&str] = &[
    "server",
    "x-powered-by",
    "x-aspnet-version",
    "x-generator",
    "x-drupal-cache",
];

// --- Ports ---

pub struct PortService {
    pub port: u16,
    pub service: &'static str,
    pub description: &'static str,
}

pub static PORT_SERVICES: &[PortService] = &[
    PortService { port: 21, service: "FTP", description: "File Transfer Protocol - often allows anonymous access" },
    PortService { port: 22, service: "SSH", description: "Secure Shell - ensure strong authentication" },
    PortService { port: 23, service: "Telnet", description: "Unencrypted remote access - highly insecure" },
    PortService { port: 25, service: "SMTP", description: "Mail server - check for open relay" },
    PortService { port: 53, service: "DNS", description: "Domain Name System" },
    PortService { port: 80, service: "HTTP", description: "Web server - standard HTTP port" },
    PortService { port: 110, service: "POP3", description: "Mail retrieval - consider encrypted alternatives" },
    PortService { port: 143, service: "IMAP", description: "Mail access - consider encrypted alternatives" },
    PortService { port: 443, service: "HTTPS", description: "Secure web server" },
    PortService { port: 993, service: "IMAPS", description: "Secure IMAP" },
    PortService { port: 995, service: "POP3S", description: "Secure POP3" },
    PortService { port: 1433, service: "MSSQL", description: "Microsoft SQL Server - should not be exposed" },
    PortService { port: 3306, service: "MySQL", description: "MySQL database - should not be exposed" },
    PortService { port: 3389, service: "RDP", description: "Remote Desktop - high security risk" },
    PortService { port: 5432, service: "PostgreSQL", description: "PostgreSQL database - should not be exposed" },
    PortService { port: 5900, service: "VNC", description: "Virtual Network Computing - often insecure" },
    PortService { port: 6379, service: "Redis", description: "Redis database - should not be exposed" },
    PortService { port: 8080, service: "HTTP-Alt", description: "Alternative HTTP port" },
    PortService { port: 8443, service: "HTTPS-Alt", description: "Alternative HTTPS port" },
    PortService { port: 27017, service: "MongoDB", description: "MongoDB database - should not be exposed" },
];

/// Returns `(service, description)` for a port, with a generic fallback for ports
/// outside the table.
pub fn port_service(port: u16) -> (String, String) {
    match PORT_SERVICES.iter().find(|p| p.port == port) {
        Some(p) => (p.service.to_string(), p.description.to_string()),
        None => (format!("Port {}", port), format!("Unknown service running on port {}", port)),
    }
}

pub static HIGH_RISK_PORTS: &[u16] = &[21, 23, 1433, 3306, 3389, 5432, 5900, 6379, 27017];
pub static MEDIUM_RISK_PORTS: &[u16] = &[22, 25, 110, 143, 993, 995];

// --- Directories ---

pub static HIGH_RISK_PATHS: &[&str] = &[
    "admin", "administrator", "wp-admin", "phpmyadmin", "backup", "backups", "database", "db",
    "logs", "log", ".env", ".git", ".svn", "config",
];

pub static MEDIUM_RISK_PATHS: &[&str] = &[
    "uploads", "upload", "files", "temp", "tmp", "phpinfo.php", "info.php", "test", "tests", "dev",
];

/// Static asset paths that are never worth reporting at low severity.
pub static STATIC_ASSET_PATHS: &[&str] = &["css", "js", "assets", "static", "images"];

static PATH_DESCRIPTIONS: &[(&str, &str)] = &[
    ("admin", "Administrative interface discovered"),
    ("wp-admin", "WordPress admin panel found"),
    ("phpmyadmin", "phpMyAdmin interface exposed"),
    ("backup", "Backup directory accessible"),
    ("database", "Database directory found"),
    ("logs", "Log files directory accessible"),
    (".env", "Environment configuration file exposed"),
    (".git", "Git repository exposed"),
    ("phpinfo.php", "PHP info page accessible"),
    ("config", "Configuration directory found"),
];

pub fn path_description(path: &str) -> String {
    PATH_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(_, desc)| desc.to_string())
        .unwrap_or_else(|| format!("Directory \"{}\" found", path))
}

pub fn path_recommendation(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "Restrict access to sensitive directories immediately",
        Severity::Medium => "Review directory permissions and content",
        Severity::Low => "Consider restricting access if sensitive",
        _ => "Review directory accessibility",
    }
}

// --- Sensitive files ---

pub static HIGH_RISK_FILES: &[&str] = &[
    ".env", "config.php", "wp-config.php", "database.php", "web.config", "backup.sql", "dump.sql",
];

pub static MEDIUM_RISK_FILES: &[&str] = &["phpinfo.php", "info.php", "test.php", ".htaccess"];

pub fn file_severity(filename: &str) -> Severity {
    if HIGH_RISK_FILES.contains(&filename) {
        Severity::High
    } else if MEDIUM_RISK_FILES.contains(&filename) {
        Severity::Medium
    } else {
        Severity::Low
    }
}

static FILE_RECOMMENDATIONS: &[(&str, &str)] = &[
    (".env", "Remove .env file from web directory - contains sensitive configuration"),
    ("robots.txt", "Review robots.txt for sensitive path disclosure"),
    ("phpinfo.php", "Remove phpinfo.php - exposes server configuration"),
    ("config.php", "Move configuration file outside web root"),
    ("wp-config.php", "Secure WordPress configuration file"),
    (".htaccess", "Ensure .htaccess does not expose sensitive rules"),
    ("backup.sql", "Remove database backup from web directory"),
    ("composer.json", "Review for sensitive dependency information"),
];

pub fn file_recommendation(filename: &str) -> String {
    FILE_RECOMMENDATIONS
        .iter()
        .find(|(name, _)| *name == filename)
        .map(|(_, rec)| rec.to_string())
        .unwrap_or_else(|| format!("Secure or remove {} from public access", filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_headers_keep_reporting_order() {
        let severities: Vec<Severity> = REQUIRED_HEADERS.iter().map(|h| h.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::High,
                Severity::Medium,
                Severity::Medium,
                Severity::Low,
                Severity::Low,
                Severity::Low
            ]
        );
    }

    #[test]
    fn unknown_port_gets_generic_service() {
        assert_eq!(port_service(3306).0, "MySQL");
        let (service, description) = port_service(4444);
        assert_eq!(service, "Port 4444");
        assert!(description.contains("4444"));
    }

    #[test]
    fn unknown_path_gets_templated_description() {
        assert_eq!(path_description("admin"), "Administrative interface discovered");
        assert_eq!(path_description("api"), "Directory \"api\" found");
    }

    #[test]
    fn file_tables_fall_back_to_low_and_generic_advice() {
        assert_eq!(file_severity("dump.sql"), Severity::High);
        assert_eq!(file_severity(".htaccess"), Severity::Medium);
        assert_eq!(file_severity("readme.txt"), Severity::Low);
        assert_eq!(
            file_recommendation("readme.txt"),
            "Secure or remove readme.txt from public access"
        );
    }
}
