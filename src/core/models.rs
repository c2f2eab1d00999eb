// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

// --- Core Data Models ---

/// Ordinal risk bucket of a finding.
///
/// The derived `Ord` ranks by risk: `Info` is the lowest, `Critical` the highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// The string tag attached to every finding, grouping it by the probe family
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum FindingCategory {
    #[serde(rename = "SSL/TLS")]
    #[strum(serialize = "SSL/TLS")]
    Tls,
    #[serde(rename = "Security Headers")]
    #[strum(serialize = "Security Headers")]
    SecurityHeaders,
    #[serde(rename = "Information Disclosure")]
    #[strum(serialize = "Information Disclosure")]
    InformationDisclosure,
    #[serde(rename = "SQL Injection")]
    #[strum(serialize = "SQL Injection")]
    SqlInjection,
    #[serde(rename = "Cross-Site Scripting (XSS)")]
    #[strum(serialize = "Cross-Site Scripting (XSS)")]
    Xss,
    #[serde(rename = "Directory Enumeration")]
    #[strum(serialize = "Directory Enumeration")]
    DirectoryEnumeration,
    #[serde(rename = "Port Scan")]
    #[strum(serialize = "Port Scan")]
    PortScan,
    #[serde(rename = "Sensitive Information")]
    #[strum(serialize = "Sensitive Information")]
    SensitiveInformation,
    /// Findings emitted by the orchestrator itself (probe crashes, deadlines).
    #[serde(rename = "Scanner")]
    #[strum(serialize = "Scanner")]
    Scanner,
}

/// One detected issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub impact: String,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Finding {
    pub fn new(category: FindingCategory, severity: Severity, title: impl Into<String>) -> Self {
        Self {
            category,
            title: title.into(),
            description: String::new(),
            severity,
            impact: String::new(),
            recommendation: String::new(),
            details: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = impact.into();
        self
    }

    pub fn recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

// --- Main Report ---

/// Per-severity counts over a report's findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_issues: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl Summary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Summary {
            total_issues: findings.len(),
            ..Default::default()
        };
        for finding in findings {
            *summary.bucket_mut(finding.severity) += 1;
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }

    fn bucket_mut(&mut self, severity: Severity) -> &mut usize {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
            Severity::Info => &mut self.info,
        }
    }

    /// Sum of the five severity buckets. Always equal to `total_issues`.
    pub fn bucket_total(&self) -> usize {
        Severity::iter().map(|s| self.count(s)).sum()
    }
}

/// Result of one scan. Built once by the orchestrator and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "vulnerabilities", alias = "findings")]
    pub findings: Vec<Finding>,
    pub summary: Summary,
}

impl ScanReport {
    pub fn new(url: impl Into<String>, timestamp: DateTime<Utc>, findings: Vec<Finding>) -> Self {
        let summary = Summary::from_findings(&findings);
        Self {
            url: url.into(),
            timestamp,
            findings,
            summary,
        }
    }
}

/// A scan that could not be started at all.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ScanError {
    #[serde(rename = "error")]
    pub message: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

impl ScanError {
    pub fn new(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            url: url.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding::new(FindingCategory::Scanner, severity, "t")
    }

    #[test]
    fn summary_counts_every_bucket() {
        let findings = vec![
            finding(Severity::Critical),
            finding(Severity::High),
            finding(Severity::High),
            finding(Severity::Low),
            finding(Severity::Info),
        ];
        let summary = Summary::from_findings(&findings);
        assert_eq!(summary.total_issues, 5);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.info, 1);
        assert_eq!(summary.bucket_total(), summary.total_issues);
    }

    #[test]
    fn severity_orders_by_risk() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
    }

    #[test]
    fn report_serializes_with_wire_field_names() {
        let report = ScanReport::new(
            "https://example.com",
            Utc::now(),
            vec![finding(Severity::Medium).details("evidence")],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["url"], "https://example.com");
        assert_eq!(json["summary"]["total_issues"], 1);
        assert_eq!(json["summary"]["medium"], 1);
        assert_eq!(json["vulnerabilities"][0]["severity"], "medium");
        assert_eq!(json["vulnerabilities"][0]["category"], "Scanner");
        assert_eq!(json["vulnerabilities"][0]["details"], "evidence");
    }

    #[test]
    fn scan_error_serializes_as_error_object() {
        let err = ScanError::new("URL cannot be empty", "");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "URL cannot be empty");
        assert!(json.get("timestamp").is_some());
    }
}
