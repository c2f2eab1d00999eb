// src/config.rs

use color_eyre::eyre::{Result, WrapErr};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const CONFIG_FILE: &str = "config.json";

/// Tunables shared by every probe of a scan.
///
/// The defaults reproduce the scanner's fixed per-request timeouts and pacing. A
/// `config.json` in the platform config directory may override any subset of the
/// fields; missing fields keep their default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub user_agent: String,
    /// Timeout for page fetches and injection requests.
    pub request_timeout_secs: u64,
    /// Timeout for directory and sensitive-file probes.
    pub enumeration_timeout_secs: u64,
    pub port_connect_timeout_ms: u64,
    /// Round-trip above which a delay payload counts as a time-based injection.
    pub time_based_threshold_ms: u64,
    pub directory_delay_ms: u64,
    pub sensitive_file_delay_ms: u64,
    pub xss_form_delay_ms: u64,
    /// Accept self-signed or mismatched certificates so HTTPS targets with broken
    /// trust chains can still be probed.
    pub accept_invalid_certs: bool,
    /// Upper bound on the whole scan. `None` means unbounded.
    pub scan_deadline_secs: Option<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            request_timeout_secs: 10,
            enumeration_timeout_secs: 5,
            port_connect_timeout_ms: 2000,
            time_based_threshold_ms: 4000,
            directory_delay_ms: 100,
            sensitive_file_delay_ms: 100,
            xss_form_delay_ms: 500,
            accept_invalid_certs: true,
            scan_deadline_secs: None,
        }
    }
}

impl ScanConfig {
    /// Loads the configuration from `path`, or from the default location when no
    /// path is given. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults.");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        let config: ScanConfig = serde_json::from_str(&raw)
            .wrap_err_with(|| format!("Failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "Loaded scan configuration.");
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn enumeration_timeout(&self) -> Duration {
        Duration::from_secs(self.enumeration_timeout_secs)
    }

    pub fn port_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.port_connect_timeout_ms)
    }

    pub fn time_based_threshold(&self) -> Duration {
        Duration::from_millis(self.time_based_threshold_ms)
    }

    pub fn directory_delay(&self) -> Duration {
        Duration::from_millis(self.directory_delay_ms)
    }

    pub fn sensitive_file_delay(&self) -> Duration {
        Duration::from_millis(self.sensitive_file_delay_ms)
    }

    pub fn xss_form_delay(&self) -> Duration {
        Duration::from_millis(self.xss_form_delay_ms)
    }

    pub fn scan_deadline(&self) -> Option<Duration> {
        self.scan_deadline_secs.map(Duration::from_secs)
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "webvuln", env!("CARGO_PKG_NAME"))
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_probe_timings() {
        let config = ScanConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.enumeration_timeout(), Duration::from_secs(5));
        assert_eq!(config.port_connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.time_based_threshold(), Duration::from_secs(4));
        assert_eq!(config.xss_form_delay(), Duration::from_millis(500));
        assert!(config.scan_deadline().is_none());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = std::env::temp_dir().join(format!("webvuln-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("partial.json");
        std::fs::write(&path, r#"{ "scan_deadline_secs": 30, "directory_delay_ms": 0 }"#).unwrap();

        let config = ScanConfig::load(Some(&path)).unwrap();
        assert_eq!(config.scan_deadline(), Some(Duration::from_secs(30)));
        assert_eq!(config.directory_delay(), Duration::ZERO);
        assert_eq!(config.request_timeout_secs, 10);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("webvuln-does-not-exist.json");
        let config = ScanConfig::load(Some(&path)).unwrap();
        assert_eq!(config.sensitive_file_delay_ms, 100);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("webvuln-bad-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(ScanConfig::load(Some(&path)).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
