// src/app.rs

use color_eyre::eyre::{Result, WrapErr};
use ratatui::widgets::{ListState, ScrollbarState};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use webvuln_scanner::core::models::{Finding, ScanError, ScanReport, Severity, Summary};
use webvuln_scanner::logging;

pub const SPINNER_CHARS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Number of log lines kept for the log panel.
const LOG_TAIL_LINES: usize = 200;
/// Ticks between two reads of the log file while the panel is open.
const LOG_REFRESH_TICKS: u8 = 5;

pub enum ExportStatus {
    Idle,
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Scanning,
    Finished,
    Failed,
}

/// What the summary panel shows for a finished scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanSummary {
    pub score: u8,
    pub counts: Summary,
}

impl ScanSummary {
    pub fn from_report(report: &ScanReport) -> Self {
        Self {
            score: security_score(&report.summary),
            counts: report.summary,
        }
    }
}

/// 100 minus a fixed penalty per finding, never below zero.
pub fn security_score(summary: &Summary) -> u8 {
    let penalty = summary.count(Severity::Critical) * 15
        + summary.count(Severity::High) * 10
        + summary.count(Severity::Medium) * 5
        + summary.count(Severity::Low) * 2;
    100usize.saturating_sub(penalty) as u8
}

pub struct App {
    pub should_quit: bool,
    pub show_disclaimer: bool,
    pub show_logs: bool,
    pub state: AppState,
    pub input: String,
    pub scan_report: Option<ScanReport>,
    pub scan_error: Option<ScanError>,
    pub scan_task: Option<JoinHandle<()>>,
    pub summary: ScanSummary,
    /// Score shown by the gauge; climbs towards `summary.score` on each tick.
    pub displayed_score: u8,
    pub analysis_list_state: ListState,
    pub spinner_frame: usize,
    pub log_content: Vec<String>,
    pub log_horizontal_scroll: usize,
    pub log_horizontal_scroll_state: ScrollbarState,
    pub export_status: ExportStatus,
    log_refresh_counter: u8,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            show_disclaimer: true,
            show_logs: false,
            state: AppState::Idle,
            input: String::new(),
            scan_report: None,
            scan_error: None,
            scan_task: None,
            summary: ScanSummary::default(),
            displayed_score: 0,
            analysis_list_state: ListState::default(),
            spinner_frame: 0,
            log_content: Vec::new(),
            log_horizontal_scroll: 0,
            log_horizontal_scroll_state: ScrollbarState::default(),
            export_status: ExportStatus::Idle,
            log_refresh_counter: 0,
        }
    }

    pub fn findings(&self) -> &[Finding] {
        self.scan_report
            .as_ref()
            .map(|r| r.findings.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_finding(&self) -> Option<&Finding> {
        self.analysis_list_state
            .selected()
            .and_then(|i| self.findings().get(i))
    }

    pub fn select_next(&mut self) {
        let len = self.findings().len();
        if len == 0 {
            return;
        }
        let next = match self.analysis_list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.analysis_list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.findings().is_empty() {
            return;
        }
        let previous = match self.analysis_list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.analysis_list_state.select(Some(previous));
    }

    pub fn start_scan(&mut self, task: JoinHandle<()>) {
        self.state = AppState::Scanning;
        self.scan_task = Some(task);
        self.scan_report = None;
        self.scan_error = None;
        self.export_status = ExportStatus::Idle;
    }

    pub fn finish_scan(&mut self, result: Result<ScanReport, ScanError>) {
        self.scan_task = None;
        match result {
            Ok(report) => {
                info!(url = %report.url, findings = report.findings.len(), "Scan report received.");
                self.summary = ScanSummary::from_report(&report);
                self.displayed_score = 0;
                self.analysis_list_state = ListState::default();
                if !report.findings.is_empty() {
                    self.analysis_list_state.select(Some(0));
                }
                self.scan_report = Some(report);
                self.state = AppState::Finished;
            }
            Err(e) => {
                warn!(error = %e, "Scan could not be performed.");
                self.scan_error = Some(e);
                self.state = AppState::Failed;
            }
        }
    }

    /// Aborts the running scan, which drops every in-flight probe request.
    pub fn cancel_scan(&mut self) {
        if let Some(task) = self.scan_task.take() {
            task.abort();
            info!("Scan cancelled by user.");
        }
        self.state = AppState::Idle;
    }

    pub fn on_tick(&mut self) {
        if self.state == AppState::Scanning {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
        if self.state == AppState::Finished && self.displayed_score < self.summary.score {
            self.displayed_score = (self.displayed_score + 2).min(self.summary.score);
        }
        if self.show_logs {
            self.log_refresh_counter = self.log_refresh_counter.wrapping_add(1);
            if self.log_refresh_counter % LOG_REFRESH_TICKS == 0 {
                self.refresh_logs();
            }
        }
    }

    pub fn refresh_logs(&mut self) {
        self.log_content = logging::tail_log(LOG_TAIL_LINES);
    }

    pub fn toggle_logs(&mut self) {
        self.show_logs = !self.show_logs;
        if self.show_logs {
            self.refresh_logs();
        }
    }

    pub fn scroll_logs_left(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_sub(4);
        self.log_horizontal_scroll_state = self
            .log_horizontal_scroll_state
            .position(self.log_horizontal_scroll);
    }

    pub fn scroll_logs_right(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_add(4);
        self.log_horizontal_scroll_state = self
            .log_horizontal_scroll_state
            .position(self.log_horizontal_scroll);
    }

    /// Writes the finished report as JSON into the application data directory.
    pub fn export_report(&mut self) {
        self.export_status = match self.export_report_to(&logging::get_data_dir()) {
            Ok(path) => {
                info!(path = %path.display(), "Report exported.");
                ExportStatus::Success(path.display().to_string())
            }
            Err(e) => {
                warn!(error = %e, "Report export failed.");
                ExportStatus::Error(e.to_string())
            }
        };
    }

    pub fn export_report_to(&self, directory: &Path) -> Result<PathBuf> {
        let report = self
            .scan_report
            .as_ref()
            .ok_or_else(|| color_eyre::eyre::eyre!("No report to export"))?;
        std::fs::create_dir_all(directory)
            .wrap_err_with(|| format!("Cannot create {}", directory.display()))?;

        let host = url::Url::parse(&report.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "target".to_string());
        let file_name = format!("scan-{}-{}.json", host, report.timestamp.format("%Y%m%dT%H%M%SZ"));
        let path = directory.join(file_name);

        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&path, json).wrap_err_with(|| format!("Cannot write {}", path.display()))?;
        Ok(path)
    }

    pub fn quit(&mut self) {
        if let Some(task) = self.scan_task.take() {
            task.abort();
        }
        self.should_quit = true;
    }

    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.scan_report = None;
        self.scan_error = None;
        self.summary = ScanSummary::default();
        self.displayed_score = 0;
        self.analysis_list_state = ListState::default();
        self.export_status = ExportStatus::Idle;
    }
}
