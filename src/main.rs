// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use webvuln_scanner::config::ScanConfig;
use webvuln_scanner::core::models::{ScanError, ScanReport};
use webvuln_scanner::core::scanner::run_full_scan;
use webvuln_scanner::logging::initialize_logging;

mod app;
mod cli;
mod ui;

use app::{App, AppState};

/// A scan result tagged with the id of the scan that produced it.
type ScanMessage = (u64, Result<ScanReport, ScanError>);

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    initialize_logging()?;

    let args = cli::Args::parse();
    let mut config = ScanConfig::load(args.config.as_deref())?;
    if args.deadline.is_some() {
        config.scan_deadline_secs = args.deadline;
    }

    match args.url {
        Some(url) => run_headless(&url, &config, args.pretty).await,
        None => {
            run_tui(config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Runs one scan and prints the JSON report, or the JSON scan error with a
/// failing exit code.
async fn run_headless(url: &str, config: &ScanConfig, pretty: bool) -> Result<ExitCode> {
    info!(url, "Running headless scan.");
    let (json, code) = match run_full_scan(url, config).await {
        Ok(report) => (to_json(&report, pretty)?, ExitCode::SUCCESS),
        Err(e) => {
            error!(error = %e, "Headless scan failed.");
            (to_json(&e, pretty)?, ExitCode::FAILURE)
        }
    };
    println!("{}", json);
    Ok(code)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

async fn run_tui(config: ScanConfig) -> Result<()> {
    install_tui_panic_hook();

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut app = App::new();
    let (tx, mut rx) = mpsc::channel::<ScanMessage>(1);
    let mut scan_id: u64 = 0;

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(&mut app, &tx, &config, &mut scan_id)?;
        }

        if let Ok((id, result)) = rx.try_recv() {
            // Results of cancelled scans are dropped.
            if id == scan_id && app.state == AppState::Scanning {
                app.finish_scan(result);
            }
        }

        app.on_tick();
    }

    // --- Restore Terminal ---
    restore_terminal()?;
    Ok(())
}

fn restore_terminal() -> std::io::Result<()> {
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()
}

/// Probe panics happen on runtime worker threads and are already turned into
/// findings, so they are only logged. A panic on the main thread restores the
/// terminal before the regular report is printed.
fn install_tui_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if std::thread::current().name() == Some("main") {
            let _ = restore_terminal();
            default_hook(panic_info);
        } else {
            error!(panic = %panic_info, "Panic in background task.");
        }
    }));
}

fn handle_events(
    app: &mut App,
    tx: &mpsc::Sender<ScanMessage>,
    config: &ScanConfig,
    scan_id: &mut u64,
) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            app.quit();
            return Ok(());
        }
        if app.show_disclaimer {
            match key.code {
                KeyCode::Enter => app.show_disclaimer = false,
                KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                _ => {}
            }
            return Ok(());
        }
        match app.state {
            AppState::Idle => handle_idle_input(app, key.code, tx, config, scan_id),
            AppState::Scanning => handle_scanning_input(app, key.code),
            AppState::Finished => handle_finished_input(app, key.code),
            AppState::Failed => handle_failed_input(app, key.code),
        }
    }
    Ok(())
}

/// Input while the user is typing a target. Letters go into the input box, so
/// quitting is on `Esc` and the log panel on `Tab`.
fn handle_idle_input(
    app: &mut App,
    key_code: KeyCode,
    tx: &mpsc::Sender<ScanMessage>,
    config: &ScanConfig,
    scan_id: &mut u64,
) {
    match key_code {
        KeyCode::Esc => app.quit(),
        KeyCode::Tab => app.toggle_logs(),
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => {
            if app.input.trim().is_empty() {
                return;
            }
            *scan_id += 1;
            let id = *scan_id;
            let target = app.input.clone();
            let config = config.clone();
            let tx = tx.clone();

            info!(target = %target, "Scan requested from UI.");
            let task = tokio::spawn(async move {
                let result = run_full_scan(&target, &config).await;
                let _ = tx.send((id, result)).await;
            });
            app.start_scan(task);
        }
        _ => {}
    }
}

fn handle_scanning_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Esc => app.cancel_scan(),
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('l') => app.toggle_logs(),
        KeyCode::Left => app.scroll_logs_left(),
        KeyCode::Right => app.scroll_logs_right(),
        _ => {}
    }
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('n') => app.reset(),
        KeyCode::Char('e') => app.export_report(),
        KeyCode::Char('l') => app.toggle_logs(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        KeyCode::Left => app.scroll_logs_left(),
        KeyCode::Right => app.scroll_logs_right(),
        _ => {}
    }
}

fn handle_failed_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('n') | KeyCode::Esc => app.reset(),
        KeyCode::Char('l') => app.toggle_logs(),
        _ => {}
    }
}
