// src/ui/widgets/mod.rs

pub mod analysis_view; // Findings list and details of the selected finding.
pub mod disclaimer_popup;
pub mod footer; // Key bindings for the current state.
pub mod input;
pub mod log_view;
pub mod summary; // Severity counts and score gauge.
