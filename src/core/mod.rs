// src/core/mod.rs

// Root of the scanning engine. Front-ends only need `scanner::run_full_scan`
// and the types in `models`.

/// Findings, severities and the scan report handed to callers.
pub mod models;

/// The orchestrator and the seven probes it dispatches.
pub mod scanner;

/// Static reference tables: header rules, port services, risky paths and files.
pub mod knowledge_base;

pub mod error;
