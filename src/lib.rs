// src/lib.rs

//! Web vulnerability scanning engine.
//!
//! [`core::scanner::run_full_scan`] probes one target URL for TLS problems,
//! missing security headers, injection points, exposed paths and files, open
//! ports and leaked sensitive data, and returns a [`core::models::ScanReport`].

pub mod config;
pub mod core;
pub mod logging;
