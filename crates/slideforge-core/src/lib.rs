//! Core SlideForge library (config, service client, session orchestrator).

pub mod client;
pub mod config;
pub mod logging;
pub mod session;
