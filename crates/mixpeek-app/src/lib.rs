//! Mixpeek Signals - command-line front end for the content signal engine.
//!
//! The `mixpeek-signals` binary runs the HTTP connector (`serve`) or a
//! single analysis (`analyze`, `map-product`, `health`). This crate holds
//! the configuration loading and command bodies so they can be tested
//! without the process entry point.

pub mod commands;
pub mod config;

pub use commands::{AnalyzeInput, OutputFormat};
pub use config::{AppConfig, ConfigError, RemoteOptions};
