//! Configuration management for scan-namer.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - A `.env` file in the working directory (lowest priority)

mod settings;

pub use settings::{Config, DEFAULT_API_BASE, DEFAULT_MODEL};
