#![allow(clippy::new_without_default)]

//! Ambient stack shared across the DPS telemetry engine: structured logging,
//! wall-clock/monotonic time helpers, the error taxonomy, and TOML
//! configuration loading.

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use error::{CaptureError, CatalogError, ConfigError};
