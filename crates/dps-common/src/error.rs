//! Crate-wide error taxonomy.
//!
//! The hot decode path (see `dps-engine::decode`) never returns a `Result` —
//! a malformed frame is expected control flow, not an exceptional one (see
//! the error handling design notes in the spec). These types only cover the
//! ambient boundary: reading config/catalog files and reporting fatal
//! capture-source failures up to the orchestrator.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serdeconv::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read skill catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse skill catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reported up from a `PacketSource` when the underlying capture mechanism
/// fails irrecoverably (error kind 8 in the spec's taxonomy). Other threads
/// keep running until told to stop.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("packet source failed: {0}")]
    Fatal(String),
}
