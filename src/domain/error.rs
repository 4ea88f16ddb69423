//! # Error Types
//!
//! The one failure the core must surface across a boundary: a rejected
//! command registration. Everything else is contained to its unit and only
//! visible in the logs.

use thiserror::Error;

/// The remote registration API rejected a descriptor. Fatal to the whole
/// publish: a partially registered command surface must halt startup rather
/// than run silently degraded.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("remote registration of `/{command}` failed: {source}")]
    Remote {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}
