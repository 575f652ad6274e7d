//! Error types for marga-nav.
//!
//! Only construction-time invariant violations surface here. Runtime
//! conditions (no path, unreachable areas, exhausted budgets) are typed
//! failure results on the individual queries, never errors.

use thiserror::Error;

/// marga-nav error type
#[derive(Error, Debug)]
pub enum NavError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Topology error: {0}")]
    Topology(String),
}

pub type Result<T> = std::result::Result<T, NavError>;
