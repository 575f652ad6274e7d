//! Unified configuration loading for marga-nav.
//!
//! Every component carries its own serde-derived config struct next to
//! its implementation; [`MargaConfig`] aggregates them into a single
//! YAML-loadable document of flat scalar knobs.

pub(crate) mod defaults;
mod error;
mod marga;

pub use error::ConfigLoadError;
pub use marga::MargaConfig;
