//! Top-level configuration document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::area::AreaGraphConfig;
use crate::grid::NavGridConfig;
use crate::planner::PlannerConfig;
use crate::scheduler::SchedulerConfig;
use crate::search::{GossipPolicy, SearchConfig};

use super::error::ConfigLoadError;

/// Full marga-nav configuration loaded from YAML.
///
/// Every section is optional; missing sections fall back to documented
/// defaults, so an empty file is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct MargaConfig {
    /// Walkability grid settings
    #[serde(default)]
    pub grid: NavGridConfig,

    /// Area/portal topology settings
    #[serde(default)]
    pub area: AreaGraphConfig,

    /// Path planner settings
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Request scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Search memory settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Coverage gossip settings
    #[serde(default)]
    pub gossip: GossipPolicy,
}

impl MargaConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Load from the default config path (configs/marga.yaml), falling
    /// back to defaults when the file does not exist.
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new("configs/marga.yaml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        serde_yaml::to_string(self).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }
}
