//! deskgrid.toml configuration parser.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::types::Department;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskgridConfig {
    pub scoring: ScoringWeights,
    /// Department tag → designated zone, used by the proximity factor.
    pub zones: BTreeMap<String, String>,
    pub allocator: AllocatorSettings,
}

/// Weights for the scoring factors. Each must be finite and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub level_fit: f64,
    pub preference_match: f64,
    pub proximity: f64,
    pub priority_boost: f64,
    pub capacity_slack: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            level_fit: 0.30,
            preference_match: 0.25,
            proximity: 0.15,
            priority_boost: 0.15,
            capacity_slack: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> ValidationResult<()> {
        let weights = [
            ("level_fit", self.level_fit),
            ("preference_match", self.preference_match),
            ("proximity", self.proximity),
            ("priority_boost", self.priority_boost),
            ("capacity_slack", self.capacity_slack),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::Weight { name, value });
            }
        }
        if weights.iter().all(|(_, v)| *v == 0.0) {
            return Err(ValidationError::ZeroWeights);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorSettings {
    /// Retry the filter once without the request's location constraint
    /// when it yields no candidates.
    pub broaden_location: bool,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        Self {
            broaden_location: true,
        }
    }
}

impl DeskgridConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: DeskgridConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        self.scoring.validate()
    }

    pub fn zone_for(&self, department: Department) -> Option<&str> {
        self.zones.get(department.as_str()).map(String::as_str)
    }
}
