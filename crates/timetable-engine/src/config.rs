//! Grid settings, loadable from TOML.
//!
//! ```toml
//! max_slots_per_day = 6
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Upper bound accepted for `max_slots_per_day`.
pub const SLOT_LIMIT: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Cap on the grid width K. The width is the highest committed slot
    /// number of the schedule, never more than this.
    pub max_slots_per_day: u8,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            max_slots_per_day: 6,
        }
    }
}

impl GridSettings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: GridSettings = toml::from_str(content).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.max_slots_per_day == 0 || self.max_slots_per_day > SLOT_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_slots_per_day must be between 1 and {}, got {}",
                SLOT_LIMIT, self.max_slots_per_day
            ))
            .into());
        }
        Ok(())
    }
}
