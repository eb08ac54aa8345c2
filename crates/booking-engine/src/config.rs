//! Engine configuration, loaded from TOML.

use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::CivilDate;
use crate::recurrence::MAX_REPEAT_COUNT;

/// Tunables for request validation and date resolution.
///
/// ```toml
/// max_repeat_count = 52
/// timezone = "America/Sao_Paulo"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest `repeat_count` a recurring request may ask for.
    pub max_repeat_count: u32,
    /// IANA zone whose civil date counts as "today".
    pub timezone: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_repeat_count: MAX_REPEAT_COUNT,
            timezone: "UTC".to_string(),
        }
    }
}

impl FromStr for EngineConfig {
    type Err = EngineError;

    fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl EngineConfig {
    /// Load and validate a TOML file.
    ///
    /// # Errors
    /// `EngineError::Config` when the file is unreadable, malformed, or invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        content.parse()
    }

    /// # Errors
    /// `EngineError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_REPEAT_COUNT).contains(&self.max_repeat_count) {
            return Err(EngineError::Config(format!(
                "max_repeat_count must be between 1 and {MAX_REPEAT_COUNT}, got {}",
                self.max_repeat_count
            )));
        }
        self.tz()?;
        Ok(())
    }

    /// # Errors
    /// `EngineError::Config` when `timezone` is not an IANA identifier.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| EngineError::Config(format!("invalid timezone: {}", self.timezone)))
    }

    /// The current civil date in the configured zone.
    ///
    /// # Errors
    /// Same as [`Self::tz`].
    pub fn today(&self) -> Result<CivilDate> {
        Ok(Utc::now().with_timezone(&self.tz()?).date_naive())
    }
}
