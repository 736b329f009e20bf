//! TOML-based agenda configuration.
//!
//! ```toml
//! timezone = "America/Sao_Paulo"
//! data_dir = "/home/me/.local/share/weekly-agenda"
//! external_events = "/home/me/appointments.json"
//! ```
//!
//! Every key is optional. The default file lives at
//! `<config dir>/weekly-agenda/config.toml`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, Result};
use crate::temporal::{parse_timezone, DEFAULT_TIMEZONE};

const APP_DIR: &str = "weekly-agenda";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgendaConfig {
    /// IANA zone used to resolve "today".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Directory of the JSON store.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Optional JSON file of fixed appointments.
    #[serde(default)]
    pub external_events: Option<PathBuf>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            data_dir: None,
            external_events: None,
        }
    }
}

impl AgendaConfig {
    /// `<config dir>/weekly-agenda/config.toml`, when a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Read `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::Config`] if the file cannot be read or parsed,
    /// or names an unknown timezone.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AgendaError::Config(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        Self::from_toml(&raw)
            .map_err(|e| AgendaError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::Config`] on malformed TOML and
    /// [`AgendaError::InvalidTimezone`] on an unknown zone.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| AgendaError::Config(e.to_string()))?;
        config.tz()?;
        Ok(config)
    }

    pub fn tz(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    /// The configured data directory, or `<data dir>/weekly-agenda`.
    ///
    /// # Errors
    ///
    /// Returns [`AgendaError::Config`] when neither is available.
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR)))
            .ok_or_else(|| AgendaError::Config("no data directory available".to_string()))
    }
}
