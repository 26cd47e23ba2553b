//! Configuration management for airtix.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::allocator::DEFAULT_BASE_CODE;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "airtix";

/// Default flight data file name.
const FLIGHT_FILE_NAME: &str = "flight_data.dat";

/// Default ticket data file name.
const TICKET_FILE_NAME: &str = "ticket_data.dat";

/// Default reservation counter file name.
const COUNTER_FILE_NAME: &str = "pnr_counter.dat";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AIRTIX_`)
/// 2. TOML config file at `~/.config/airtix/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Collection size limits.
    pub limits: LimitsConfig,
    /// Reservation code configuration.
    pub reservations: ReservationConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the data files.
    /// Defaults to `~/.local/share/airtix`
    pub data_dir: Option<PathBuf>,
    /// File name of the flight collection.
    pub flight_file: String,
    /// File name of the ticket collection.
    pub ticket_file: String,
    /// File name of the reservation counter.
    pub counter_file: String,
}

/// Collection size limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of flights.
    /// Set to 0 for unlimited.
    pub max_flights: usize,
    /// Maximum number of booked tickets.
    /// Set to 0 for unlimited.
    pub max_tickets: usize,
}

/// Reservation code configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationConfig {
    /// First code issued when no counter has been saved yet.
    pub base_code: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None, // Will be resolved to default at runtime
            flight_file: FLIGHT_FILE_NAME.to_string(),
            ticket_file: TICKET_FILE_NAME.to_string(),
            counter_file: COUNTER_FILE_NAME.to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_flights: 100,
            max_tickets: 1000,
        }
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            base_code: DEFAULT_BASE_CODE,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `AIRTIX_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("AIRTIX_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.reservations.base_code == 0 {
            return Err(Error::ConfigValidation {
                message: "base_code must be greater than 0".to_string(),
            });
        }

        if i64::try_from(self.reservations.base_code).is_err() {
            return Err(Error::ConfigValidation {
                message: format!("base_code must be at most {}", i64::MAX),
            });
        }

        let files = [
            ("flight_file", &self.storage.flight_file),
            ("ticket_file", &self.storage.ticket_file),
            ("counter_file", &self.storage.counter_file),
        ];
        let mut seen = HashSet::new();
        for (key, name) in files {
            if name.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("{key} must not be empty"),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::ConfigValidation {
                    message: format!("{key} '{name}' is used by more than one collection"),
                });
            }
        }

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the flight collection path.
    #[must_use]
    pub fn flight_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.flight_file)
    }

    /// Get the ticket collection path.
    #[must_use]
    pub fn ticket_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.ticket_file)
    }

    /// Get the reservation counter path.
    #[must_use]
    pub fn counter_path(&self) -> PathBuf {
        self.data_dir().join(&self.storage.counter_file)
    }
}
