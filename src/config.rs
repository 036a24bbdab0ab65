// HomeLib - Home Book Collection Manager
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Application configuration
//!
//! All configuration is loaded from environment variables at startup. A `.env`
//! file in the working directory is honoured for local development.
//!
//! | Variable           | Default                          |
//! |--------------------|----------------------------------|
//! | `HOMELIB_DATABASE` | `Database::get_default_path()`   |
//! | `RUST_LOG`         | `INFO`                           |

use crate::error::{LibraryError, Result};
use crate::storage::Database;
use std::path::PathBuf;
use tracing::Level;

/// Environment variable naming the database file
pub const DATABASE_VAR: &str = "HOMELIB_DATABASE";

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// The `.env` file is skipped in test builds so tests stay hermetic.
    pub fn from_env() -> Result<Self> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_path = lookup(DATABASE_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Database::get_default_path);

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            LibraryError::ConfigurationError(format!(
                "RUST_LOG: '{}' is not a valid log level",
                log_level_str
            ))
        })?;

        Ok(Self {
            database_path,
            log_level,
        })
    }
}
