//!  Skylark Flight Search
//!
//!  Copyright (C) 2026  Skylark Contributors
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Runtime Configuration
//!
//! Environment-driven settings for the API client and the local state file.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// RapidAPI host of the flight-search service.
pub const DEFAULT_API_HOST: &str = "sky-scrapper.p.rapidapi.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Load from the environment. `SKYLARK_API_KEY` is required; host and
    /// timeout fall back to defaults with a log line.
    pub fn from_env() -> Result<Self> {
        let host = var_or("SKYLARK_API_HOST", DEFAULT_API_HOST);
        let api_key = env::var("SKYLARK_API_KEY")
            .context("SKYLARK_API_KEY is not set (RapidAPI key for the flight-search service)")?;
        let timeout_secs = var_or("SKYLARK_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .context("Invalid SKYLARK_TIMEOUT_SECS value")?;

        Ok(Self {
            host,
            api_key,
            timeout_secs,
        })
    }
}

/// Path of the durable local state file (recent airports, theme flag).
///
/// `SKYLARK_STATE_FILE` overrides; the default lives under the home
/// directory, or the working directory when no home is available.
pub fn state_file_path() -> PathBuf {
    if let Some(path) = env::var_os("SKYLARK_STATE_FILE") {
        return PathBuf::from(path);
    }
    let base = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(".skylark").join("state.json")
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        tracing::info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
