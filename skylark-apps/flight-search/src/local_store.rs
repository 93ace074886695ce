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

//! # Local Store
//!
//! Durable JSON state file: recent airport selections and the light/dark
//! display preference. Read on mount, written through on mutation. A
//! missing or corrupt file degrades to defaults.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::airports::Airport;

/// Light/dark display preference. Storage and echo only; no styling is
/// attached to it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => anyhow::bail!("Invalid theme: {}. Use: light, dark", s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredState {
    pub recent_searches: Vec<Airport>,
    pub theme: Theme,
}

/// Handle on the state file. Cheap to clone around surfaces.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn open(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the whole state. Unreadable or unparsable content is treated as
    /// an empty store, with a warning.
    pub fn load(&self) -> StoredState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return StoredState::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Corrupt state file {:?}, starting fresh: {e}", self.path);
                StoredState::default()
            }
        }
    }

    fn save(&self, state: &StoredState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory {parent:?}"))?;
        }
        let raw = serde_json::to_string_pretty(state).context("Encode state")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write state file {:?}", self.path))
    }

    pub fn recent_airports(&self) -> Vec<Airport> {
        self.load().recent_searches
    }

    pub fn save_recent_airports(&self, airports: &[Airport]) -> Result<()> {
        let mut state = self.load();
        state.recent_searches = airports.to_vec();
        self.save(&state)
    }

    pub fn theme(&self) -> Theme {
        self.load().theme
    }

    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        let mut state = self.load();
        state.theme = theme;
        self.save(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> LocalStore {
        let path = std::env::temp_dir().join(format!(
            "skylark-local-store-{tag}-{}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        LocalStore::open(path)
    }

    #[test]
    fn missing_file_loads_defaults() {
        let store = temp_store("missing");
        let state = store.load();
        assert!(state.recent_searches.is_empty());
        assert_eq!(state.theme, Theme::Light);
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let store = temp_store("corrupt");
        fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load(), StoredState::default());
        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn theme_survives_independent_of_recents() {
        let store = temp_store("theme");
        store.save_theme(Theme::Dark).unwrap();
        store
            .save_recent_airports(&[crate::airports::test_airport("JFK", "e-jfk")])
            .unwrap();

        assert_eq!(store.theme(), Theme::Dark);
        assert_eq!(store.recent_airports().len(), 1);
        let _ = fs::remove_file(store.path());
    }
}
