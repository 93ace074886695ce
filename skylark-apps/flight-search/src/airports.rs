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

//! # Airport Lookup
//!
//! Debounced autocomplete against the airport-search endpoint, with
//! last-issued-wins suppression of out-of-order responses and a bounded
//! recent-selections list persisted through the local store.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use skylark_query_debounce::{Debouncer, SequenceGate};

use crate::local_store::LocalStore;

/// Keystroke coalescing window for the autocomplete endpoint.
pub const LOOKUP_DEBOUNCE: Duration = Duration::from_millis(500);

/// Upper bound of the persisted recent-selections list.
pub const RECENT_LIMIT: usize = 5;

/// One airport/location record from the autocomplete endpoint. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    pub sky_id: String,
    pub entity_id: String,
    pub presentation: AirportPresentation,
    pub navigation: AirportNavigation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportPresentation {
    pub title: String,
    pub suggestion_title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportNavigation {
    pub entity_id: String,
    pub relevant_flight_params: RelevantFlightParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevantFlightParams {
    pub sky_id: String,
}

impl Airport {
    /// Display label shown in suggestion lists and selected-airport slots.
    pub fn label(&self) -> &str {
        &self.presentation.suggestion_title
    }
}

/// Where autocomplete suggestions come from. Implemented by the API client;
/// tests substitute an in-memory source.
pub trait AirportSource: Send + Sync {
    fn query(&self, text: &str) -> impl Future<Output = Result<Vec<Airport>>> + Send;
}

/// Newest-first, bounded, duplicate-free (by entity id) selection history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecentAirports {
    entries: Vec<Airport>,
}

impl RecentAirports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted entries, enforcing the bound on load.
    pub fn from_entries(mut entries: Vec<Airport>) -> Self {
        entries.truncate(RECENT_LIMIT);
        Self { entries }
    }

    /// Record a selection: existing entry with the same entity id is
    /// removed, the airport goes to the front, the list stays bounded.
    pub fn record(&mut self, airport: Airport) {
        self.entries.retain(|a| a.entity_id != airport.entity_id);
        self.entries.insert(0, airport);
        self.entries.truncate(RECENT_LIMIT);
    }

    pub fn entries(&self) -> &[Airport] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Debounced airport autocomplete with stale-response suppression.
///
/// Owns its debounce timer (cancelled on drop) and a [`SequenceGate`] so a
/// superseded request's late response never overwrites the suggestions of a
/// newer query. Failures degrade to an empty suggestion list and are only
/// logged.
pub struct AirportLookup<S> {
    source: Arc<S>,
    debouncer: Debouncer,
    gate: SequenceGate,
    suggestions: Arc<Mutex<Vec<Airport>>>,
    recents: RecentAirports,
    store: LocalStore,
}

impl<S> AirportLookup<S>
where
    S: AirportSource + 'static,
{
    /// Mount the lookup: recent selections are re-read from the store.
    pub fn new(source: Arc<S>, store: LocalStore) -> Self {
        let recents = RecentAirports::from_entries(store.recent_airports());
        Self {
            source,
            debouncer: Debouncer::new(LOOKUP_DEBOUNCE),
            gate: SequenceGate::new(),
            suggestions: Arc::new(Mutex::new(Vec::new())),
            recents,
            store,
        }
    }

    /// Feed the current text of the search box.
    ///
    /// Whitespace-only input clears the suggestions and cancels any pending
    /// fetch without touching the network. Anything else (re)schedules a
    /// debounced fetch; only the latest-issued fetch may commit its result.
    pub fn input(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.debouncer.cancel();
            self.suggestions
                .lock()
                .expect("suggestions lock poisoned")
                .clear();
            return;
        }

        let ticket = self.gate.issue();
        let gate = self.gate.clone();
        let source = Arc::clone(&self.source);
        let suggestions = Arc::clone(&self.suggestions);
        let text = trimmed.to_string();

        self.debouncer.call(move || async move {
            let found = match source.query(&text).await {
                Ok(list) => list,
                Err(e) => {
                    tracing::warn!("Airport lookup failed for {text:?}: {e:#}");
                    Vec::new()
                }
            };
            if gate.admit(ticket).is_ok() {
                *suggestions.lock().expect("suggestions lock poisoned") = found;
            } else {
                tracing::debug!("Discarding superseded lookup response for {text:?}");
            }
        });
    }

    /// Current committed suggestions.
    pub fn suggestions(&self) -> Vec<Airport> {
        self.suggestions
            .lock()
            .expect("suggestions lock poisoned")
            .clone()
    }

    /// One-shot resolution for non-interactive surfaces: queries the source
    /// directly (no debounce) and selects the first match.
    pub async fn resolve(&mut self, text: &str) -> Result<Option<Airport>> {
        let matches = self.source.query(text).await?;
        let Some(airport) = matches.into_iter().next() else {
            return Ok(None);
        };
        self.select(&airport)?;
        Ok(Some(airport))
    }

    /// Record a selection: suggestions are cleared, the recents list is
    /// updated and written through to the local store.
    pub fn select(&mut self, airport: &Airport) -> Result<()> {
        self.suggestions
            .lock()
            .expect("suggestions lock poisoned")
            .clear();
        self.recents.record(airport.clone());
        self.store.save_recent_airports(self.recents.entries())?;
        Ok(())
    }

    pub fn recents(&self) -> &[Airport] {
        self.recents.entries()
    }
}

/// Test fixture shared by unit tests across modules.
#[cfg(test)]
pub(crate) fn test_airport(sky_id: &str, entity_id: &str) -> Airport {
    Airport {
        sky_id: sky_id.to_string(),
        entity_id: entity_id.to_string(),
        presentation: AirportPresentation {
            title: format!("{sky_id} Airport"),
            suggestion_title: format!("{sky_id} ({entity_id})"),
            subtitle: "United States".to_string(),
        },
        navigation: AirportNavigation {
            entity_id: entity_id.to_string(),
            relevant_flight_params: RelevantFlightParams {
                sky_id: sky_id.to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airport(sky_id: &str, entity_id: &str) -> Airport {
        test_airport(sky_id, entity_id)
    }

    #[test]
    fn recents_are_bounded_and_newest_first() {
        let mut recents = RecentAirports::new();
        for i in 0..7 {
            recents.record(airport(&format!("A{i}"), &format!("e{i}")));
        }
        assert_eq!(recents.len(), RECENT_LIMIT);
        assert_eq!(recents.entries()[0].sky_id, "A6");
        assert_eq!(recents.entries()[RECENT_LIMIT - 1].sky_id, "A2");
    }

    #[test]
    fn reselection_moves_to_front_without_growing() {
        let mut recents = RecentAirports::new();
        recents.record(airport("JFK", "e-jfk"));
        recents.record(airport("LAX", "e-lax"));
        recents.record(airport("JFK", "e-jfk"));

        assert_eq!(recents.len(), 2);
        assert_eq!(recents.entries()[0].sky_id, "JFK");
        assert_eq!(recents.entries()[1].sky_id, "LAX");
    }

    #[test]
    fn load_truncates_oversized_history() {
        let entries: Vec<Airport> = (0..9)
            .map(|i| airport(&format!("B{i}"), &format!("x{i}")))
            .collect();
        let recents = RecentAirports::from_entries(entries);
        assert_eq!(recents.len(), RECENT_LIMIT);
    }
}
