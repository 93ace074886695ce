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

//! Recent-airport history invariants and their persistence through the
//! local store.
//!
//! Run with:
//!     cargo test --test t_recent_airports

use std::collections::BTreeSet;
use std::path::PathBuf;

use skylark_flight_search::{
    Airport, AirportNavigation, AirportPresentation, LocalStore, RECENT_LIMIT, RecentAirports,
    RelevantFlightParams, Theme,
};

fn airport(sky_id: &str, entity_id: &str) -> Airport {
    Airport {
        sky_id: sky_id.to_string(),
        entity_id: entity_id.to_string(),
        presentation: AirportPresentation {
            title: format!("{sky_id} Airport"),
            suggestion_title: format!("{sky_id} Intl"),
            subtitle: "Somewhere".to_string(),
        },
        navigation: AirportNavigation {
            entity_id: format!("nav-{entity_id}"),
            relevant_flight_params: RelevantFlightParams {
                sky_id: sky_id.to_string(),
            },
        },
    }
}

fn temp_store(tag: &str) -> LocalStore {
    let path: PathBuf = std::env::temp_dir().join(format!(
        "skylark-recents-{tag}-{}.json",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    LocalStore::open(path)
}

/// Walk a long random-ish selection sequence; the bound and the no-duplicate
/// invariant must hold after every step.
#[test]
fn history_invariants_hold_under_any_selection_sequence() {
    let pool: Vec<Airport> = ["JFK", "LAX", "LHR", "CDG", "NRT", "SFO", "ORD", "DXB"]
        .iter()
        .enumerate()
        .map(|(i, code)| airport(code, &format!("e{i}")))
        .collect();

    let mut recents = RecentAirports::new();
    let mut state = 0x9E3779B97F4A7C15u64;

    for step in 0..500 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let pick = &pool[(state % pool.len() as u64) as usize];
        recents.record(pick.clone());

        assert!(recents.len() <= RECENT_LIMIT, "bound broken at step {step}");
        let ids: BTreeSet<&str> = recents
            .entries()
            .iter()
            .map(|a| a.entity_id.as_str())
            .collect();
        assert_eq!(ids.len(), recents.len(), "duplicate at step {step}");
        assert_eq!(recents.entries()[0].entity_id, pick.entity_id);
    }
}

#[test]
fn reselection_moves_to_front_without_growth() {
    let mut recents = RecentAirports::new();
    for (i, code) in ["JFK", "LAX", "LHR"].iter().enumerate() {
        recents.record(airport(code, &format!("e{i}")));
    }
    let before = recents.len();

    recents.record(airport("JFK", "e0"));
    assert_eq!(recents.len(), before);
    assert_eq!(recents.entries()[0].sky_id, "JFK");
    assert_eq!(recents.entries()[1].sky_id, "LHR");
    assert_eq!(recents.entries()[2].sky_id, "LAX");
}

/// The list survives a store round trip in order, and oversized persisted
/// content is clamped on load.
#[test]
fn history_persists_through_the_local_store() {
    let store = temp_store("roundtrip");

    let mut recents = RecentAirports::new();
    for (i, code) in ["JFK", "LAX", "LHR", "CDG"].iter().enumerate() {
        recents.record(airport(code, &format!("e{i}")));
    }
    store.save_recent_airports(recents.entries()).unwrap();

    // A fresh mount re-reads the same list, newest first.
    let reloaded = RecentAirports::from_entries(store.recent_airports());
    assert_eq!(reloaded.entries(), recents.entries());
    assert_eq!(reloaded.entries()[0].sky_id, "CDG");

    let _ = std::fs::remove_file(store.path());
}

#[test]
fn oversized_persisted_lists_are_clamped_on_load() {
    let store = temp_store("clamp");
    let oversized: Vec<Airport> = (0..9)
        .map(|i| airport(&format!("A{i}"), &format!("x{i}")))
        .collect();
    store.save_recent_airports(&oversized).unwrap();

    let reloaded = RecentAirports::from_entries(store.recent_airports());
    assert_eq!(reloaded.len(), RECENT_LIMIT);
    assert_eq!(reloaded.entries()[0].sky_id, "A0");

    let _ = std::fs::remove_file(store.path());
}

/// The theme flag shares the file without disturbing the history.
#[test]
fn theme_and_history_share_the_state_file() {
    let store = temp_store("shared");

    store.save_theme(Theme::Dark).unwrap();
    store
        .save_recent_airports(&[airport("JFK", "e0"), airport("LAX", "e1")])
        .unwrap();
    store.save_theme(Theme::Light).unwrap();

    assert_eq!(store.theme(), Theme::Light);
    assert_eq!(store.recent_airports().len(), 2);

    let _ = std::fs::remove_file(store.path());
}
