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

//! # Results Filtering Pipeline
//!
//! Side-effect free filtering over an already-fetched itinerary list:
//! derived price/duration bounds, the four-predicate filter, and the
//! progressive-reveal window. Criteria changes recompute synchronously and
//! never re-fetch; upstream ordering is never re-sorted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::results::Itinerary;

/// Bounds fallback when no itinerary data is loaded.
pub const PRICE_FALLBACK: (f64, f64) = (0.0, 5000.0);
pub const DURATION_FALLBACK: (u32, u32) = (0, 1440);

/// Progressive reveal: initial window size and per-action increment.
pub const INITIAL_VISIBLE: usize = 3;
pub const REVEAL_STEP: usize = 5;

/// Min/max of price (raw) and leg duration over one itinerary list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub price: (f64, f64),
    pub duration: (u32, u32),
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            price: PRICE_FALLBACK,
            duration: DURATION_FALLBACK,
        }
    }
}

impl Bounds {
    /// Compute bounds over a list; an empty list keeps the fallbacks.
    pub fn of(itineraries: &[Itinerary]) -> Self {
        let mut bounds = Self::default();

        let mut prices = itineraries.iter().map(|it| it.price.raw);
        if let Some(first) = prices.next() {
            let (lo, hi) = prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
            bounds.price = (lo, hi);
        }

        let mut durations = itineraries
            .iter()
            .flat_map(|it| it.legs.iter().map(|leg| leg.duration_in_minutes));
        if let Some(first) = durations.next() {
            let (lo, hi) = durations.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
            bounds.duration = (lo, hi);
        }

        bounds
    }
}

/// User-adjustable filter state. Empty stop/airline sets mean
/// "no constraint": everything passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub price_range: (f64, f64),
    pub duration_range: (u32, u32),
    pub selected_stops: BTreeSet<u32>,
    pub selected_airlines: BTreeSet<i32>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self::from_bounds(&Bounds::default())
    }
}

impl FilterCriteria {
    pub fn from_bounds(bounds: &Bounds) -> Self {
        Self {
            price_range: bounds.price,
            duration_range: bounds.duration,
            selected_stops: BTreeSet::new(),
            selected_airlines: BTreeSet::new(),
        }
    }

    /// Snap both active ranges back to the full bounds. Stop and airline
    /// selections are left alone; only the ranges follow the list.
    pub fn reset_ranges(&mut self, bounds: &Bounds) {
        self.price_range = bounds.price;
        self.duration_range = bounds.duration;
    }

    /// The filter predicate: all four conditions must hold.
    pub fn matches(&self, itinerary: &Itinerary) -> bool {
        let (price_lo, price_hi) = self.price_range;
        let price_ok = itinerary.price.raw >= price_lo && itinerary.price.raw <= price_hi;

        let (dur_lo, dur_hi) = self.duration_range;
        let duration_ok = itinerary
            .legs
            .iter()
            .all(|leg| leg.duration_in_minutes >= dur_lo && leg.duration_in_minutes <= dur_hi);

        let stops_ok = self.selected_stops.is_empty()
            || itinerary
                .legs
                .iter()
                .any(|leg| self.selected_stops.contains(&leg.stop_count));

        let airlines_ok = self.selected_airlines.is_empty()
            || itinerary.legs.iter().any(|leg| {
                leg.carriers
                    .marketing
                    .iter()
                    .any(|carrier| self.selected_airlines.contains(&carrier.id))
            });

        price_ok && duration_ok && stops_ok && airlines_ok
    }

    /// Filter a list, preserving the upstream order.
    pub fn apply<'a>(&self, itineraries: &'a [Itinerary]) -> Vec<&'a Itinerary> {
        itineraries.iter().filter(|it| self.matches(it)).collect()
    }
}

/// The stateful pipeline backing a results view: one itinerary list, its
/// bounds, the active criteria, and the reveal window.
#[derive(Debug, Clone)]
pub struct ResultsPipeline {
    itineraries: Vec<Itinerary>,
    bounds: Bounds,
    criteria: FilterCriteria,
    revealed: usize,
}

impl ResultsPipeline {
    pub fn new(itineraries: Vec<Itinerary>) -> Self {
        let bounds = Bounds::of(&itineraries);
        Self {
            criteria: FilterCriteria::from_bounds(&bounds),
            bounds,
            itineraries,
            revealed: INITIAL_VISIBLE,
        }
    }

    /// Swap in a freshly fetched list: bounds are recomputed, the active
    /// ranges snap to them, and the reveal window restarts.
    pub fn replace(&mut self, itineraries: Vec<Itinerary>) {
        self.bounds = Bounds::of(&itineraries);
        self.criteria.reset_ranges(&self.bounds);
        self.itineraries = itineraries;
        self.revealed = INITIAL_VISIBLE;
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn itineraries(&self) -> &[Itinerary] {
        &self.itineraries
    }

    pub fn set_price_range(&mut self, lo: f64, hi: f64) {
        self.criteria.price_range = (lo, hi);
    }

    pub fn set_duration_range(&mut self, lo: u32, hi: u32) {
        self.criteria.duration_range = (lo, hi);
    }

    /// Checkbox semantics: present is removed, absent is inserted.
    pub fn toggle_stop(&mut self, stop_count: u32) {
        if !self.criteria.selected_stops.remove(&stop_count) {
            self.criteria.selected_stops.insert(stop_count);
        }
    }

    pub fn toggle_airline(&mut self, carrier_id: i32) {
        if !self.criteria.selected_airlines.remove(&carrier_id) {
            self.criteria.selected_airlines.insert(carrier_id);
        }
    }

    pub fn filtered(&self) -> Vec<&Itinerary> {
        self.criteria.apply(&self.itineraries)
    }

    /// The currently revealed slice of the filtered list.
    pub fn visible(&self) -> Vec<&Itinerary> {
        let mut filtered = self.filtered();
        filtered.truncate(self.revealed);
        filtered
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn has_more(&self) -> bool {
        self.filtered().len() > self.revealed
    }

    /// One reveal action: grow the window by the fixed increment.
    pub fn show_more(&mut self) {
        self.revealed += REVEAL_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{Carrier, Carriers, FlightPlace, Leg, Price};

    fn place(code: &str) -> FlightPlace {
        FlightPlace {
            id: code.to_string(),
            entity_id: None,
            name: code.to_string(),
            display_code: code.to_string(),
            city: None,
            country: None,
        }
    }

    fn leg(duration: u32, stops: u32, carrier_ids: &[i32]) -> Leg {
        Leg {
            id: format!("leg-{duration}-{stops}"),
            origin: place("JFK"),
            destination: place("LAX"),
            duration_in_minutes: duration,
            stop_count: stops,
            departure: "2025-06-01T08:15:00".to_string(),
            arrival: "2025-06-01T11:27:00".to_string(),
            time_delta_in_days: 0,
            carriers: Carriers {
                marketing: carrier_ids
                    .iter()
                    .map(|id| Carrier {
                        id: *id,
                        name: format!("Carrier {id}"),
                        alternate_id: None,
                        logo_url: None,
                    })
                    .collect(),
                operating: Vec::new(),
                operation_type: None,
            },
            segments: Vec::new(),
        }
    }

    fn itinerary(id: &str, price: f64, legs: Vec<Leg>) -> Itinerary {
        Itinerary {
            id: id.to_string(),
            price: Price {
                raw: price,
                formatted: format!("${price:.0}"),
                pricing_option_id: None,
            },
            legs,
            tags: Vec::new(),
            score: None,
            is_self_transfer: false,
        }
    }

    #[test]
    fn bounds_track_the_list_and_fall_back_when_empty() {
        assert_eq!(Bounds::of(&[]), Bounds::default());

        let list = vec![
            itinerary("a", 120.0, vec![leg(300, 0, &[1])]),
            itinerary("b", 450.0, vec![leg(500, 1, &[2])]),
            itinerary("c", 300.0, vec![leg(410, 2, &[3])]),
        ];
        let bounds = Bounds::of(&list);
        assert_eq!(bounds.price, (120.0, 450.0));
        assert_eq!(bounds.duration, (300, 500));
    }

    #[test]
    fn price_range_excludes_out_of_range_itineraries() {
        let list = vec![
            itinerary("a", 120.0, vec![leg(300, 0, &[1])]),
            itinerary("b", 450.0, vec![leg(310, 0, &[1])]),
            itinerary("c", 300.0, vec![leg(320, 0, &[1])]),
        ];
        let mut pipeline = ResultsPipeline::new(list);
        pipeline.set_price_range(100.0, 350.0);

        let kept: Vec<&str> = pipeline.filtered().iter().map(|it| it.id.as_str()).collect();
        assert_eq!(kept, vec!["a", "c"]);
    }

    #[test]
    fn duration_must_hold_for_every_leg() {
        let both_short = itinerary("a", 200.0, vec![leg(300, 0, &[1]), leg(320, 0, &[1])]);
        let one_long = itinerary("b", 200.0, vec![leg(300, 0, &[1]), leg(700, 0, &[1])]);
        let mut pipeline = ResultsPipeline::new(vec![both_short, one_long]);
        pipeline.set_duration_range(250, 400);

        let kept: Vec<&str> = pipeline.filtered().iter().map(|it| it.id.as_str()).collect();
        assert_eq!(kept, vec!["a"]);
    }

    #[test]
    fn stop_and_airline_filters_need_only_one_matching_leg() {
        let list = vec![
            itinerary("nonstop", 200.0, vec![leg(300, 0, &[10]), leg(310, 1, &[11])]),
            itinerary("two-stop", 220.0, vec![leg(400, 2, &[12])]),
        ];
        let mut pipeline = ResultsPipeline::new(list);

        pipeline.toggle_stop(0);
        let kept: Vec<&str> = pipeline.filtered().iter().map(|it| it.id.as_str()).collect();
        assert_eq!(kept, vec!["nonstop"]);

        // Unchecking restores "no constraint".
        pipeline.toggle_stop(0);
        assert_eq!(pipeline.filtered().len(), 2);

        pipeline.toggle_airline(12);
        let kept: Vec<&str> = pipeline.filtered().iter().map(|it| it.id.as_str()).collect();
        assert_eq!(kept, vec!["two-stop"]);
    }

    #[test]
    fn replacing_the_list_resets_ranges_and_window() {
        let mut pipeline = ResultsPipeline::new(vec![
            itinerary("a", 100.0, vec![leg(300, 0, &[1])]),
            itinerary("b", 900.0, vec![leg(600, 0, &[1])]),
        ]);
        pipeline.set_price_range(100.0, 150.0);
        for _ in 0..3 {
            pipeline.show_more();
        }

        pipeline.replace(vec![
            itinerary("c", 250.0, vec![leg(350, 0, &[1])]),
            itinerary("d", 400.0, vec![leg(450, 0, &[1])]),
        ]);

        assert_eq!(pipeline.criteria().price_range, (250.0, 400.0));
        assert_eq!(pipeline.criteria().duration_range, (350, 450));
        assert_eq!(pipeline.revealed(), INITIAL_VISIBLE);
        assert_eq!(pipeline.filtered().len(), 2);
    }

    #[test]
    fn reveal_grows_in_fixed_steps() {
        let list: Vec<Itinerary> = (0..12)
            .map(|i| itinerary(&format!("it-{i}"), 100.0 + i as f64, vec![leg(300, 0, &[1])]))
            .collect();
        let mut pipeline = ResultsPipeline::new(list);

        assert_eq!(pipeline.visible().len(), INITIAL_VISIBLE);
        assert!(pipeline.has_more());

        pipeline.show_more();
        assert_eq!(pipeline.visible().len(), INITIAL_VISIBLE + REVEAL_STEP);

        pipeline.show_more();
        assert_eq!(pipeline.visible().len(), 12);
        assert!(!pipeline.has_more());
    }
}
