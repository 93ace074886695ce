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

//! Property-style sweeps over the results filtering pipeline.
//!
//! Tests that filtering is exactly the four-predicate subset over randomly
//! generated itinerary lists, and that bounds derivation resets the active
//! ranges idempotently. The generator is a deterministic xorshift so runs
//! are reproducible.
//!
//! Run with:
//!     cargo test --test t_filter_properties

use std::collections::BTreeSet;

use skylark_flight_search::{
    Bounds, Carrier, Carriers, DURATION_FALLBACK, FilterCriteria, FlightPlace, Itinerary, Leg,
    PRICE_FALLBACK, Price, ResultsPipeline,
};

/// Deterministic xorshift64* generator.
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    fn in_range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next() % (hi - lo + 1)
    }
}

const CARRIER_POOL: &[i32] = &[-32171, -32573, -31722, -30598, -32456, -31669];

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

fn generated_leg(rng: &mut Rng, index: usize) -> Leg {
    let carrier_count = rng.in_range(1, 2) as usize;
    let marketing = (0..carrier_count)
        .map(|_| {
            let id = CARRIER_POOL[rng.in_range(0, CARRIER_POOL.len() as u64 - 1) as usize];
            Carrier {
                id,
                name: format!("Carrier {id}"),
                alternate_id: None,
                logo_url: None,
            }
        })
        .collect();

    Leg {
        id: format!("leg-{index}"),
        origin: place("JFK"),
        destination: place("LAX"),
        duration_in_minutes: rng.in_range(60, 1200) as u32,
        stop_count: rng.in_range(0, 3) as u32,
        departure: "2025-06-01T08:15:00".to_string(),
        arrival: "2025-06-01T14:15:00".to_string(),
        time_delta_in_days: 0,
        carriers: Carriers {
            marketing,
            operating: Vec::new(),
            operation_type: None,
        },
        segments: Vec::new(),
    }
}

fn generated_itinerary(rng: &mut Rng, index: usize) -> Itinerary {
    let leg_count = rng.in_range(1, 2) as usize;
    let price = rng.in_range(50, 1500) as f64;
    Itinerary {
        id: format!("it-{index}"),
        price: Price {
            raw: price,
            formatted: format!("${price:.0}"),
            pricing_option_id: None,
        },
        legs: (0..leg_count)
            .map(|l| generated_leg(rng, index * 10 + l))
            .collect(),
        tags: Vec::new(),
        score: None,
        is_self_transfer: false,
    }
}

fn generated_list(rng: &mut Rng, len: usize) -> Vec<Itinerary> {
    (0..len).map(|i| generated_itinerary(rng, i)).collect()
}

/// The four predicates, written out independently of the implementation.
fn reference_predicate(criteria: &FilterCriteria, itinerary: &Itinerary) -> bool {
    let price_ok = itinerary.price.raw >= criteria.price_range.0
        && itinerary.price.raw <= criteria.price_range.1;
    let duration_ok = itinerary.legs.iter().all(|leg| {
        leg.duration_in_minutes >= criteria.duration_range.0
            && leg.duration_in_minutes <= criteria.duration_range.1
    });
    let stops_ok = criteria.selected_stops.is_empty()
        || itinerary
            .legs
            .iter()
            .any(|leg| criteria.selected_stops.contains(&leg.stop_count));
    let airlines_ok = criteria.selected_airlines.is_empty()
        || itinerary.legs.iter().any(|leg| {
            leg.carriers
                .marketing
                .iter()
                .any(|c| criteria.selected_airlines.contains(&c.id))
        });
    price_ok && duration_ok && stops_ok && airlines_ok
}

fn generated_criteria(rng: &mut Rng) -> FilterCriteria {
    let price_lo = rng.in_range(0, 800) as f64;
    let price_hi = price_lo + rng.in_range(0, 900) as f64;
    let dur_lo = rng.in_range(0, 600) as u32;
    let dur_hi = dur_lo + rng.in_range(0, 800) as u32;

    let mut selected_stops = BTreeSet::new();
    for stop in 0..=3u32 {
        if rng.in_range(0, 2) == 0 {
            selected_stops.insert(stop);
        }
    }
    let mut selected_airlines = BTreeSet::new();
    for id in CARRIER_POOL {
        if rng.in_range(0, 3) == 0 {
            selected_airlines.insert(*id);
        }
    }

    FilterCriteria {
        price_range: (price_lo, price_hi),
        duration_range: (dur_lo, dur_hi),
        selected_stops,
        selected_airlines,
    }
}

/// Filtering equals the reference subset for many random lists/criteria.
#[test]
fn filter_is_exactly_the_predicate_subset() {
    let mut rng = Rng::new(0xC0FFEE);

    for round in 0..50 {
        let list = generated_list(&mut rng, 40);
        let criteria = generated_criteria(&mut rng);

        let filtered: Vec<&str> = criteria
            .apply(&list)
            .iter()
            .map(|it| it.id.as_str())
            .collect();
        let expected: Vec<&str> = list
            .iter()
            .filter(|it| reference_predicate(&criteria, it))
            .map(|it| it.id.as_str())
            .collect();

        assert_eq!(filtered, expected, "round {round} diverged");
    }
    println!("50 random list/criteria rounds match the reference subset - OK");
}

/// Empty stop/airline sets mean "no constraint" when the ranges span the
/// whole list.
#[test]
fn unconstrained_criteria_pass_everything() {
    let mut rng = Rng::new(42);
    let list = generated_list(&mut rng, 30);
    let criteria = FilterCriteria::from_bounds(&Bounds::of(&list));
    assert_eq!(criteria.apply(&list).len(), list.len());
}

/// New-list bounds reset the active ranges to the exact min/max, and doing
/// it twice changes nothing.
#[test]
fn replacing_the_list_resets_ranges_idempotently() {
    let mut rng = Rng::new(7);
    let first = generated_list(&mut rng, 25);
    let second = generated_list(&mut rng, 25);

    let expected_price = second
        .iter()
        .map(|it| it.price.raw)
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p), hi.max(p)));
    let expected_duration = second
        .iter()
        .flat_map(|it| it.legs.iter().map(|l| l.duration_in_minutes))
        .fold((u32::MAX, u32::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)));

    let mut pipeline = ResultsPipeline::new(first);
    pipeline.set_price_range(100.0, 101.0);
    pipeline.set_duration_range(90, 91);

    pipeline.replace(second.clone());
    assert_eq!(pipeline.criteria().price_range, expected_price);
    assert_eq!(pipeline.criteria().duration_range, expected_duration);

    // Reset twice = reset once.
    let after_first = pipeline.criteria().clone();
    pipeline.replace(second);
    assert_eq!(pipeline.criteria(), &after_first);
}

/// An empty list keeps the documented fallback bounds.
#[test]
fn empty_list_keeps_fallback_bounds() {
    let bounds = Bounds::of(&[]);
    assert_eq!(bounds.price, PRICE_FALLBACK);
    assert_eq!(bounds.duration, DURATION_FALLBACK);
}

/// The worked example: prices [120, 450, 300] with range [100, 350].
#[test]
fn price_window_excludes_the_450_itinerary() {
    let mut rng = Rng::new(99);
    let mut list = generated_list(&mut rng, 3);
    list[0].price.raw = 120.0;
    list[1].price.raw = 450.0;
    list[2].price.raw = 300.0;

    let mut criteria = FilterCriteria::from_bounds(&Bounds::of(&list));
    criteria.price_range = (100.0, 350.0);

    let kept: Vec<&str> = criteria.apply(&list).iter().map(|it| it.id.as_str()).collect();
    assert_eq!(kept, vec!["it-0", "it-2"]);
}

/// Range ends are inclusive on both sides.
#[test]
fn range_ends_are_inclusive() {
    let mut rng = Rng::new(3);
    let list = generated_list(&mut rng, 10);
    let bounds = Bounds::of(&list);

    // The full bounds themselves, used as ranges, must keep everything.
    let criteria = FilterCriteria::from_bounds(&bounds);
    assert_eq!(criteria.apply(&list).len(), list.len());
}
