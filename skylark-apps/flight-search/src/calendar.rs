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

//! # Date/Price Calendar
//!
//! Open/closed calendar state with per-day indicative prices and the
//! departure/return selection policy. The query store is the single source
//! of truth for selected dates, so closing and re-opening loses nothing.
//! Prices are advisory display data and never block a selection.

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::query_state::FlightQuery;

/// How many consecutive months are rendered at once.
pub const VISIBLE_MONTHS: usize = 2;

/// Per-day indicative prices for one route, as returned by the
/// price-calendar endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCalendarData {
    pub flights: CalendarFlights,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarFlights {
    #[serde(default)]
    pub days: Vec<DayPrice>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPrice {
    pub day: NaiveDate,
    pub group: Option<String>,
    pub price: f64,
}

/// Identifies one price-calendar fetch: route plus visible month. A new
/// key means a new fetch; anything else reuses what is already loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceFetchKey {
    pub origin_sky_id: String,
    pub destination_sky_id: String,
    pub month: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    Closed,
    Open,
}

/// Calendar widget state. Dates live in the [`FlightQuery`]; this tracks
/// visibility, the visible month window and the advisory price map.
#[derive(Debug, Clone)]
pub struct Calendar {
    visibility: Visibility,
    today: NaiveDate,
    visible_month: NaiveDate,
    prices: HashMap<NaiveDate, f64>,
}

impl Calendar {
    /// `today` anchors the no-past-month boundary; surfaces pass the local
    /// date, tests pass a fixed one.
    pub fn new(today: NaiveDate) -> Self {
        let visible_month = first_of_month(today);
        Self {
            visibility: Visibility::Closed,
            today,
            visible_month,
            prices: HashMap::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.visibility == Visibility::Open
    }

    /// Open the calendar. Returns the fetch key for the visible window when
    /// both route endpoints are known; the caller performs the fetch and
    /// feeds the result back through [`Calendar::set_prices`].
    pub fn open(&mut self, query: &FlightQuery) -> Option<PriceFetchKey> {
        self.visibility = Visibility::Open;
        self.price_fetch_key(query)
    }

    pub fn close(&mut self) {
        self.visibility = Visibility::Closed;
    }

    pub fn price_fetch_key(&self, query: &FlightQuery) -> Option<PriceFetchKey> {
        let origin = query.origin_airport.as_ref()?;
        let destination = query.destination_airport.as_ref()?;
        Some(PriceFetchKey {
            origin_sky_id: origin.sky_id.clone(),
            destination_sky_id: destination.sky_id.clone(),
            month: self.visible_month,
        })
    }

    /// Replace the advisory price map. Failures upstream simply produce an
    /// empty map; selection never depends on it.
    pub fn set_prices(&mut self, days: &[DayPrice]) {
        self.prices = days.iter().map(|d| (d.day, d.price)).collect();
    }

    pub fn clear_prices(&mut self) {
        self.prices.clear();
    }

    pub fn price_on(&self, day: NaiveDate) -> Option<f64> {
        self.prices.get(&day).copied()
    }

    /// First days of the currently visible months, leftmost first.
    pub fn visible_months(&self) -> [NaiveDate; VISIBLE_MONTHS] {
        let next = self
            .visible_month
            .checked_add_months(Months::new(1))
            .unwrap_or(self.visible_month);
        [self.visible_month, next]
    }

    /// Whether the previous-month action is available. Months strictly
    /// before the current month are unreachable.
    pub fn can_go_prev(&self) -> bool {
        self.visible_month > first_of_month(self.today)
    }

    /// Step back one month; no-op at the current-month boundary.
    pub fn prev_month(&mut self) -> bool {
        if !self.can_go_prev() {
            return false;
        }
        if let Some(prev) = self.visible_month.checked_sub_months(Months::new(1)) {
            self.visible_month = prev;
            return true;
        }
        false
    }

    pub fn next_month(&mut self) {
        if let Some(next) = self.visible_month.checked_add_months(Months::new(1)) {
            self.visible_month = next;
        }
    }

    /// Apply one calendar click to the query store.
    ///
    /// One-way: the click sets the single date and drops any return date.
    /// Round-trip: with zero or two dates already selected a new single-date
    /// selection starts; with exactly one, the earlier of the two becomes
    /// the departure and the later the return, regardless of click order.
    pub fn select(query: &mut FlightQuery, clicked: NaiveDate) {
        if !query.round_trip {
            query.date = Some(clicked);
            query.return_date = None;
            return;
        }
        match (query.date, query.return_date) {
            (Some(start), None) => {
                if clicked < start {
                    query.date = Some(clicked);
                    query.return_date = Some(start);
                } else {
                    query.return_date = Some(clicked);
                }
            }
            _ => {
                query.date = Some(clicked);
                query.return_date = None;
            }
        }
    }

    /// The reset action: clears both dates.
    pub fn reset(query: &mut FlightQuery) {
        query.date = None;
        query.return_date = None;
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}
