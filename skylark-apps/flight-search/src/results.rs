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

//! # Search Results Wire Model
//!
//! Deserialized shape of the itinerary-search response. Everything here is
//! externally sourced and read-only: itineraries are filtered and
//! displayed, never mutated. The ordering of the itinerary list is the
//! upstream sortBy ordering and is preserved as-is.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchResponse {
    pub status: bool,
    pub timestamp: Option<i64>,
    pub session_id: Option<String>,
    pub data: Option<SearchData>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub context: Option<SearchContext>,
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
    pub filter_stats: Option<FilterStats>,
    pub flights_session_id: Option<String>,
    pub destination_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchContext {
    pub status: Option<String>,
    pub session_id: Option<String>,
    pub total_results: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub id: String,
    pub price: Price,
    #[serde(default)]
    pub legs: Vec<Leg>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub score: Option<f64>,
    #[serde(default)]
    pub is_self_transfer: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub raw: f64,
    pub formatted: String,
    pub pricing_option_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub id: String,
    pub origin: FlightPlace,
    pub destination: FlightPlace,
    pub duration_in_minutes: u32,
    pub stop_count: u32,
    /// ISO timestamp; only the date part and the time-of-day are used.
    pub departure: String,
    pub arrival: String,
    #[serde(default)]
    pub time_delta_in_days: i32,
    pub carriers: Carriers,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Leg {
    /// Date-only portion of the departure timestamp.
    pub fn departure_date(&self) -> &str {
        self.departure.split('T').next().unwrap_or(&self.departure)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightPlace {
    pub id: String,
    pub entity_id: Option<String>,
    pub name: String,
    pub display_code: String,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Carriers {
    #[serde(default)]
    pub marketing: Vec<Carrier>,
    #[serde(default)]
    pub operating: Vec<Carrier>,
    pub operation_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    pub id: i32,
    pub name: String,
    pub alternate_id: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub origin: SegmentPlace,
    pub destination: SegmentPlace,
    pub departure: String,
    pub arrival: String,
    pub duration_in_minutes: u32,
    pub flight_number: String,
    pub marketing_carrier: SegmentCarrier,
    pub operating_carrier: Option<SegmentCarrier>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPlace {
    pub flight_place_id: String,
    pub display_code: String,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentCarrier {
    pub id: i32,
    pub name: String,
    pub alternate_id: Option<String>,
    pub display_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStats {
    pub duration: Option<DurationStats>,
    #[serde(default)]
    pub carriers: Vec<Carrier>,
    #[serde(default)]
    pub airports: Vec<CityAirports>,
    pub stop_prices: Option<StopPrices>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationStats {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityAirports {
    pub city: String,
    #[serde(default)]
    pub airports: Vec<AirportRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportRef {
    pub id: String,
    pub entity_id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPrices {
    pub direct: Option<StopPrice>,
    pub one: Option<StopPrice>,
    pub two_or_more: Option<StopPrice>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPrice {
    #[serde(default)]
    pub is_present: bool,
    pub formatted_price: Option<String>,
}

/// The validated payload of one search: session identifier plus the
/// itinerary list in upstream order.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub session_id: String,
    pub itineraries: Vec<Itinerary>,
    pub filter_stats: Option<FilterStats>,
}

impl SearchOutcome {
    pub fn len(&self) -> usize {
        self.itineraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itineraries.is_empty()
    }
}

impl FlightSearchResponse {
    /// Unwrap the envelope, requiring a success status, a payload, and a
    /// session identifier (top-level, with the context one as fallback).
    pub fn into_outcome(self) -> Result<SearchOutcome> {
        ensure!(self.status, "Search API reported failure status");
        let data = self.data.context("Search response carries no data")?;
        let session_id = self
            .session_id
            .or_else(|| data.context.as_ref().and_then(|c| c.session_id.clone()))
            .context("Search response carries no session id")?;
        Ok(SearchOutcome {
            session_id,
            itineraries: data.itineraries,
            filter_stats: data.filter_stats,
        })
    }
}
