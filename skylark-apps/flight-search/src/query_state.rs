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

//! # Query State
//!
//! The in-progress search criteria: partial updates, reset-to-defaults,
//! the search validity predicate, and the canonical query-string handoff
//! to the results view. No validation happens on update; the execute path
//! is the gate.

use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::airports::Airport;

/// Fare tier. Wire values follow the external API's option strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium-economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }
}

impl std::str::FromStr for CabinClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "economy" | "e" => Ok(CabinClass::Economy),
            "premium-economy" | "premium_economy" | "premium" | "pe" => {
                Ok(CabinClass::PremiumEconomy)
            }
            "business" | "b" => Ok(CabinClass::Business),
            "first" | "f" => Ok(CabinClass::First),
            _ => anyhow::bail!(
                "Invalid cabin class: {}. Use: economy, premium-economy, business, first",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassengerKind {
    Adults,
    Children,
    Infants,
}

static DEFAULT_QUERY: Lazy<FlightQuery> = Lazy::new(|| FlightQuery {
    origin_airport: None,
    destination_airport: None,
    date: None,
    return_date: None,
    cabin_class: CabinClass::Economy,
    adults: 1,
    children: 0,
    infants: 0,
    round_trip: true,
    sort_by: "best".to_string(),
    currency: "USD".to_string(),
    market: "en-US".to_string(),
    country_code: "US".to_string(),
});

/// The in-progress search criteria. One instance per session/surface; no
/// process-wide singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightQuery {
    pub origin_airport: Option<Airport>,
    pub destination_airport: Option<Airport>,
    pub date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub cabin_class: CabinClass,
    pub adults: u32,
    // The external API spells this parameter "childrens"; kept on the JSON
    // surface for parity with the wire.
    #[serde(rename = "childrens")]
    pub children: u32,
    pub infants: u32,
    pub round_trip: bool,
    pub sort_by: String,
    pub currency: String,
    pub market: String,
    pub country_code: String,
}

impl Default for FlightQuery {
    fn default() -> Self {
        DEFAULT_QUERY.clone()
    }
}

/// Partial update for [`FlightQuery::apply`]. Unset fields leave the query
/// untouched; the date fields take `Some(None)` to clear.
#[derive(Debug, Clone, Default)]
pub struct QueryPatch {
    pub origin_airport: Option<Airport>,
    pub destination_airport: Option<Airport>,
    pub date: Option<Option<NaiveDate>>,
    pub return_date: Option<Option<NaiveDate>>,
    pub cabin_class: Option<CabinClass>,
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub infants: Option<u32>,
    pub round_trip: Option<bool>,
    pub sort_by: Option<String>,
    pub currency: Option<String>,
    pub market: Option<String>,
    pub country_code: Option<String>,
}

impl FlightQuery {
    /// Merge a partial update, preserving unspecified fields.
    pub fn apply(&mut self, patch: QueryPatch) {
        if let Some(airport) = patch.origin_airport {
            self.origin_airport = Some(airport);
        }
        if let Some(airport) = patch.destination_airport {
            self.destination_airport = Some(airport);
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(return_date) = patch.return_date {
            self.return_date = return_date;
        }
        if let Some(cabin_class) = patch.cabin_class {
            self.cabin_class = cabin_class;
        }
        if let Some(adults) = patch.adults {
            self.adults = adults;
        }
        if let Some(children) = patch.children {
            self.children = children;
        }
        if let Some(infants) = patch.infants {
            self.infants = infants;
        }
        if let Some(round_trip) = patch.round_trip {
            self.round_trip = round_trip;
            if !round_trip {
                // One-way trips carry no return date.
                self.return_date = None;
            }
        }
        if let Some(sort_by) = patch.sort_by {
            self.sort_by = sort_by;
        }
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        if let Some(market) = patch.market {
            self.market = market;
        }
        if let Some(country_code) = patch.country_code {
            self.country_code = country_code;
        }
    }

    /// Restore the documented defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Step a passenger count up or down; decrements saturate at zero.
    pub fn adjust_passengers(&mut self, kind: PassengerKind, increment: bool) {
        let slot = match kind {
            PassengerKind::Adults => &mut self.adults,
            PassengerKind::Children => &mut self.children,
            PassengerKind::Infants => &mut self.infants,
        };
        *slot = if increment {
            *slot + 1
        } else {
            slot.saturating_sub(1)
        };
    }

    pub fn passenger_total(&self) -> u32 {
        self.adults + self.children + self.infants
    }

    /// The search validity predicate. Execution is a no-op unless this holds.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.origin_airport.is_some(), "Origin airport is required");
        ensure!(
            self.destination_airport.is_some(),
            "Destination airport is required"
        );
        ensure!(self.date.is_some(), "Departure date is required");
        if self.round_trip {
            ensure!(
                self.return_date.is_some(),
                "Return date is required for a round trip"
            );
        }
        ensure!(self.adults >= 1, "At least one adult is required");
        if let (Some(depart), Some(ret)) = (self.date, self.return_date) {
            ensure!(ret >= depart, "Return date cannot be before departure");
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// The canonical results-view parameters, in the fixed key order the
    /// views agreed on. `returnDate` is the empty string on one-way trips.
    pub fn to_search_params(&self) -> Result<Vec<(&'static str, String)>> {
        let origin = self
            .origin_airport
            .as_ref()
            .context("Origin airport is required")?;
        let destination = self
            .destination_airport
            .as_ref()
            .context("Destination airport is required")?;
        let date = self.date.context("Departure date is required")?;
        let return_date = if self.round_trip {
            self.return_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        } else {
            String::new()
        };

        Ok(vec![
            ("originSkyId", origin.sky_id.clone()),
            ("originEntityId", origin.navigation.entity_id.clone()),
            ("destinationSkyId", destination.sky_id.clone()),
            (
                "destinationEntityId",
                destination.navigation.entity_id.clone(),
            ),
            ("date", date.format("%Y-%m-%d").to_string()),
            ("returnDate", return_date),
            ("cabinClass", self.cabin_class.as_str().to_string()),
            ("adults", self.adults.to_string()),
            ("childrens", self.children.to_string()),
            ("infants", self.infants.to_string()),
            ("roundTrip", self.round_trip.to_string()),
            ("sortBy", self.sort_by.clone()),
            ("currency", self.currency.clone()),
            ("market", self.market.clone()),
            ("countryCode", self.country_code.clone()),
        ])
    }
}

/// Percent-encode key/value pairs into a query string, preserving order.
pub fn encode_query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Validity-gated handoff: the results-view query string, or `None` when
/// the query is incomplete (the action is a no-op). The search API call
/// itself happens in the results view, not here.
pub fn execute_search(query: &FlightQuery) -> Option<String> {
    if !query.is_valid() {
        return None;
    }
    let params = query.to_search_params().ok()?;
    Some(encode_query_string(&params))
}

/// A fully resolved search request, as carried by the results-view URL.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub origin_sky_id: String,
    pub origin_entity_id: String,
    pub destination_sky_id: String,
    pub destination_entity_id: String,
    pub date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub cabin_class: CabinClass,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub round_trip: bool,
    pub sort_by: String,
    pub currency: String,
    pub market: String,
    pub country_code: String,
}

fn pair<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

impl SearchRequest {
    pub fn from_query(query: &FlightQuery) -> Result<Self> {
        query.validate()?;
        let origin = query
            .origin_airport
            .as_ref()
            .context("Origin airport is required")?;
        let destination = query
            .destination_airport
            .as_ref()
            .context("Destination airport is required")?;

        Ok(Self {
            origin_sky_id: origin.sky_id.clone(),
            origin_entity_id: origin.navigation.entity_id.clone(),
            destination_sky_id: destination.sky_id.clone(),
            destination_entity_id: destination.navigation.entity_id.clone(),
            date: query.date.context("Departure date is required")?,
            return_date: query.return_date.filter(|_| query.round_trip),
            cabin_class: query.cabin_class,
            adults: query.adults,
            children: query.children,
            infants: query.infants,
            round_trip: query.round_trip,
            sort_by: query.sort_by.clone(),
            currency: query.currency.clone(),
            market: query.market.clone(),
            country_code: query.country_code.clone(),
        })
    }

    /// Parse the results-view query string. Optional fields fall back to
    /// the store defaults; empty values count as absent.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let defaults = FlightQuery::default();

        let date = pair(pairs, "date").context("Missing date parameter")?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").context("Invalid date parameter")?;
        let round_trip = pair(pairs, "roundTrip").map(|v| v == "true").unwrap_or(true);
        let return_date = match pair(pairs, "returnDate").filter(|_| round_trip) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .context("Invalid returnDate parameter")?,
            ),
            None => None,
        };

        Ok(Self {
            origin_sky_id: pair(pairs, "originSkyId")
                .context("Missing originSkyId parameter")?
                .to_string(),
            origin_entity_id: pair(pairs, "originEntityId")
                .context("Missing originEntityId parameter")?
                .to_string(),
            destination_sky_id: pair(pairs, "destinationSkyId")
                .context("Missing destinationSkyId parameter")?
                .to_string(),
            destination_entity_id: pair(pairs, "destinationEntityId")
                .context("Missing destinationEntityId parameter")?
                .to_string(),
            date,
            return_date,
            cabin_class: pair(pairs, "cabinClass")
                .map(str::parse)
                .transpose()?
                .unwrap_or(defaults.cabin_class),
            adults: pair(pairs, "adults")
                .map(str::parse)
                .transpose()
                .context("Invalid adults parameter")?
                .unwrap_or(defaults.adults),
            children: pair(pairs, "childrens")
                .map(str::parse)
                .transpose()
                .context("Invalid childrens parameter")?
                .unwrap_or(defaults.children),
            infants: pair(pairs, "infants")
                .map(str::parse)
                .transpose()
                .context("Invalid infants parameter")?
                .unwrap_or(defaults.infants),
            round_trip,
            sort_by: pair(pairs, "sortBy").unwrap_or(&defaults.sort_by).to_string(),
            currency: pair(pairs, "currency")
                .unwrap_or(&defaults.currency)
                .to_string(),
            market: pair(pairs, "market").unwrap_or(&defaults.market).to_string(),
            country_code: pair(pairs, "countryCode")
                .unwrap_or(&defaults.country_code)
                .to_string(),
        })
    }

    /// Parameters of the upstream itinerary-search call. `returnDate` is
    /// only sent for round trips that actually carry one.
    pub fn to_api_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("originSkyId", self.origin_sky_id.clone()),
            ("destinationSkyId", self.destination_sky_id.clone()),
            ("originEntityId", self.origin_entity_id.clone()),
            ("destinationEntityId", self.destination_entity_id.clone()),
            ("date", self.date.format("%Y-%m-%d").to_string()),
            ("cabinClass", self.cabin_class.as_str().to_string()),
            ("adults", self.adults.to_string()),
            ("childrens", self.children.to_string()),
            ("infants", self.infants.to_string()),
            ("sortBy", self.sort_by.clone()),
            ("currency", self.currency.clone()),
            ("market", self.market.clone()),
            ("countryCode", self.country_code.clone()),
        ];
        if self.round_trip {
            if let Some(return_date) = self.return_date {
                params.push(("returnDate", return_date.format("%Y-%m-%d").to_string()));
            }
        }
        params
    }

    pub fn api_query_string(&self) -> String {
        encode_query_string(&self.to_api_params())
    }
}
