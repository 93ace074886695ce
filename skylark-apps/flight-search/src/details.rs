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

//! # Detail Retrieval
//!
//! Booking-options request construction and wire model. The `legs`
//! descriptor encoding (JSON with every quote backslash-escaped, the whole
//! value wrapped in literal quotes) reproduces the upstream API's expected
//! format byte for byte; do not normalize it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::query_state::{CabinClass, SearchRequest, encode_query_string};
use crate::results::Itinerary;

/// One leg of the selected itinerary, as the details endpoint wants it.
/// Field order is part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegRef {
    pub origin: String,
    pub destination: String,
    pub date: String,
}

/// Leg descriptors for a selected itinerary: place ids plus the date-only
/// portion of each leg's departure.
pub fn leg_refs(itinerary: &Itinerary) -> Vec<LegRef> {
    itinerary
        .legs
        .iter()
        .map(|leg| LegRef {
            origin: leg.origin.id.clone(),
            destination: leg.destination.id.clone(),
            date: leg.departure_date().to_string(),
        })
        .collect()
}

/// Encode leg descriptors in the upstream convention: compact JSON, every
/// double quote backslash-escaped, wrapped in literal double quotes.
pub fn encode_legs(legs: &[LegRef]) -> Result<String> {
    let json = serde_json::to_string(legs).context("Encode legs descriptor")?;
    Ok(format!("\"{}\"", json.replace('"', "\\\"")))
}

/// A fully specified details request, as carried by the details-view URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailsRequest {
    pub itinerary_id: String,
    pub session_id: String,
    /// Already in the escaped wire encoding; forwarded verbatim.
    pub legs: String,
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub currency: String,
    pub locale: String,
    pub market: String,
    pub cabin_class: CabinClass,
    pub country_code: String,
}

impl DetailsRequest {
    /// Build the request for a selected itinerary of a search outcome.
    pub fn from_selection(
        itinerary: &Itinerary,
        session_id: &str,
        request: &SearchRequest,
    ) -> Result<Self> {
        Ok(Self {
            itinerary_id: itinerary.id.clone(),
            session_id: session_id.to_string(),
            legs: encode_legs(&leg_refs(itinerary))?,
            adults: request.adults,
            children: request.children,
            infants: request.infants,
            currency: request.currency.clone(),
            locale: "en-US".to_string(),
            market: request.market.clone(),
            cabin_class: request.cabin_class,
            country_code: request.country_code.clone(),
        })
    }

    /// The details-view URL parameters, in navigation order.
    pub fn view_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("itineraryId", self.itinerary_id.clone()),
            ("sessionId", self.session_id.clone()),
            ("legs", self.legs.clone()),
            ("adults", self.adults.to_string()),
            ("children", self.children.to_string()),
            ("infants", self.infants.to_string()),
            ("currency", self.currency.clone()),
            ("locale", self.locale.clone()),
            ("market", self.market.clone()),
            ("cabinClass", self.cabin_class.as_str().to_string()),
            ("countryCode", self.country_code.clone()),
        ]
    }

    pub fn view_query_string(&self) -> String {
        encode_query_string(&self.view_params())
    }

    /// Parse the details-view query string. Returns `None` when any of the
    /// required parameters (itineraryId, sessionId, legs, adults, currency,
    /// cabinClass, countryCode) is absent or empty; the caller redirects
    /// to the entry view instead of issuing a request.
    pub fn from_pairs(pairs: &[(String, String)]) -> Option<Self> {
        let required = |key: &str| -> Option<&str> {
            let value = pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .filter(|v| !v.is_empty());
            if value.is_none() {
                tracing::warn!("Details view entered without required parameter {key}");
            }
            value
        };
        let optional = |key: &str, default: &str| -> String {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        let itinerary_id = required("itineraryId")?.to_string();
        let session_id = required("sessionId")?.to_string();
        let legs = required("legs")?.to_string();
        let adults = required("adults")?.parse().ok()?;
        let currency = required("currency")?.to_string();
        let cabin_class: CabinClass = required("cabinClass")?.parse().ok()?;
        let country_code = required("countryCode")?.to_string();

        Some(Self {
            itinerary_id,
            session_id,
            legs,
            adults,
            children: optional("children", "0").parse().ok()?,
            infants: optional("infants", "0").parse().ok()?,
            currency,
            locale: optional("locale", "en-US"),
            market: optional("market", "en-US"),
            cabin_class,
            country_code,
        })
    }

    /// Parameters of the upstream details call: exactly the seven the
    /// endpoint requires, in call order.
    pub fn api_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("itineraryId", self.itinerary_id.clone()),
            ("legs", self.legs.clone()),
            ("sessionId", self.session_id.clone()),
            ("adults", self.adults.to_string()),
            ("currency", self.currency.clone()),
            ("cabinClass", self.cabin_class.as_str().to_string()),
            ("countryCode", self.country_code.clone()),
        ]
    }

    pub fn api_query_string(&self) -> String {
        encode_query_string(&self.api_params())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDetailResponse {
    pub status: bool,
    pub timestamp: Option<i64>,
    pub data: Option<FlightDetailData>,
}

impl FlightDetailResponse {
    pub fn into_data(self) -> Result<FlightDetailData> {
        anyhow::ensure!(self.status, "Details API reported failure status");
        self.data.context("Details response carries no data")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDetailData {
    pub itinerary: DetailItinerary,
    #[serde(default)]
    pub polling_completed: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailItinerary {
    #[serde(default)]
    pub legs: Vec<DetailLeg>,
    #[serde(default)]
    pub pricing_options: Vec<PricingOption>,
    #[serde(default)]
    pub is_transfer_required: bool,
    pub destination_image: Option<String>,
}

impl DetailItinerary {
    /// The headline figure: total of the first pricing option, which the
    /// upstream orders cheapest-first.
    pub fn lowest_total_price(&self) -> Option<f64> {
        self.pricing_options.first().map(|option| option.total_price)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailLeg {
    pub id: String,
    pub origin: DetailPlace,
    pub destination: DetailPlace,
    #[serde(default)]
    pub segments: Vec<DetailSegment>,
    pub duration: u32,
    pub stop_count: u32,
    pub departure: String,
    pub arrival: String,
    #[serde(default)]
    pub day_change: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailPlace {
    pub id: Option<String>,
    pub name: String,
    pub display_code: String,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailSegment {
    pub id: String,
    pub origin: DetailPlace,
    pub destination: DetailPlace,
    pub duration: u32,
    #[serde(default)]
    pub day_change: i32,
    pub flight_number: String,
    pub departure: String,
    pub arrival: String,
    pub marketing_carrier: DetailCarrier,
    pub operating_carrier: Option<DetailCarrier>,
}

/// Carrier in the details response; ids are strings here, unlike the
/// numeric ids of the search response.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailCarrier {
    pub id: String,
    pub name: String,
    pub display_code: Option<String>,
    pub logo: Option<String>,
    pub alt_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingOption {
    #[serde(default)]
    pub agents: Vec<Agent>,
    pub total_price: f64,
}

/// A booking agent offer: rendered with its total price and outbound link.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub url: String,
    pub price: f64,
    #[serde(default)]
    pub is_carrier: bool,
    pub rating: Option<AgentRating>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRating {
    pub value: f64,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legs_encoding_matches_the_upstream_convention() {
        let legs = vec![LegRef {
            origin: "JFK".to_string(),
            destination: "LAX".to_string(),
            date: "2025-06-01".to_string(),
        }];
        let encoded = encode_legs(&legs).unwrap();
        assert_eq!(
            encoded,
            r#""[{\"origin\":\"JFK\",\"destination\":\"LAX\",\"date\":\"2025-06-01\"}]""#
        );
    }

    #[test]
    fn missing_required_parameter_yields_none() {
        let mut pairs: Vec<(String, String)> = vec![
            ("itineraryId", "it-1"),
            ("sessionId", "sess-1"),
            ("legs", r#""[]""#),
            ("adults", "1"),
            ("currency", "USD"),
            ("cabinClass", "economy"),
            ("countryCode", "US"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert!(DetailsRequest::from_pairs(&pairs).is_some());

        // Empty counts as absent.
        pairs[1].1.clear();
        assert!(DetailsRequest::from_pairs(&pairs).is_none());

        pairs.remove(1);
        assert!(DetailsRequest::from_pairs(&pairs).is_none());
    }

    #[test]
    fn api_params_carry_exactly_the_seven_required_fields() {
        let request = DetailsRequest {
            itinerary_id: "it-1".to_string(),
            session_id: "sess-1".to_string(),
            legs: r#""[]""#.to_string(),
            adults: 2,
            children: 1,
            infants: 0,
            currency: "USD".to_string(),
            locale: "en-US".to_string(),
            market: "en-US".to_string(),
            cabin_class: CabinClass::Business,
            country_code: "US".to_string(),
        };
        let keys: Vec<&str> = request.api_params().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "itineraryId",
                "legs",
                "sessionId",
                "adults",
                "currency",
                "cabinClass",
                "countryCode"
            ]
        );
    }

    #[test]
    fn lowest_total_is_the_first_pricing_option() {
        let itinerary = DetailItinerary {
            legs: Vec::new(),
            pricing_options: vec![
                PricingOption {
                    agents: Vec::new(),
                    total_price: 312.5,
                },
                PricingOption {
                    agents: Vec::new(),
                    total_price: 340.0,
                },
            ],
            is_transfer_required: false,
            destination_image: None,
        };
        assert_eq!(itinerary.lowest_total_price(), Some(312.5));
    }
}
