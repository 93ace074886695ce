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

//! # Flight-Search API Client
//!
//! Effectful (time, network) operations against the external flight-search
//! service: airport autocomplete, price calendar, itinerary search, flight
//! details. Everything else in the crate is side-effect free.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use wreq::redirect::Policy;
use wreq_util::Emulation;

use crate::airports::{Airport, AirportSource};
use crate::calendar::PriceCalendarData;
use crate::config::ApiConfig;
use crate::details::{DetailsRequest, FlightDetailData, FlightDetailResponse};
use crate::query_state::SearchRequest;
use crate::results::{FlightSearchResponse, SearchOutcome};

/// Common `{status, data}` envelope of the v1 endpoints.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: bool,
    #[serde(default)]
    data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    fn into_data(self) -> Result<T> {
        ensure!(self.status, "API reported failure status");
        self.data.context("API response carries no data")
    }
}

#[derive(Clone)]
pub struct FlightApiClient {
    client: Arc<wreq::Client>,
    base_url: String,
    host: String,
    api_key: String,
}

impl FlightApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = wreq::Client::builder()
            .emulation(Emulation::Safari18_5)
            .redirect(Policy::default())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client: Arc::new(client),
            base_url: format!("https://{}/api", config.host),
            host: config.host,
            api_key: config.api_key,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ApiConfig::from_env()?)
    }

    async fn fetch_raw(&self, path_and_query: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path_and_query);
        tracing::trace!("[fetch_raw] Starting HTTP request to: {}", url);

        let http_start = std::time::Instant::now();
        let response = self
            .client
            .get(&url)
            .header("x-rapidapi-host", &self.host)
            .header("x-rapidapi-key", &self.api_key)
            .send()
            .await
            .context("Request failed")?;
        let http_elapsed = http_start.elapsed();

        let status = response.status();
        tracing::debug!(
            "[fetch_raw] HTTP Status: {} {} in {:?}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
            http_elapsed
        );

        let body = response.text().await.context("Read body")?;
        tracing::debug!("[fetch_raw] Response body: {} KB", body.len() / 1024);

        if !status.is_success() {
            let body_preview = body.chars().take(500).collect::<String>();
            bail!("HTTP error {}: {}", status, body_preview);
        }

        Ok(body)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let body = self.fetch_raw(path_and_query).await?;
        serde_json::from_str(&body).context("Decode API response")
    }

    /// Airport autocomplete. Callers wanting silent degradation (the lookup
    /// component) handle the error themselves.
    pub async fn search_airports(&self, query: &str, locale: &str) -> Result<Vec<Airport>> {
        let path = format!(
            "/v1/flights/searchAirport?query={}&locale={}",
            urlencoding::encode(query),
            urlencoding::encode(locale)
        );
        let envelope: ApiEnvelope<Vec<Airport>> = self.fetch_json(&path).await?;
        let airports = envelope.into_data()?;
        tracing::debug!("Airport lookup {:?}: {} matches", query, airports.len());
        Ok(airports)
    }

    /// Per-day indicative prices for a route, from the first of the given
    /// month onward.
    pub async fn price_calendar(
        &self,
        origin_sky_id: &str,
        destination_sky_id: &str,
        from_date: chrono::NaiveDate,
        currency: &str,
    ) -> Result<PriceCalendarData> {
        let path = format!(
            "/v1/flights/getPriceCalendar?originSkyId={}&destinationSkyId={}&fromDate={}&currency={}",
            urlencoding::encode(origin_sky_id),
            urlencoding::encode(destination_sky_id),
            from_date.format("%Y-%m-%d"),
            urlencoding::encode(currency)
        );
        let envelope: ApiEnvelope<PriceCalendarData> = self.fetch_json(&path).await?;
        envelope.into_data()
    }

    /// One itinerary search per distinct parameter set.
    pub async fn search_flights(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        let overall_start = std::time::Instant::now();

        let today = chrono::Local::now().date_naive();
        ensure!(request.date >= today, "Departure date cannot be in the past");
        if let Some(return_date) = request.return_date {
            ensure!(return_date >= today, "Return date cannot be in the past");
        }

        let path = format!("/v2/flights/searchFlights?{}", request.api_query_string());
        tracing::info!(
            "Searching flights {} -> {} on {}",
            request.origin_sky_id,
            request.destination_sky_id,
            request.date
        );

        let response: FlightSearchResponse = self.fetch_json(&path).await?;
        let outcome = response.into_outcome()?;
        tracing::info!(
            "Search returned {} itineraries in {:?}",
            outcome.len(),
            overall_start.elapsed()
        );
        Ok(outcome)
    }

    /// Booking options for a selected itinerary.
    pub async fn flight_details(&self, request: &DetailsRequest) -> Result<FlightDetailData> {
        let path = format!("/v1/flights/getFlightDetails?{}", request.api_query_string());
        let response: FlightDetailResponse = self.fetch_json(&path).await?;
        let data = response.into_data()?;
        tracing::debug!(
            "Details for {}: {} pricing options (polling_completed={})",
            request.itinerary_id,
            data.itinerary.pricing_options.len(),
            data.polling_completed
        );
        Ok(data)
    }
}

impl AirportSource for FlightApiClient {
    fn query(&self, text: &str) -> impl std::future::Future<Output = Result<Vec<Airport>>> + Send {
        self.search_airports(text, "en-US")
    }
}
