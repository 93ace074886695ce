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

//! # HTTP Views Entry Point
//!
//! The three URL-addressable views: entry (`/`), results
//! (`/search-results`), details (`/flight-details`). All inter-view state
//! travels in the query string.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error, Result};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use clap::Parser;
use serde::Serialize;
use skylark_flight_search::{
    Airport, Bounds, DetailsRequest, FilterCriteria, FilterStats, FlightApiClient,
    FlightDetailData, FlightQuery, Itinerary, LocalStore, ResultsPipeline, SearchRequest, Theme,
    config,
};
use thiserror::Error as ThisError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "skylark-server")]
#[command(author, version, about = "HTTP views for flight search")]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "8080")]
    port: u16,
}

struct AppState {
    client: FlightApiClient,
    store: LocalStore,
}

/// View-level error taxonomy. Nothing is retried automatically; the error
/// payload carries the manual-retry hint.
#[derive(Debug, ThisError)]
enum AppError {
    #[error("malformed query: {0}")]
    BadQuery(String),
    #[error("upstream request failed")]
    Upstream(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadQuery(msg) => (StatusCode::BAD_REQUEST, format!("malformed query: {msg}")),
            AppError::Upstream(e) => (
                StatusCode::BAD_GATEWAY,
                format!("upstream request failed: {e:#}"),
            ),
            AppError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("internal error: {e:#}"),
            ),
        };
        let body = Json(serde_json::json!({
            "error": message,
            "retry": "reload to try again",
        }));
        (status, body).into_response()
    }
}

fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

fn numeric_param<T: std::str::FromStr>(
    pairs: &[(String, String)],
    key: &str,
) -> Result<Option<T>, AppError> {
    param(pairs, key)
        .map(|raw| {
            raw.parse()
                .map_err(|_| AppError::BadQuery(format!("invalid {key} value: {raw}")))
        })
        .transpose()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryView {
    query: FlightQuery,
    theme: Theme,
    recent_searches: Vec<Airport>,
}

/// Entry view: a fresh default query, the stored recents and theme flag.
/// `?theme=light|dark` persists the display preference.
async fn entry_view(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<EntryView>, AppError> {
    if let Some(raw) = param(&params, "theme") {
        let theme: Theme = raw
            .parse()
            .map_err(|e: Error| AppError::BadQuery(e.to_string()))?;
        state.store.save_theme(theme).map_err(AppError::Internal)?;
    }

    Ok(Json(EntryView {
        query: FlightQuery::default(),
        theme: state.store.theme(),
        recent_searches: state.store.recent_airports(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultsView {
    session_id: String,
    total_results: usize,
    bounds: Bounds,
    criteria: FilterCriteria,
    revealed: usize,
    has_more: bool,
    itineraries: Vec<Itinerary>,
    filter_stats: Option<FilterStats>,
}

/// Results view: one upstream fetch per parameter set, then the synchronous
/// filter pipeline. Optional parameters: minPrice, maxPrice, minDuration,
/// maxDuration, stops, airlines (comma-separated sets), more (reveal
/// actions beyond the initial window of 3).
async fn results_view(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ResultsView>, AppError> {
    let request =
        SearchRequest::from_pairs(&params).map_err(|e| AppError::BadQuery(format!("{e:#}")))?;

    let outcome = state
        .client
        .search_flights(&request)
        .await
        .map_err(AppError::Upstream)?;
    let session_id = outcome.session_id;
    let filter_stats = outcome.filter_stats;

    let mut pipeline = ResultsPipeline::new(outcome.itineraries);
    let min_price = numeric_param::<f64>(&params, "minPrice")?;
    let max_price = numeric_param::<f64>(&params, "maxPrice")?;
    if min_price.is_some() || max_price.is_some() {
        let (lo, hi) = pipeline.bounds().price;
        pipeline.set_price_range(min_price.unwrap_or(lo), max_price.unwrap_or(hi));
    }
    let min_duration = numeric_param::<u32>(&params, "minDuration")?;
    let max_duration = numeric_param::<u32>(&params, "maxDuration")?;
    if min_duration.is_some() || max_duration.is_some() {
        let (lo, hi) = pipeline.bounds().duration;
        pipeline.set_duration_range(min_duration.unwrap_or(lo), max_duration.unwrap_or(hi));
    }
    if let Some(raw) = param(&params, "stops") {
        for part in raw.split(',').filter(|p| !p.is_empty()) {
            let stop: u32 = part
                .parse()
                .map_err(|_| AppError::BadQuery(format!("invalid stops value: {part}")))?;
            pipeline.toggle_stop(stop);
        }
    }
    if let Some(raw) = param(&params, "airlines") {
        for part in raw.split(',').filter(|p| !p.is_empty()) {
            let carrier: i32 = part
                .parse()
                .map_err(|_| AppError::BadQuery(format!("invalid airlines value: {part}")))?;
            pipeline.toggle_airline(carrier);
        }
    }
    if let Some(more) = numeric_param::<u32>(&params, "more")? {
        for _ in 0..more {
            pipeline.show_more();
        }
    }

    Ok(Json(ResultsView {
        session_id,
        total_results: pipeline.filtered().len(),
        bounds: *pipeline.bounds(),
        criteria: pipeline.criteria().clone(),
        revealed: pipeline.revealed(),
        has_more: pipeline.has_more(),
        itineraries: pipeline.visible().into_iter().cloned().collect(),
        filter_stats,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailsView {
    itinerary_id: String,
    lowest_total_price: Option<f64>,
    details: FlightDetailData,
}

/// Details view: required parameters are checked before any request; an
/// incomplete URL is an unrecoverable navigation error and redirects to
/// the entry view.
async fn details_view(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let Some(request) = DetailsRequest::from_pairs(&params) else {
        return Ok(Redirect::to("/").into_response());
    };

    let details = state
        .client
        .flight_details(&request)
        .await
        .map_err(AppError::Upstream)?;

    Ok(Json(DetailsView {
        itinerary_id: request.itinerary_id,
        lowest_total_price: details.itinerary.lowest_total_price(),
        details,
    })
    .into_response())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".to_string().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();
    tracing::debug!("Parsed args: {:?}", args);

    let client = FlightApiClient::from_env().context("Failed to create API client")?;
    let store = LocalStore::open(config::state_file_path());
    let state = Arc::new(AppState { client, store });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("Invalid host:port")?;
    tracing::info!("Starting flight-search views on {}", addr);

    let app = axum::Router::new()
        .route("/", get(entry_view))
        .route("/search-results", get(results_view))
        .route("/flight-details", get(details_view))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    tracing::debug!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}
