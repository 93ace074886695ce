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

//! CLI for flight search.

use std::cmp::max;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use skylark_flight_search::{
    AirportLookup, CabinClass, Calendar, DetailsRequest, FlightApiClient, FlightQuery, Itinerary,
    LocalStore, QueryPatch, ResultsPipeline, SearchRequest, config, execute_search,
};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "skylark-flights")]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Origin airport or city (e.g., JFK, "new york")
    #[arg(short, long)]
    from: String,

    /// Destination airport or city (e.g., LAX, london)
    #[arg(short, long)]
    to: String,

    /// Departure date (YYYY-MM-DD or YYYY/MM/DD)
    #[arg(short, long)]
    date: String,

    /// Return date for round trips (YYYY-MM-DD or YYYY/MM/DD)
    #[arg(short = 'R', long)]
    return_date: Option<String>,

    /// Cabin class: economy, premium-economy, business, first
    #[arg(short, long, default_value = "economy")]
    cabin: String,

    /// Number of adult passengers
    #[arg(short, long, default_value = "1")]
    adults: u32,

    /// Number of children (aged 2-11)
    #[arg(long, default_value = "0")]
    children: u32,

    /// Number of infants in seat
    #[arg(long, default_value = "0")]
    infants: u32,

    /// Trip type: roundtrip, oneway
    #[arg(long, default_value = "roundtrip")]
    trip: String,

    /// Upstream result ordering (e.g., best, price_high, fastest)
    #[arg(long, default_value = "best")]
    sort_by: String,

    /// Currency of displayed prices
    #[arg(long, default_value = "USD")]
    currency: String,

    /// Keep only itineraries priced at least this much
    #[arg(long)]
    min_price: Option<f64>,

    /// Keep only itineraries priced at most this much
    #[arg(long)]
    max_price: Option<f64>,

    /// Keep only itineraries whose legs all last at least this many minutes
    #[arg(long)]
    min_duration: Option<u32>,

    /// Keep only itineraries whose legs all last at most this many minutes
    #[arg(long)]
    max_duration: Option<u32>,

    /// Stop counts to keep (comma-separated, e.g., "0,1")
    #[arg(long)]
    stops: Option<String>,

    /// Marketing carrier ids to keep (comma-separated)
    #[arg(long)]
    airlines: Option<String>,

    /// Reveal actions applied after the initial window of 3 (+5 each)
    #[arg(long, default_value = "0")]
    more: u32,

    /// Show the indicative price calendar for the route before searching
    #[arg(long, default_value = "false")]
    calendar: bool,

    /// Fetch booking options for the Nth displayed result (1-based)
    #[arg(long)]
    details: Option<usize>,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

/// Configure logging based on verbosity level
fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

/// Parse trip type string to the round-trip flag
fn parse_trip(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "roundtrip" | "round" | "rt" => Ok(true),
        "oneway" | "one" | "ow" => Ok(false),
        _ => anyhow::bail!("Invalid trip type: {}. Use: roundtrip, oneway", s),
    }
}

/// Parse date string to NaiveDate
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .context(format!(
            "Invalid date format: {}. Use YYYY-MM-DD or YYYY/MM/DD",
            s
        ))
}

fn parse_csv<T: FromStr>(s: &str, what: &str) -> Result<Vec<T>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse()
                .map_err(|_| anyhow::anyhow!("Invalid {} value: {}", what, part))
        })
        .collect()
}

/// Format duration in hours/minutes.
fn fmt_duration(minutes: u32) -> String {
    let hrs = minutes / 60;
    let mins = minutes % 60;
    if mins == 0 {
        format!("{}h", hrs)
    } else if hrs == 0 {
        format!("{}m", mins)
    } else {
        format!("{}h {:02}m", hrs, mins)
    }
}

/// Time-of-day portion of an ISO timestamp.
fn fmt_time(iso: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S")
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| "??:??".to_string())
}

/// Format departure/arrival times of the first leg.
fn fmt_times(itin: &Itinerary) -> String {
    match itin.legs.first() {
        Some(leg) => format!("{} → {}", fmt_time(&leg.departure), fmt_time(&leg.arrival)),
        None => "??:?? → ??:??".to_string(),
    }
}

/// Dollar amount with thousands grouping, e.g. "$1,234.50".
fn fmt_currency(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let rem = (cents % 100).abs();
    let mut digits = (cents / 100).abs().to_string();
    let mut grouped = String::new();
    while digits.len() > 3 {
        let split = digits.len() - 3;
        grouped = format!(",{}{}", &digits[split..], grouped);
        digits.truncate(split);
    }
    let sign = if cents < 0 { "-" } else { "" };
    format!("{sign}${digits}{grouped}.{rem:02}")
}

fn fmt_stops(itin: &Itinerary) -> String {
    match itin.legs.first().map(|leg| leg.stop_count) {
        Some(0) => "Nonstop".to_string(),
        Some(1) => "1 stop".to_string(),
        Some(n) => format!("{} stops", n),
        None => "??".to_string(),
    }
}

fn first_airline(itin: &Itinerary) -> &str {
    itin.legs
        .first()
        .and_then(|leg| leg.carriers.marketing.first())
        .map(|carrier| carrier.name.as_str())
        .unwrap_or("??")
}

fn first_duration(itin: &Itinerary) -> u32 {
    itin.legs
        .first()
        .map(|leg| leg.duration_in_minutes)
        .unwrap_or(0)
}

/// Get terminal width for responsive tables
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(100)
}

fn dash_bar() -> String {
    "-".repeat(get_terminal_width().min(100))
}

/// Calculate terminal-aware column widths
fn calc_column_widths(itins: &[&Itinerary]) -> (usize, usize, usize, usize, usize) {
    let mut max_airline = 7;
    let mut max_times = 15;
    let mut max_duration = 10;
    let mut max_stops = 8;

    for itin in itins {
        max_airline = max(max_airline, first_airline(itin).len());
        max_times = max(max_times, fmt_times(itin).chars().count());
        max_duration = max(max_duration, fmt_duration(first_duration(itin)).len());
        max_stops = max(max_stops, fmt_stops(itin).len());
    }

    let terminal_width = get_terminal_width();
    let available_width = terminal_width.saturating_sub(25);
    let total_content = max_airline + max_times + max_duration + max_stops;

    if total_content > available_width && available_width > 50 {
        let ratio = available_width as f64 / total_content as f64;
        max_airline = max((max_airline as f64 * ratio).floor() as usize, 4);
        max_times = max((max_times as f64 * ratio).floor() as usize, 10);
        max_duration = max((max_duration as f64 * ratio).floor() as usize, 5);
        max_stops = max((max_stops as f64 * ratio).floor() as usize, 7);
    }

    let rank_width = 5;
    (rank_width, max_airline, max_times, max_duration, max_stops)
}

/// Render the revealed window of the filtered results.
fn render_results(request: &SearchRequest, pipeline: &ResultsPipeline, more: u32) {
    let title_bar = format!(
        "================================================================================================\n  🛫  {} → {} on {}\n================================================================================================",
        request.origin_sky_id, request.destination_sky_id, request.date
    );
    println!("{}\n", title_bar);

    let visible = pipeline.visible();
    let filtered_total = pipeline.filtered().len();
    let bounds = pipeline.bounds();

    println!("📊 {} results match the filters", filtered_total);
    println!(
        "💰 Price range: {} – {}   ⏱  Leg duration: {} – {}",
        fmt_currency(bounds.price.0),
        fmt_currency(bounds.price.1),
        fmt_duration(bounds.duration.0),
        fmt_duration(bounds.duration.1)
    );

    let (rw, aw, tw, dw, sw) = calc_column_widths(&visible);

    println!("\n{}\n", dash_bar());
    let h1 = format!("  {:>w$}", "#", w = rw);
    let h2 = format!("{:<w$}", "AIRLINE", w = aw);
    let h3 = format!("{:<w$}", "DEP → ARR", w = tw);
    let h4 = format!("{:<w$}", "DURATION", w = dw);
    let h5 = format!("{:<w$}", "STOPS", w = sw);
    println!("{}  {}  {}  {}  {}   PRICE", h1, h2, h3, h4, h5);
    println!("{}\n", dash_bar());

    for (i, itin) in visible.iter().enumerate() {
        let c1 = format!("  {:>w$}", i + 1, w = rw);
        let c2 = format!("{:<w$}", first_airline(itin), w = aw);
        let c3 = format!("{:<w$}", fmt_times(itin), w = tw);
        let c4 = format!("{:<w$}", fmt_duration(first_duration(itin)), w = dw);
        let c5 = format!("{:<w$}", fmt_stops(itin), w = sw);
        println!("{}  {}  {}  {}  {}   {}", c1, c2, c3, c4, c5, itin.price.formatted);
    }

    if visible.len() < filtered_total {
        println!(
            "\n  … {} more. Re-run with --more {} to reveal the next 5.",
            filtered_total - visible.len(),
            more + 1
        );
    }
}

/// Render the advisory price calendar for the visible two-month window.
fn render_calendar(calendar: &Calendar) {
    use chrono::Datelike;

    for month in calendar.visible_months() {
        println!("\n📅 {}", month.format("%B %Y"));
        let mut shown = 0;
        for day in month.iter_days().take_while(|d| d.month() == month.month()) {
            if let Some(price) = calendar.price_on(day) {
                print!("  {} {:>8}", day.format("%d"), fmt_currency(price));
                shown += 1;
                if shown % 7 == 0 {
                    println!();
                }
            }
        }
        if shown == 0 {
            print!("  (no indicative prices)");
        }
        println!();
    }
}

/// Render booking options of the selected itinerary.
fn render_details(details: &skylark_flight_search::FlightDetailData) {
    let itinerary = &details.itinerary;

    for leg in &itinerary.legs {
        println!(
            "✈️  {} ({}) → {} ({}) · {}",
            leg.origin.city.as_deref().unwrap_or(&leg.origin.name),
            leg.origin.display_code,
            leg.destination
                .city
                .as_deref()
                .unwrap_or(&leg.destination.name),
            leg.destination.display_code,
            fmt_duration(leg.duration)
        );
        for segment in &leg.segments {
            println!(
                "     {} {} · {} → {} · {}",
                segment.marketing_carrier.name,
                segment.flight_number,
                fmt_time(&segment.departure),
                fmt_time(&segment.arrival),
                fmt_duration(segment.duration)
            );
        }
    }

    if let Some(total) = itinerary.lowest_total_price() {
        println!("\n💰 Lowest total price: {}", fmt_currency(total));
    }

    println!("\n🏷  Booking options:");
    println!("{}", dash_bar());
    for option in &itinerary.pricing_options {
        for agent in &option.agents {
            println!(
                "  {:<24}  {:>12}   {}",
                agent.name,
                fmt_currency(option.total_price),
                agent.url
            );
        }
    }
    if !details.polling_completed {
        println!("\n  (price polling still in progress upstream; amounts may move)");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    tracing::info!("Starting skylark-flights CLI");
    tracing::debug!("Args: {:?}", args);

    // Parse and validate inputs
    let cabin: CabinClass = args.cabin.parse()?;
    let round_trip = parse_trip(&args.trip)?;
    let depart_date = parse_date(&args.date)?;
    let return_date = args.return_date.as_deref().map(parse_date).transpose()?;

    let client = FlightApiClient::from_env()?;
    let store = LocalStore::open(config::state_file_path());

    // Resolve airport text through the lookup endpoint; selections land in
    // the persisted recents list.
    let mut lookup = AirportLookup::new(Arc::new(client.clone()), store);
    let origin = lookup
        .resolve(&args.from)
        .await
        .context("Airport lookup failed")?
        .with_context(|| format!("No airport found for {:?}", args.from))?;
    let destination = lookup
        .resolve(&args.to)
        .await
        .context("Airport lookup failed")?
        .with_context(|| format!("No airport found for {:?}", args.to))?;
    tracing::info!(
        "Resolved {} -> {}",
        origin.label(),
        destination.label()
    );

    let mut query = FlightQuery::default();
    query.apply(QueryPatch {
        origin_airport: Some(origin),
        destination_airport: Some(destination),
        date: Some(Some(depart_date)),
        return_date: return_date.map(Some),
        cabin_class: Some(cabin),
        adults: Some(args.adults),
        children: Some(args.children),
        infants: Some(args.infants),
        round_trip: Some(round_trip),
        sort_by: Some(args.sort_by.clone()),
        currency: Some(args.currency.clone()),
        ..Default::default()
    });

    if args.calendar {
        let mut calendar = Calendar::new(chrono::Local::now().date_naive());
        if let Some(key) = calendar.open(&query) {
            match client
                .price_calendar(
                    &key.origin_sky_id,
                    &key.destination_sky_id,
                    key.month,
                    &args.currency,
                )
                .await
            {
                Ok(data) => calendar.set_prices(&data.flights.days),
                // Advisory data only: degrade to an empty calendar.
                Err(e) => tracing::warn!("Price calendar unavailable: {e:#}"),
            }
        }
        render_calendar(&calendar);
        calendar.close();
    }

    // The execute gate: a no-op (with the failed predicate surfaced) unless
    // the query is complete.
    query.validate().context("Search is not executable")?;
    let results_query = execute_search(&query).context("Search is not executable")?;
    tracing::debug!("Results view query string ({} chars)", results_query.len());

    let request = SearchRequest::from_query(&query)?;
    let outcome = client
        .search_flights(&request)
        .await
        .context("Search failed; re-run to retry")?;

    let mut pipeline = ResultsPipeline::new(outcome.itineraries.clone());
    if args.min_price.is_some() || args.max_price.is_some() {
        let (lo, hi) = pipeline.bounds().price;
        pipeline.set_price_range(args.min_price.unwrap_or(lo), args.max_price.unwrap_or(hi));
    }
    if args.min_duration.is_some() || args.max_duration.is_some() {
        let (lo, hi) = pipeline.bounds().duration;
        pipeline.set_duration_range(
            args.min_duration.unwrap_or(lo),
            args.max_duration.unwrap_or(hi),
        );
    }
    if let Some(stops) = &args.stops {
        for stop in parse_csv::<u32>(stops, "stop count")? {
            pipeline.toggle_stop(stop);
        }
    }
    if let Some(airlines) = &args.airlines {
        for carrier in parse_csv::<i32>(airlines, "carrier id")? {
            pipeline.toggle_airline(carrier);
        }
    }
    for _ in 0..args.more {
        pipeline.show_more();
    }

    render_results(&request, &pipeline, args.more);

    if let Some(rank) = args.details {
        let visible = pipeline.visible();
        let selected = visible
            .get(rank.checked_sub(1).context("--details is 1-based")?)
            .with_context(|| format!("--details {}: no such displayed result", rank))?;

        let details_request =
            DetailsRequest::from_selection(selected, &outcome.session_id, &request)?;
        tracing::debug!(
            "Details view query string: {}",
            details_request.view_query_string()
        );

        let details = client
            .flight_details(&details_request)
            .await
            .context("Details fetch failed; re-run to retry")?;
        println!();
        render_details(&details);
    }

    Ok(())
}
