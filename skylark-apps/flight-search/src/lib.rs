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

// Library for skylark-flight-search
// Flight search against the Sky-Scrapper API: query state, airport lookup,
// calendar, results filtering, detail retrieval.

mod api_client;
pub mod config;

mod airports;
mod calendar;
mod details;
mod local_store;
mod query_state;
mod results;
mod results_filter;

// Re-export the API client
pub use api_client::FlightApiClient;

// Re-export commonly used items per component
pub use airports::{
    Airport, AirportLookup, AirportNavigation, AirportPresentation, AirportSource, LOOKUP_DEBOUNCE,
    RECENT_LIMIT, RecentAirports, RelevantFlightParams,
};
pub use calendar::{Calendar, DayPrice, PriceCalendarData, PriceFetchKey, VISIBLE_MONTHS};
pub use details::{
    Agent, AgentRating, DetailCarrier, DetailItinerary, DetailLeg, DetailPlace, DetailSegment,
    DetailsRequest, FlightDetailData, FlightDetailResponse, LegRef, PricingOption, encode_legs,
    leg_refs,
};
pub use local_store::{LocalStore, StoredState, Theme};
pub use query_state::{
    CabinClass, FlightQuery, PassengerKind, QueryPatch, SearchRequest, encode_query_string,
    execute_search,
};
pub use results::{
    Carrier, Carriers, FilterStats, FlightPlace, FlightSearchResponse, Itinerary, Leg, Price,
    SearchOutcome, Segment, SegmentCarrier, SegmentPlace, StopPrice, StopPrices,
};
pub use results_filter::{
    Bounds, DURATION_FALLBACK, FilterCriteria, INITIAL_VISIBLE, PRICE_FALLBACK, REVEAL_STEP,
    ResultsPipeline,
};
