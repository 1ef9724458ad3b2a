//! Travel data layer and trip planner.
//!
//! This crate supplies everything around the dispatch core that makes
//! Dragoman a travel assistant:
//!
//! - [`MapsClient`]: geocoding, nearby hotel/attraction search, and walking
//!   routes against the Google Maps REST endpoints.
//! - [`ForecastClient`]: daily weather forecasts from Open-Meteo (keyless).
//! - Tool implementations over those clients, in two registry presets:
//!   [`planner_tools`] (the tools the model calls directly) and
//!   [`coordinator_tools`] (equivalently-shaped agent wrappers).
//! - [`Planner`]: the high-level flow. Geocode the destination, run the
//!   dispatch loop, and fetch hotels/attractions/forecast for display
//!   alongside the narrative itinerary.

mod error;
mod forecast;
mod maps;
mod planner;
mod tools;

pub use error::{Error, Result};
pub use forecast::{DayForecast, ForecastClient};
pub use maps::{Location, MapsClient, Place, WalkInfo};
pub use planner::{
    COORDINATED_MAX_STEPS, DIRECT_MAX_STEPS, PlanRequest, Planner, PlannerMode, TripPlan,
    coordinated_instruction, direct_instruction,
};
pub use tools::{coordinator_tools, planner_tools};
