//! The high-level trip planner.

use crate::forecast::{DayForecast, ForecastClient};
use crate::maps::{Location, MapsClient, Place};
use crate::tools::{coordinator_tools, planner_tools};
use crate::{Error, Result};
use dispatch::{Dispatcher, LanguageModel, Outcome};
use std::sync::Arc;
use storage::{EventKind, SessionLog};
use tracing::{info, warn};

/// Step ceiling for the direct mode (model calls the lookups itself).
pub const DIRECT_MAX_STEPS: u32 = 4;

/// Step ceiling for the coordinated mode (model delegates to agent
/// wrappers; orchestration takes a couple more turns).
pub const COORDINATED_MAX_STEPS: u32 = 6;

/// Instruction text for the direct mode.
pub fn direct_instruction() -> &'static str {
    "You are a travel planner AI. Always reply ONLY with JSON.\n\
     Format: {\"action\": <tool>, \"args\": {..}}.\n\n\
     Tools available:\n\
     - search_hotels(lat, lng, radius=1500, limit=5)\n\
     - search_attractions(lat, lng, radius=2000, limit=5)\n\
     - get_weather(lat, lon, days=5)\n\n\
     When finished, reply {\"action\": \"done\", \"result\": \"<final plan>\"}.\n\n\
     IMPORTANT:\n\
     - Do NOT include lat/lng or technical details in the final plan.\n\
     - Write the itinerary in long, rich paragraphs (morning, afternoon, evening).\n\
     - Hotels and weather should be summarized in natural language, no raw data.\n\
     - Aim for a detailed travel blog style itinerary with context and flow."
}

/// Instruction text for the coordinated mode.
pub fn coordinated_instruction() -> &'static str {
    "You are a multi-agent coordinator. Always reply ONLY with JSON.\n\
     Format: {\"action\": <tool>, \"args\": {..}}.\n\n\
     Available tools:\n\
     - hotel_agent(lat, lng, limit)\n\
     - attraction_agent(lat, lng, limit)\n\
     - weather_agent(lat, lng, days)\n\n\
     When finished, reply {\"action\": \"done\", \"result\": \"<final detailed plan>\"}.\n\
     Expand the itinerary into paragraphs (one per day). Do NOT include lat/lng in the final output."
}

/// Which dispatch configuration drives the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlannerMode {
    /// The model calls the lookups directly; final text is scrubbed of
    /// coordinate leakage.
    #[default]
    Direct,
    /// The model delegates to agent wrappers; final text is returned as-is.
    Coordinated,
}

/// Knobs for one plan request.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub days: u32,
    pub hotel_limit: usize,
    pub attraction_limit: usize,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            days: 3,
            hotel_limit: 5,
            attraction_limit: 5,
        }
    }
}

/// The planner's aggregate result: the narrative plus the directly-fetched
/// supporting data, so callers can render both even when the narrative
/// degraded.
#[derive(Debug, Clone)]
pub struct TripPlan {
    pub destination: String,
    pub location: Location,
    pub itinerary: String,
    pub hotels: Vec<Place>,
    pub attractions: Vec<Place>,
    pub forecast: Vec<DayForecast>,
}

/// High-level trip planning flow: geocode, dispatch, fetch for display.
pub struct Planner<M> {
    model: M,
    maps: Arc<MapsClient>,
    forecast: Arc<ForecastClient>,
    mode: PlannerMode,
}

impl<M: LanguageModel> Planner<M> {
    pub fn new(model: M, maps: Arc<MapsClient>, forecast: Arc<ForecastClient>) -> Self {
        Self {
            model,
            maps,
            forecast,
            mode: PlannerMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: PlannerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Plan a trip. When a session log is given, the whole exchange is
    /// recorded to it.
    pub async fn plan(
        &self,
        destination: &str,
        request: &PlanRequest,
        log: Option<&SessionLog>,
    ) -> Result<TripPlan> {
        let location = self
            .maps
            .geocode(destination)
            .await?
            .ok_or_else(|| Error::UnknownDestination(destination.to_string()))?;
        info!(destination, lat = location.lat, lng = location.lng, "destination geocoded");

        if let Some(log) = log {
            log.append(EventKind::Geocoded {
                place: destination.to_string(),
                lat: location.lat,
                lng: location.lng,
            })?;
        }

        let prompt = format!(
            "Plan a {}-day trip to {destination} with hotels, attractions, and weather. \
             The destination is at Lat: {}, Lng: {}.",
            request.days, location.lat, location.lng
        );

        let (instruction, max_steps, scrub, tools) = match self.mode {
            PlannerMode::Direct => (
                direct_instruction(),
                DIRECT_MAX_STEPS,
                true,
                planner_tools(self.maps.clone(), self.forecast.clone()),
            ),
            PlannerMode::Coordinated => (
                coordinated_instruction(),
                COORDINATED_MAX_STEPS,
                false,
                coordinator_tools(self.maps.clone(), self.forecast.clone()),
            ),
        };

        let dispatcher = Dispatcher::new(&self.model, instruction)
            .with_max_steps(max_steps)
            .with_result_scrubbing(scrub);

        let outcome = match log {
            Some(log) => dispatcher.run_logged(&prompt, &tools, log).await?,
            None => dispatcher.run(&prompt, &tools).await?,
        };

        let itinerary = match outcome {
            Outcome::Done { result } => result,
            other => {
                warn!(destination, outcome = %other, "dispatch did not converge");
                format!("Trip planner dispatch failed: {}", other.to_value())
            }
        };

        // Fetch the supporting data directly regardless of how the
        // narrative turned out, so callers always have something to render.
        let hotels = self
            .maps
            .nearby_hotels(
                location.lat,
                location.lng,
                crate::tools::HOTEL_RADIUS_M,
                request.hotel_limit,
            )
            .await?;
        let attractions = self
            .maps
            .nearby_attractions(
                location.lat,
                location.lng,
                crate::tools::ATTRACTION_RADIUS_M,
                request.attraction_limit,
            )
            .await?;
        let forecast = self
            .forecast
            .daily(location.lat, location.lng, request.days as usize)
            .await?;

        Ok(TripPlan {
            destination: destination.to_string(),
            location,
            itinerary,
            hotels,
            attractions,
            forecast,
        })
    }
}
