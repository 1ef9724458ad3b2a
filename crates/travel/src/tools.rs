//! Tool implementations over the travel clients.
//!
//! Two presets exist, matching the two planner modes: [`planner_tools`]
//! exposes the lookups directly, [`coordinator_tools`] exposes
//! equivalently-shaped agent wrappers. Every tool deserializes its own
//! argument struct; the dispatch loop does not validate arity.

use crate::forecast::ForecastClient;
use crate::maps::{MapsClient, Place};
use async_trait::async_trait;
use dispatch::{Tool, ToolError, ToolRegistry};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

pub(crate) const HOTEL_RADIUS_M: u32 = 1500;
pub(crate) const ATTRACTION_RADIUS_M: u32 = 2000;
const DEFAULT_LIMIT: usize = 5;
const DEFAULT_FORECAST_DAYS: usize = 5;

fn parse_args<T: for<'de> Deserialize<'de>>(args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args)).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn upstream(e: crate::Error) -> ToolError {
    ToolError::Upstream(e.to_string())
}

/// Project a place into the payload shape the model sees; a missing rating
/// renders as `"N/A"`.
fn place_record(place: &Place) -> Value {
    json!({
        "name": place.name,
        "rating": place
            .rating
            .map(Value::from)
            .unwrap_or_else(|| Value::String("N/A".into())),
        "lat": place.lat,
        "lng": place.lng,
    })
}

fn place_records(places: &[Place]) -> Value {
    Value::Array(places.iter().map(place_record).collect())
}

fn default_hotel_radius() -> u32 {
    HOTEL_RADIUS_M
}

fn default_attraction_radius() -> u32 {
    ATTRACTION_RADIUS_M
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_days() -> usize {
    DEFAULT_FORECAST_DAYS
}

#[derive(Debug, Deserialize)]
struct HotelArgs {
    lat: f64,
    lng: f64,
    #[serde(default = "default_hotel_radius")]
    radius: u32,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct AttractionArgs {
    lat: f64,
    lng: f64,
    #[serde(default = "default_attraction_radius")]
    radius: u32,
    #[serde(default = "default_limit")]
    limit: usize,
}

/// `get_weather` takes `lon`, not `lng`; the instruction text promises
/// that spelling to the model, so it stays.
#[derive(Debug, Deserialize)]
struct WeatherArgs {
    lat: f64,
    lon: f64,
    #[serde(default = "default_days")]
    days: usize,
}

#[derive(Debug, Deserialize)]
struct AgentPlaceArgs {
    lat: f64,
    lng: f64,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct AgentWeatherArgs {
    lat: f64,
    lng: f64,
    #[serde(default = "default_days")]
    days: usize,
}

struct SearchHotels {
    maps: Arc<MapsClient>,
}

#[async_trait]
impl Tool for SearchHotels {
    fn name(&self) -> &str {
        "search_hotels"
    }

    fn description(&self) -> &str {
        "Search nearby hotels given coordinates"
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let args: HotelArgs = parse_args(args)?;
        let hotels = self
            .maps
            .nearby_hotels(args.lat, args.lng, args.radius, args.limit)
            .await
            .map_err(upstream)?;
        Ok(place_records(&hotels))
    }
}

struct SearchAttractions {
    maps: Arc<MapsClient>,
}

#[async_trait]
impl Tool for SearchAttractions {
    fn name(&self) -> &str {
        "search_attractions"
    }

    fn description(&self) -> &str {
        "Search nearby tourist attractions given coordinates"
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let args: AttractionArgs = parse_args(args)?;
        let attractions = self
            .maps
            .nearby_attractions(args.lat, args.lng, args.radius, args.limit)
            .await
            .map_err(upstream)?;
        Ok(place_records(&attractions))
    }
}

struct GetWeather {
    forecast: Arc<ForecastClient>,
}

#[async_trait]
impl Tool for GetWeather {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Fetch the daily weather forecast for given coordinates"
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let args: WeatherArgs = parse_args(args)?;
        let days = self
            .forecast
            .daily(args.lat, args.lon, args.days)
            .await
            .map_err(upstream)?;
        serde_json::to_value(days).map_err(|e| ToolError::Upstream(e.to_string()))
    }
}

struct HotelAgent {
    maps: Arc<MapsClient>,
}

#[async_trait]
impl Tool for HotelAgent {
    fn name(&self) -> &str {
        "hotel_agent"
    }

    fn description(&self) -> &str {
        "Delegate hotel lookup for the destination"
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let args: AgentPlaceArgs = parse_args(args)?;
        let hotels = self
            .maps
            .nearby_hotels(args.lat, args.lng, HOTEL_RADIUS_M, args.limit)
            .await
            .map_err(upstream)?;
        Ok(place_records(&hotels))
    }
}

struct AttractionAgent {
    maps: Arc<MapsClient>,
}

#[async_trait]
impl Tool for AttractionAgent {
    fn name(&self) -> &str {
        "attraction_agent"
    }

    fn description(&self) -> &str {
        "Delegate attraction lookup for the destination"
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let args: AgentPlaceArgs = parse_args(args)?;
        let attractions = self
            .maps
            .nearby_attractions(args.lat, args.lng, ATTRACTION_RADIUS_M, args.limit)
            .await
            .map_err(upstream)?;
        Ok(place_records(&attractions))
    }
}

struct WeatherAgent {
    forecast: Arc<ForecastClient>,
}

#[async_trait]
impl Tool for WeatherAgent {
    fn name(&self) -> &str {
        "weather_agent"
    }

    fn description(&self) -> &str {
        "Delegate the weather forecast for the destination"
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let args: AgentWeatherArgs = parse_args(args)?;
        let days = self
            .forecast
            .daily(args.lat, args.lng, args.days)
            .await
            .map_err(upstream)?;
        serde_json::to_value(days).map_err(|e| ToolError::Upstream(e.to_string()))
    }
}

/// The direct preset: the lookups under their own names.
pub fn planner_tools(maps: Arc<MapsClient>, forecast: Arc<ForecastClient>) -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(Arc::new(SearchHotels { maps: maps.clone() }))
        .with_tool(Arc::new(SearchAttractions { maps }))
        .with_tool(Arc::new(GetWeather { forecast }))
}

/// The coordinator preset: agent-named wrappers with the same shapes.
pub fn coordinator_tools(maps: Arc<MapsClient>, forecast: Arc<ForecastClient>) -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(Arc::new(HotelAgent { maps: maps.clone() }))
        .with_tool(Arc::new(AttractionAgent { maps }))
        .with_tool(Arc::new(WeatherAgent { forecast }))
}
