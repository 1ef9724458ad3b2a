//! Google Maps REST client: geocoding, nearby search, walking directions.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const MAPS_API_URL: &str = "https://maps.googleapis.com/maps/api";

/// A geocoded point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// A hotel or attraction returned by nearby search.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    /// Absent when the place has no reviews yet.
    pub rating: Option<f64>,
    pub lat: f64,
    pub lng: f64,
}

/// A walking leg between two points, in the API's human-readable units.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkInfo {
    pub distance: String,
    pub duration: String,
}

// --- API response types ---

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    #[serde(default)]
    results: Vec<NearbyResult>,
}

#[derive(Debug, Deserialize)]
struct NearbyResult {
    name: String,
    #[serde(default)]
    rating: Option<f64>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    #[serde(default)]
    distance: Option<TextValue>,
    #[serde(default)]
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
}

/// Google Maps API client.
pub struct MapsClient {
    client: reqwest::Client,
    api_key: String,
}

impl MapsClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create a client from the `GMAPS_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GMAPS_API_KEY")
            .map_err(|_| Error::Api("GMAPS_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Geocode a place name. `None` when the API knows no such place.
    pub async fn geocode(&self, place: &str) -> Result<Option<Location>> {
        let response: GeocodeResponse = self
            .get(
                "geocode/json",
                &[("address", place), ("key", self.api_key.as_str())],
            )
            .await?;
        Ok(first_location(response))
    }

    /// Nearby hotels (place type `lodging`), at most `limit` results.
    pub async fn nearby_hotels(
        &self,
        lat: f64,
        lng: f64,
        radius: u32,
        limit: usize,
    ) -> Result<Vec<Place>> {
        self.nearby(lat, lng, radius, "lodging", limit).await
    }

    /// Nearby attractions (place type `tourist_attraction`), at most
    /// `limit` results.
    pub async fn nearby_attractions(
        &self,
        lat: f64,
        lng: f64,
        radius: u32,
        limit: usize,
    ) -> Result<Vec<Place>> {
        self.nearby(lat, lng, radius, "tourist_attraction", limit)
            .await
    }

    /// Walking distance and duration between two points. `None` when no
    /// route exists.
    pub async fn walking_route(
        &self,
        origin: Location,
        dest: Location,
    ) -> Result<Option<WalkInfo>> {
        let response: DirectionsResponse = self
            .get(
                "directions/json",
                &[
                    ("origin", format!("{},{}", origin.lat, origin.lng).as_str()),
                    ("destination", format!("{},{}", dest.lat, dest.lng).as_str()),
                    ("mode", "walking"),
                    ("key", self.api_key.as_str()),
                ],
            )
            .await?;
        Ok(first_leg(response))
    }

    async fn nearby(
        &self,
        lat: f64,
        lng: f64,
        radius: u32,
        place_type: &str,
        limit: usize,
    ) -> Result<Vec<Place>> {
        let response: NearbyResponse = self
            .get(
                "place/nearbysearch/json",
                &[
                    ("location", format!("{lat},{lng}").as_str()),
                    ("radius", radius.to_string().as_str()),
                    ("type", place_type),
                    ("key", self.api_key.as_str()),
                ],
            )
            .await?;
        Ok(to_places(response, limit))
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{MAPS_API_URL}/{path}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        response.json().await.map_err(|e| Error::Api(e.to_string()))
    }
}

fn first_location(response: GeocodeResponse) -> Option<Location> {
    response.results.into_iter().next().map(|r| r.geometry.location)
}

fn to_places(response: NearbyResponse, limit: usize) -> Vec<Place> {
    response
        .results
        .into_iter()
        .take(limit)
        .map(|r| Place {
            name: r.name,
            rating: r.rating,
            lat: r.geometry.location.lat,
            lng: r.geometry.location.lng,
        })
        .collect()
}

fn first_leg(response: DirectionsResponse) -> Option<WalkInfo> {
    let leg = response.routes.into_iter().next()?.legs.into_iter().next()?;
    Some(WalkInfo {
        distance: leg.distance.map(|d| d.text).unwrap_or_default(),
        duration: leg.duration.map(|d| d.text).unwrap_or_default(),
    })
}
