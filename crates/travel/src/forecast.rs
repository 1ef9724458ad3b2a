//! Open-Meteo daily forecast client.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const FORECAST_API_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DAILY_VARIABLES: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_probability_mean,weathercode";

/// One day of forecast, in the shape the tools hand to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    /// Ordinal label, `"Day 1"` onward.
    pub day: String,
    pub max_temp: f64,
    pub min_temp: f64,
    /// Mean precipitation probability, rendered as `"42%"`.
    pub rain: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailySeries,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    #[serde(default)]
    temperature_2m_max: Vec<f64>,
    #[serde(default)]
    temperature_2m_min: Vec<f64>,
    #[serde(default)]
    precipitation_probability_mean: Vec<f64>,
}

/// Open-Meteo client. No API key required.
#[derive(Debug, Default)]
pub struct ForecastClient {
    client: reqwest::Client,
}

impl ForecastClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Daily forecast for the given coordinates, clamped to however many
    /// days the API returned.
    pub async fn daily(&self, lat: f64, lon: f64, days: usize) -> Result<Vec<DayForecast>> {
        let response = self
            .client
            .get(FORECAST_API_URL)
            .query(&[
                ("latitude", lat.to_string().as_str()),
                ("longitude", lon.to_string().as_str()),
                ("daily", DAILY_VARIABLES),
                ("timezone", "auto"),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let response: ForecastResponse = response
            .json()
            .await
            .map_err(|e| Error::Api(e.to_string()))?;

        Ok(build_days(response.daily, days))
    }
}

fn build_days(series: DailySeries, days: usize) -> Vec<DayForecast> {
    series
        .temperature_2m_max
        .iter()
        .zip(&series.temperature_2m_min)
        .zip(&series.precipitation_probability_mean)
        .take(days)
        .enumerate()
        .map(|(i, ((max, min), rain))| DayForecast {
            day: format!("Day {}", i + 1),
            max_temp: *max,
            min_temp: *min,
            rain: format!("{rain}%"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> DailySeries {
        serde_json::from_str(
            r#"{
                "temperature_2m_max": [24.1, 26.3, 22.0, 25.5],
                "temperature_2m_min": [14.0, 15.2, 13.8, 14.9],
                "precipitation_probability_mean": [10, 35, 80, 5]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn builds_labeled_days() {
        let days = build_days(sample_series(), 2);
        assert_eq!(
            days,
            vec![
                DayForecast {
                    day: "Day 1".into(),
                    max_temp: 24.1,
                    min_temp: 14.0,
                    rain: "10%".into()
                },
                DayForecast {
                    day: "Day 2".into(),
                    max_temp: 26.3,
                    min_temp: 15.2,
                    rain: "35%".into()
                },
            ]
        );
    }

    #[test]
    fn clamps_to_available_days() {
        let days = build_days(sample_series(), 10);
        assert_eq!(days.len(), 4);
        assert_eq!(days[3].day, "Day 4");
    }

    #[test]
    fn tolerates_ragged_series() {
        let series: DailySeries = serde_json::from_str(
            r#"{
                "temperature_2m_max": [24.1, 26.3],
                "temperature_2m_min": [14.0],
                "precipitation_probability_mean": [10, 35]
            }"#,
        )
        .unwrap();
        assert_eq!(build_days(series, 5).len(), 1);
    }

    #[test]
    fn parses_full_response() {
        let json = r#"{
            "latitude": 41.9,
            "longitude": 12.5,
            "timezone": "Europe/Rome",
            "daily_units": {"temperature_2m_max": "°C"},
            "daily": {
                "time": ["2025-07-01"],
                "temperature_2m_max": [31.0],
                "temperature_2m_min": [19.4],
                "precipitation_probability_mean": [3],
                "weathercode": [1]
            }
        }"#;
        let response: ForecastResponse = serde_json::from_str(json).unwrap();
        let days = build_days(response.daily, 5);
        assert_eq!(days[0].rain, "3%");
    }
}
