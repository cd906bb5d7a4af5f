use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::group::GroupError;

/// Temperature unit requested from the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// Kelvin. The API's default when no `units` parameter is sent.
    #[default]
    Standard,
    Metric,
    Imperial,
}

impl TemperatureUnit {
    /// Value of the `units` query parameter, if one has to be sent
    pub fn api_param(&self) -> Option<&'static str> {
        match self {
            Self::Standard => None,
            Self::Metric => Some("metric"),
            Self::Imperial => Some("imperial"),
        }
    }

    /// Suffix shown after temperature values
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Standard => "°K",
            Self::Metric => "°C",
            Self::Imperial => "°F",
        }
    }
}

/// Numeric readings nested under `main` in a forecast entry.
///
/// Kept as JSON numbers so `1021` stays an integer on the way back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp_min: Number,
    pub temp_max: Number,
    pub pressure: Number,
    pub humidity: Number,
    /// `temp`, `feels_like`, `sea_level` and whatever else the API sends
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One timestamped forecast entry.
///
/// Only `dt_txt` is interpreted; every other field is carried through as
/// received so the sample serializes back to the original payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    /// `YYYY-MM-DD HH:MM:SS` in UTC. `None` when missing or null upstream.
    #[serde(default)]
    pub dt_txt: Option<String>,
    pub main: MainReadings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the `/data/2.5/forecast` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<ForecastSample>,
    #[serde(default)]
    pub city: Option<ForecastCity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastCity {
    pub name: Option<String>,
    pub country: Option<String>,
    /// Shift in seconds from UTC
    pub timezone: Option<i64>,
}

/// A geocoding match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl GeoLocation {
    /// "Springfield, Illinois, US" style label, skipping missing parts
    pub fn display_name(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.state.as_deref())
            .chain(self.country.as_deref())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Result of a full city search: one representative sample per day
#[derive(Debug, Clone, Serialize)]
pub struct DailyForecast {
    pub location: GeoLocation,
    pub unit: TemperatureUnit,
    pub days: Vec<ForecastSample>,
    pub fetched_at: DateTime<Utc>,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Search query is empty")]
    EmptyQuery,
    #[error("City not found: {0}")]
    CityNotFound(String),
    #[error("API key rejected by the weather service")]
    InvalidApiKey,
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Grouping error: {0}")]
    Grouping(#[from] GroupError),
}

impl WeatherError {
    /// Short message for toast display
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "Please enter a city name.",
            Self::CityNotFound(_) => "City not found. Please check the name and try again.",
            Self::InvalidApiKey => "Weather API key is invalid. Check settings.",
            Self::Api { .. } | Self::Network(_) | Self::Parse(_) | Self::Grouping(_) => {
                "Failed to fetch weather data. Please try again."
            }
        }
    }
}
