//! OpenWeatherMap client: direct geocoding and the 5 day / 3 hour forecast.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::group::group_by_date;
use crate::types::{
    DailyForecast, ForecastResponse, ForecastSample, GeoLocation, TemperatureUnit, WeatherError,
};

pub const DEFAULT_GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
pub const DEFAULT_FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("SkyCast/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`OpenWeatherClient`]
#[derive(Debug, Clone)]
pub struct OpenWeatherConfig {
    pub api_key: String,
    pub geocoding_url: String,
    pub forecast_url: String,
    pub units: TemperatureUnit,
    pub timeout: Duration,
    /// Geocoding candidates requested; the first one is used
    pub geocode_limit: u8,
}

impl OpenWeatherConfig {
    /// Public endpoints, Kelvin, 10 second timeout
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            units: TemperatureUnit::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            geocode_limit: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    config: OpenWeatherConfig,
}

impl OpenWeatherClient {
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be built.
    pub fn new(config: OpenWeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn units(&self) -> TemperatureUnit {
        self.config.units
    }

    /// Resolve a city name to coordinates using the first geocoding match.
    ///
    /// # Errors
    ///
    /// `EmptyQuery` for a blank query (no request is made), `CityNotFound`
    /// when the service has no match, plus the usual HTTP failures.
    #[instrument(skip(self), level = "info")]
    pub async fn geocode(&self, query: &str) -> Result<GeoLocation, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherError::EmptyQuery);
        }

        let limit = self.config.geocode_limit.to_string();
        let response = self
            .client
            .get(&self.config.geocoding_url)
            .query(&[
                ("q", query),
                ("limit", limit.as_str()),
                ("appid", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        let matches: Vec<GeoLocation> = self.handle_response(response, query).await?;
        tracing::debug!("Geocoding returned {} candidates", matches.len());

        let location = matches
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::CityNotFound(query.to_string()))?;

        tracing::info!(
            "Geocoded {:?} to {} ({}, {})",
            query,
            location.display_name(),
            location.lat,
            location.lon
        );
        Ok(location)
    }

    /// Fetch the raw 3-hourly forecast for a location.
    ///
    /// # Errors
    ///
    /// HTTP failures and `Parse` when the body doesn't match the expected
    /// forecast shape.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(
        &self,
        location: &GeoLocation,
    ) -> Result<Vec<ForecastSample>, WeatherError> {
        let mut params = vec![
            ("lat", location.lat.to_string()),
            ("lon", location.lon.to_string()),
            ("appid", self.config.api_key.clone()),
        ];
        if let Some(units) = self.config.units.api_param() {
            params.push(("units", units.to_string()));
        }

        let response = self
            .client
            .get(&self.config.forecast_url)
            .query(&params)
            .send()
            .await?;

        let body: ForecastResponse = self.handle_response(response, &location.name).await?;
        tracing::debug!("Forecast returned {} samples", body.list.len());
        Ok(body.list)
    }

    /// Geocode `query`, fetch its forecast and keep one sample per day.
    ///
    /// # Errors
    ///
    /// Anything [`geocode`](Self::geocode) or
    /// [`fetch_forecast`](Self::fetch_forecast) returns, and `Grouping` when
    /// a sample carries no usable timestamp.
    pub async fn search(&self, query: &str) -> Result<DailyForecast, WeatherError> {
        let location = self.geocode(query).await?;
        let samples = self.fetch_forecast(&location).await?;
        let total = samples.len();

        let days = group_by_date(samples)?;
        tracing::info!(
            "Grouped {} forecast samples into {} days for {}",
            total,
            days.len(),
            location.display_name()
        );

        Ok(DailyForecast {
            location,
            unit: self.config.units,
            days,
            fetched_at: Utc::now(),
        })
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        subject: &str,
    ) -> Result<T, WeatherError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))
        } else if status == StatusCode::UNAUTHORIZED {
            Err(WeatherError::InvalidApiKey)
        } else if status == StatusCode::NOT_FOUND {
            Err(WeatherError::CityNotFound(subject.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("Weather API returned {}: {}", status, message);
            Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
