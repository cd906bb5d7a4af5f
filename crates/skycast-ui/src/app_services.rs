//! Shared application services.
//!
//! `AppServices` owns the tokio runtime the network work runs on, the
//! weather client, and the channel background tasks use to report back to
//! the screen model. Clients sit behind `RwLock` so they can be replaced
//! when configuration changes, and cleared on shutdown.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use skycast_core::{AppError, ConfigError, WeatherConfig};
use skycast_weather::{OpenWeatherClient, OpenWeatherConfig};

use crate::services::ForecastServiceMessage;

pub struct AppServices {
    /// Tokio runtime for async operations
    runtime: tokio::runtime::Runtime,

    /// Cancelled on shutdown; in-flight searches stop at their next await
    shutdown_token: CancellationToken,

    weather_client: RwLock<Option<Arc<OpenWeatherClient>>>,

    forecast_service_tx: RwLock<Option<Sender<ForecastServiceMessage>>>,
    forecast_service_rx: RwLock<Option<Mutex<Receiver<ForecastServiceMessage>>>>,
}

impl AppServices {
    /// Build the runtime and an empty service set.
    ///
    /// # Errors
    ///
    /// Fails if the tokio runtime cannot be created.
    pub fn new() -> std::io::Result<Arc<Self>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("skycast-tokio")
            .build()?;

        Ok(Arc::new(Self {
            runtime,
            shutdown_token: CancellationToken::new(),
            weather_client: RwLock::new(None),
            forecast_service_tx: RwLock::new(None),
            forecast_service_rx: RwLock::new(None),
        }))
    }

    /// Get the tokio runtime handle.
    pub fn runtime(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    /// Token cancelled when the application shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Cancel outstanding work and drop all service references.
    pub fn shutdown(&self) {
        tracing::info!("AppServices shutdown initiated");

        self.shutdown_token.cancel();

        *self.weather_client.write() = None;
        *self.forecast_service_tx.write() = None;
        *self.forecast_service_rx.write() = None;

        tracing::info!("AppServices shutdown complete");
    }

    // =========== Weather Client ===========

    pub fn weather_client(&self) -> Option<Arc<OpenWeatherClient>> {
        self.weather_client.read().clone()
    }

    pub fn set_weather_client(&self, client: Option<Arc<OpenWeatherClient>>) {
        *self.weather_client.write() = client;
    }

    /// Build the weather client from configuration.
    ///
    /// # Errors
    ///
    /// `MissingSetting` when no API key is configured, or a weather error if
    /// the HTTP client cannot be built.
    pub fn init_weather_client(&self, config: &WeatherConfig) -> Result<(), AppError> {
        let api_key = config
            .effective_api_key()
            .ok_or_else(|| ConfigError::MissingSetting("weather.api_key".to_string()))?;

        let client_config = OpenWeatherConfig {
            api_key,
            geocoding_url: config.geocoding_url.clone(),
            forecast_url: config.forecast_url.clone(),
            units: weather_unit(config.temperature_unit),
            timeout: std::time::Duration::from_secs(config.request_timeout_secs),
            geocode_limit: config.geocode_limit,
        };

        let client = OpenWeatherClient::new(client_config)
            .map_err(|e| AppError::Service(format!("Failed to create weather client: {e}")))?;

        self.set_weather_client(Some(Arc::new(client)));
        tracing::info!(
            "Weather client initialized (units: {:?})",
            config.temperature_unit
        );
        Ok(())
    }

    // =========== Forecast Service Channel ===========

    /// Create the forecast service channel if it doesn't exist yet.
    pub fn init_forecast_service_channel(&self) {
        let mut tx_slot = self.forecast_service_tx.write();
        if tx_slot.is_some() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        *tx_slot = Some(tx);
        *self.forecast_service_rx.write() = Some(Mutex::new(rx));
    }

    /// Sender for background tasks. `None` before init or after shutdown.
    pub fn forecast_service_tx(&self) -> Option<Sender<ForecastServiceMessage>> {
        self.forecast_service_tx.read().clone()
    }

    /// Non-blocking receive. Called by `ForecastModel::poll_channel`.
    pub fn try_recv_forecast_message(&self) -> Option<ForecastServiceMessage> {
        self.forecast_service_rx
            .read()
            .as_ref()
            .and_then(|rx| rx.lock().try_recv().ok())
    }
}

fn weather_unit(unit: skycast_core::TemperatureUnit) -> skycast_weather::TemperatureUnit {
    match unit {
        skycast_core::TemperatureUnit::Standard => skycast_weather::TemperatureUnit::Standard,
        skycast_core::TemperatureUnit::Metric => skycast_weather::TemperatureUnit::Metric,
        skycast_core::TemperatureUnit::Imperial => skycast_weather::TemperatureUnit::Imperial,
    }
}
