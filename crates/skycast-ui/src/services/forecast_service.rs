//! Forecast backend: async city search.
//! All network work runs off the caller's thread; results are sent via mpsc.

use skycast_weather::{DailyForecast, WeatherError};

use crate::app_services::AppServices;

/// Error type for forecast operations
#[derive(Debug)]
pub enum ForecastError {
    Weather(WeatherError),
    NotInitialized,
    Cancelled,
}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastError::Weather(e) => write!(f, "Forecast error: {}", e),
            ForecastError::NotInitialized => write!(f, "Weather service not initialized"),
            ForecastError::Cancelled => write!(f, "Forecast search cancelled"),
        }
    }
}

impl std::error::Error for ForecastError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ForecastError::Weather(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WeatherError> for ForecastError {
    fn from(e: WeatherError) -> Self {
        ForecastError::Weather(e)
    }
}

/// Messages sent from async operations back to the model
#[derive(Debug)]
pub enum ForecastServiceMessage {
    /// Result of a city search, tagged with the id the model issued
    SearchDone {
        request_id: u64,
        result: Result<DailyForecast, ForecastError>,
    },
}

/// Search for `query` asynchronously.
/// Sends `SearchDone` on the forecast channel when complete.
///
/// Returns false when nothing was dispatched, in which case no `SearchDone`
/// will follow.
#[must_use]
pub fn request_search(services: &AppServices, request_id: u64, query: String) -> bool {
    if services.shutdown_token().is_cancelled() {
        tracing::warn!("Services shut down, dropping search for {:?}", query);
        return false;
    }

    services.init_forecast_service_channel();
    let Some(tx) = services.forecast_service_tx() else {
        tracing::warn!("Forecast channel unavailable, dropping search for {:?}", query);
        return false;
    };

    let Some(client) = services.weather_client() else {
        let _ = tx.send(ForecastServiceMessage::SearchDone {
            request_id,
            result: Err(ForecastError::NotInitialized),
        });
        return true;
    };

    let cancel = services.shutdown_token();

    services.runtime().spawn(async move {
        tracing::info!("Searching forecast for {:?}", query);

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(ForecastError::Cancelled),
            result = client.search(&query) => result.map_err(ForecastError::from),
        };

        if let Err(e) = &result {
            tracing::warn!("Forecast search for {:?} failed: {}", query, e);
        }

        let _ = tx.send(ForecastServiceMessage::SearchDone { request_id, result });
    });
    true
}
