use crate::services::ForecastError;
use skycast_core::{AppError, ReqwestErrorExt, WeatherError as CoreWeatherError};
use skycast_weather::WeatherError;

fn map_weather_error(e: WeatherError) -> AppError {
    match e {
        WeatherError::EmptyQuery => AppError::Weather(CoreWeatherError::EmptyQuery),
        WeatherError::CityNotFound(city) => {
            AppError::Weather(CoreWeatherError::CityNotFound(city))
        }
        WeatherError::InvalidApiKey => AppError::Weather(CoreWeatherError::InvalidApiKey),
        WeatherError::Api { status, message } => {
            AppError::Weather(CoreWeatherError::ApiError(format!("{status}: {message}")))
        }
        WeatherError::Network(e) => AppError::Network(e.into_network_error()),
        WeatherError::Parse(s) => AppError::Weather(CoreWeatherError::MalformedData(s)),
        WeatherError::Grouping(g) => {
            AppError::Weather(CoreWeatherError::MalformedData(g.to_string()))
        }
    }
}

impl From<ForecastError> for AppError {
    fn from(e: ForecastError) -> Self {
        match e {
            ForecastError::Weather(e) => map_weather_error(e),
            ForecastError::NotInitialized => AppError::Weather(CoreWeatherError::ServiceUnavailable),
            ForecastError::Cancelled => AppError::Service("forecast search cancelled".to_string()),
        }
    }
}
