//! Headless state behind the forecast screen: search box, loading overlay,
//! forecast table and toast message.

use std::sync::Arc;

use chrono::Local;
use skycast_core::AppError;
use skycast_weather::{calendar_date, DailyForecast, ForecastSample, TemperatureUnit};

use crate::app_services::AppServices;
use crate::services::forecast_service::{self, ForecastError, ForecastServiceMessage};

const NO_DATA_TEXT: &str = "No forecast data available";

/// One rendered day of the forecast table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRow {
    /// `DD/MM/YYYY`
    pub date: String,
    pub temp_min: String,
    pub temp_max: String,
    pub pressure: String,
    pub humidity: String,
}

impl ForecastRow {
    pub fn from_sample(sample: &ForecastSample, unit: TemperatureUnit) -> Self {
        let date = sample
            .dt_txt
            .as_deref()
            .and_then(calendar_date)
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "-".to_string());

        Self {
            date,
            temp_min: format!("{}{}", sample.main.temp_min, unit.symbol()),
            temp_max: format!("{}{}", sample.main.temp_max, unit.symbol()),
            pressure: format!("{} hPa", sample.main.pressure),
            humidity: format!("{}%", sample.main.humidity),
        }
    }
}

pub struct ForecastModel {
    services: Arc<AppServices>,
    query: String,
    loading: bool,
    rows: Vec<ForecastRow>,
    location_name: String,
    toast: Option<String>,
    forecast: Option<DailyForecast>,
    next_request_id: u64,
    pending_request: Option<u64>,
}

impl ForecastModel {
    pub fn new(services: Arc<AppServices>) -> Self {
        services.init_forecast_service_channel();
        Self {
            services,
            query: String::new(),
            loading: false,
            rows: Vec::new(),
            location_name: String::new(),
            toast: None,
            forecast: None,
            next_request_id: 0,
            pending_request: None,
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// True while a search is in flight; the search action is disabled then.
    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    pub fn forecast(&self) -> Option<&DailyForecast> {
        self.forecast.as_ref()
    }

    /// Local time of the last successful fetch, `HH:MM`
    pub fn updated_at(&self) -> Option<String> {
        self.forecast.as_ref().map(|f| {
            f.fetched_at
                .with_timezone(&Local)
                .format("%H:%M")
                .to_string()
        })
    }

    pub fn toast(&self) -> Option<&str> {
        self.toast.as_deref()
    }

    /// Take the pending toast so it is shown once.
    pub fn take_toast(&mut self) -> Option<String> {
        self.toast.take()
    }

    /// Start a search for the current query.
    ///
    /// A blank query only raises a toast. Otherwise the table is cleared,
    /// `loading` goes up and the request runs in the background; call
    /// [`poll_channel`](Self::poll_channel) to pick up the result.
    pub fn search(&mut self) {
        if self.loading {
            tracing::debug!("Search already in progress, ignoring");
            return;
        }

        let query = self.query.trim().to_string();
        if query.is_empty() {
            self.show_error(ForecastError::Weather(skycast_weather::WeatherError::EmptyQuery));
            return;
        }

        self.rows.clear();
        self.location_name.clear();
        self.forecast = None;
        self.toast = None;
        self.loading = true;

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.pending_request = Some(request_id);

        if !forecast_service::request_search(&self.services, request_id, query) {
            self.loading = false;
            self.pending_request = None;
            self.show_error(ForecastError::Cancelled);
        }
    }

    /// Drain finished background work. Returns true if the state changed.
    pub fn poll_channel(&mut self) -> bool {
        let mut changed = false;
        while let Some(message) = self.services.try_recv_forecast_message() {
            changed |= self.apply_message(message);
        }
        changed
    }

    fn apply_message(&mut self, message: ForecastServiceMessage) -> bool {
        match message {
            ForecastServiceMessage::SearchDone { request_id, result } => {
                if self.pending_request != Some(request_id) {
                    tracing::debug!("Ignoring result of superseded search {}", request_id);
                    return false;
                }
                self.pending_request = None;
                self.loading = false;

                match result {
                    Ok(forecast) => {
                        self.location_name = forecast.location.display_name();
                        self.rows = forecast
                            .days
                            .iter()
                            .map(|day| ForecastRow::from_sample(day, forecast.unit))
                            .collect();
                        self.forecast = Some(forecast);
                    }
                    Err(e) => self.show_error(e),
                }
                true
            }
        }
    }

    fn show_error(&mut self, error: ForecastError) {
        tracing::error!("Error fetching weather data: {}", error);
        let app_error = AppError::from(error);
        self.toast = Some(app_error.user_message().to_string());
    }

    /// Plain-text table of the forecast, or the empty-state text.
    pub fn render_table(&self) -> String {
        if self.rows.is_empty() {
            return NO_DATA_TEXT.to_string();
        }

        let mut out = format!(
            "{:<12} {:>12} {:>12} {:>10} {:>9}\n",
            "Date", "Min", "Max", "Pressure", "Humidity"
        );
        for row in &self.rows {
            out.push_str(&format!(
                "{:<12} {:>12} {:>12} {:>10} {:>9}\n",
                row.date, row.temp_min, row.temp_max, row.pressure, row.humidity
            ));
        }
        out
    }
}
