use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use skycast_weather::client::{DEFAULT_FORECAST_URL, DEFAULT_GEOCODING_URL};
use url::Url;

/// Environment variable that overrides `weather.api_key`.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Weather API settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

/// Temperature unit requested from the forecast API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// Kelvin, the API's native unit
    #[default]
    Standard,
    Metric,
    Imperial,
}

impl std::str::FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "kelvin" => Ok(Self::Standard),
            "metric" | "celsius" => Ok(Self::Metric),
            "imperial" | "fahrenheit" => Ok(Self::Imperial),
            other => Err(format!("unknown temperature unit: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key. `OPENWEATHER_API_KEY` takes precedence.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of geocoding candidates requested; the first one is used
    #[serde(default = "default_geocode_limit")]
    pub geocode_limit: u8,
}

fn default_geocoding_url() -> String {
    DEFAULT_GEOCODING_URL.to_string()
}

fn default_forecast_url() -> String {
    DEFAULT_FORECAST_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_geocode_limit() -> u8 {
    1
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            temperature_unit: TemperatureUnit::default(),
            request_timeout_secs: default_request_timeout_secs(),
            geocode_limit: default_geocode_limit(),
        }
    }
}

impl WeatherConfig {
    /// API key from the environment, falling back to the config file.
    /// Blank values count as unset.
    pub fn effective_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .or_else(|| self.api_key.clone())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skycast")
}

impl Config {
    /// Load configuration from the user config directory, creating a default
    /// file if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating a default file
    /// there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut config = Self::default();
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
            tracing::info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors; warnings
    /// are logged and returned.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(
            &self.weather.geocoding_url,
            "weather.geocoding_url",
            &mut result,
        );
        validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        } else if self.weather.request_timeout_secs > 120 {
            result.add_warning(
                "weather.request_timeout_secs",
                "Request timeout is unusually long (>120s)",
            );
        }

        if !(1..=5).contains(&self.weather.geocode_limit) {
            result.add_error(
                "weather.geocode_limit",
                "Geocode limit must be between 1 and 5",
            );
        }

        if self.weather.effective_api_key().is_none() {
            result.add_warning(
                "weather.api_key",
                format!("No API key configured - set it in the config file or {API_KEY_ENV}"),
            );
        }

        result
    }

    /// Save configuration to the user config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }

            if url.port() == Some(0) {
                result.add_error(field_name, "Port cannot be 0");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.weather.forecast_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.forecast_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.weather.geocoding_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let mut config = Config::default();
        config.weather.request_timeout_secs = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "weather.request_timeout_secs"));
    }

    #[test]
    fn test_long_timeout_is_warning() {
        let mut config = Config::default();
        config.weather.request_timeout_secs = 600;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.field == "weather.request_timeout_secs"));
    }

    #[test]
    fn test_geocode_limit_bounds() {
        let mut config = Config::default();
        config.weather.geocode_limit = 0;
        assert!(!config.validate().is_valid());
        config.weather.geocode_limit = 6;
        assert!(!config.validate().is_valid());
        config.weather.geocode_limit = 5;
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_temperature_unit_from_str() {
        assert_eq!("metric".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Metric));
        assert_eq!("Imperial".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Imperial));
        assert_eq!("kelvin".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Standard));
        assert!("rankine".parse::<TemperatureUnit>().is_err());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.config_dir, dir.path());
        assert_eq!(config.weather.request_timeout_secs, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.weather.api_key = Some("abc123".to_string());
        config.weather.temperature_unit = TemperatureUnit::Metric;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.weather.api_key.as_deref(), Some("abc123"));
        assert_eq!(loaded.weather.temperature_unit, TemperatureUnit::Metric);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/skycast\"\n[weather]\ntemperature_unit = \"imperial\"\n",
        )
        .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.weather.temperature_unit, TemperatureUnit::Imperial);
        assert_eq!(loaded.weather.forecast_url, DEFAULT_FORECAST_URL);
        assert_eq!(loaded.weather.geocode_limit, 1);
    }

    #[test]
    fn test_default_endpoints_match_client_defaults() {
        let config = WeatherConfig::default();
        let client = skycast_weather::OpenWeatherConfig::new("key");
        assert_eq!(config.geocoding_url, client.geocoding_url);
        assert_eq!(config.forecast_url, client.forecast_url);
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
