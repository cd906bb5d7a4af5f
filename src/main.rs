use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use skycast_core::{Config, TemperatureUnit};
use skycast_ui::{AppServices, ForecastModel};
use skycast_weather::ForecastSample;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "skycast")]
#[command(about = "Daily weather forecast for a city")]
#[command(version)]
struct Cli {
    /// City to look up, e.g. "Pune" or "Springfield,US"
    city: String,

    /// OpenWeatherMap API key (overrides the config file)
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Temperature unit: standard (Kelvin), metric or imperial
    #[arg(short, long)]
    units: Option<TemperatureUnit>,

    /// Print the grouped forecast samples as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    skycast_core::init()?;
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(key) = cli.api_key {
        config.weather.api_key = Some(key);
    }
    if let Some(units) = cli.units {
        config.weather.temperature_unit = units;
    }

    let validation = config.validate();
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }
    if !validation.is_valid() {
        anyhow::bail!(
            "Configuration validation failed: {}",
            validation.error_summary()
        );
    }

    let services = AppServices::new().context("Failed to start async runtime")?;
    if let Err(e) = services.init_weather_client(&config.weather) {
        tracing::error!("{}", e);
        anyhow::bail!("{}", e.user_message());
    }

    let mut model = ForecastModel::new(services.clone());
    model.set_query(cli.city);
    model.search();

    let timeout = Duration::from_secs(config.weather.request_timeout_secs.saturating_mul(3));
    let started = Instant::now();
    while model.loading() {
        if started.elapsed() > timeout {
            services.shutdown();
            anyhow::bail!("Timed out waiting for the weather service");
        }
        std::thread::sleep(POLL_INTERVAL);
        model.poll_channel();
    }

    let outcome = match model.take_toast() {
        Some(message) => Err(anyhow::anyhow!(message)),
        None => {
            let stdout = io::stdout();
            print_forecast(&model, cli.json, &mut stdout.lock())
        }
    };

    services.shutdown();
    outcome
}

fn print_forecast(model: &ForecastModel, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        let days = model.forecast().map(|f| f.days.as_slice()).unwrap_or_default();
        return write_json(days, out);
    }

    writeln!(out, "Weather in {}", model.location_name())?;
    if let Some(updated) = model.updated_at() {
        writeln!(out, "Updated {}", updated)?;
    }
    writeln!(out)?;
    write!(out, "{}", model.render_table())?;
    Ok(())
}

fn write_json(days: &[ForecastSample], out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, days)?;
    writeln!(out)?;
    Ok(())
}
