//! Forecast lookup for SkyCast
//!
//! Resolves a city name through OpenWeatherMap geocoding, fetches the
//! 3-hourly forecast for it and reduces that to one sample per day.

pub mod client;
pub mod group;
pub mod types;

pub use client::{OpenWeatherClient, OpenWeatherConfig};
pub use group::{calendar_date, group_by_date, group_json, GroupError, Timestamped};
pub use types::*;
