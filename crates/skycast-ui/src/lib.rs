//! Presentation layer for SkyCast.
//!
//! Holds the headless forecast screen model and the background services it
//! talks to. Rendering is left to the front end (the `skycast` CLI).

pub mod app_services;
pub mod error_mapping;
pub mod models;
pub mod services;

pub use app_services::AppServices;
pub use models::forecast_model::{ForecastModel, ForecastRow};
