//! Core library for the rainfall prediction service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather observation lookup and derived features (dew point, sunshine)
//! - The classifier abstraction, its model artifact and the prediction service
//! - The error kinds every operation reports
//!
//! It is used by `rainfall-server`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod predict;
pub mod provider;

pub use config::Config;
pub use error::ServiceError;
pub use features::{DerivedWeatherFeatures, WeatherObservation, derive};
pub use model::{Classifier, LogisticRegression, ModelArtifact};
pub use predict::{Prediction, PredictionService};
pub use provider::{UnconfiguredProvider, WeatherClient, WeatherProvider, client_from_config};
