use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use rainfall_core::{
    Config, DerivedWeatherFeatures, ModelArtifact, PredictionService, UnconfiguredProvider,
    WeatherClient, client_from_config,
};
use serde_json::{Map, Value};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{browser, routes};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "rainfall", version, about = "Rainfall prediction service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),

    /// Store the OpenWeather API key and service defaults.
    Configure,

    /// Show derived weather features for a city or a coordinate pair.
    Weather {
        /// City name, e.g. "London".
        city: Option<String>,

        #[arg(long, allow_hyphen_values = true, requires = "lon", conflicts_with = "city")]
        lat: Option<String>,

        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<String>,
    },

    /// Classify a feature vector given as NAME=VALUE pairs.
    Predict {
        /// Model artifact; defaults to the configured one.
        #[arg(long)]
        model: Option<PathBuf>,

        #[arg(value_name = "NAME=VALUE", value_parser = parse_feature)]
        features: Vec<(String, f64)>,
    },
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address, overrides config and RAINFALL_BIND.
    #[arg(long)]
    pub bind: Option<String>,

    /// Model artifact, overrides config and RAINFALL_MODEL_PATH.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Open the landing page in a browser once listening.
    #[arg(long)]
    pub open_browser: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Serve(args) => serve(args).await,
            Command::Configure => configure(),
            Command::Weather { city, lat, lon } => {
                let client = client_from_config(&load_config()?)?;
                let features = match (city, lat, lon) {
                    (None, Some(lat), Some(lon)) => {
                        client.fetch_by_coords(Some(&lat), Some(&lon)).await?
                    }
                    (city, _, _) => client.fetch_by_city(city.as_deref()).await?,
                };
                print_features(&features);
                Ok(())
            }
            Command::Predict { model, features } => {
                let path = match model {
                    Some(path) => path,
                    None => load_config()?.model_path(),
                };
                let predictor = load_predictor(&path)?;

                let input: Map<String, Value> = features
                    .into_iter()
                    .map(|(name, value)| (name, Value::from(value)))
                    .collect();

                let prediction = predictor.predict(&input)?;
                println!("{prediction}");
                Ok(())
            }
        }
    }
}

/// Config file values overlaid with environment variables.
fn load_config() -> Result<Config> {
    let mut config = Config::load()?;
    config.apply_env()?;
    Ok(config)
}

fn load_predictor(path: &Path) -> Result<PredictionService> {
    let artifact = ModelArtifact::load(path)?;
    let (features, classifier) = artifact.into_parts();
    tracing::info!(path = %path.display(), features = ?features, "loaded model");
    Ok(PredictionService::new(features, classifier))
}

/// Prediction only needs the model; without an API key the weather routes
/// stay up but answer with an internal error.
pub fn build_state(config: &Config) -> Result<routes::AppState> {
    let weather = match config.require_api_key() {
        Ok(_) => client_from_config(config)?,
        Err(e) => {
            tracing::warn!(error = %e, "weather lookups disabled");
            WeatherClient::new(Arc::new(UnconfiguredProvider))
        }
    };
    let predictor = load_predictor(&config.model_path())?;

    Ok(routes::AppState {
        weather: Arc::new(weather),
        predictor: Arc::new(predictor),
    })
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = load_config()?;
    if let Some(bind) = args.bind {
        config.bind = Some(bind);
    }
    if let Some(model) = args.model {
        config.model_path = Some(model);
    }

    let state = build_state(&config)?;
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind()))?;
    let addr = listener.local_addr()?;

    tracing::info!(
        "rainfall v{} listening on http://{}",
        env!("CARGO_PKG_VERSION"),
        addr
    );

    if args.open_browser {
        browser::open_in_background(addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    config.api_key = Some(api_key.trim().to_string());

    let model = Text::new("Model artifact path:")
        .with_default(&config.model_path().display().to_string())
        .prompt()?;
    config.model_path = Some(PathBuf::from(model));

    let bind = Text::new("Listen address:")
        .with_default(config.bind())
        .prompt()?;
    config.bind = Some(bind);

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn parse_feature(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{raw}'"));
    }

    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;

    Ok((name.to_string(), value))
}

fn print_features(features: &DerivedWeatherFeatures) {
    for (name, value) in features.named() {
        println!("{name:>14}: {value}");
    }
}
