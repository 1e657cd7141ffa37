use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::{error::ServiceError, features::WeatherObservation};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const FALLBACK_MESSAGE: &str = "Error fetching weather data";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherProviderBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenWeatherProviderBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> anyhow::Result<OpenWeatherProvider> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(OpenWeatherProvider {
            api_key: self.api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

impl OpenWeatherProvider {
    pub fn builder(api_key: String) -> OpenWeatherProviderBuilder {
        OpenWeatherProviderBuilder {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    async fn fetch_current(
        &self,
        location: &[(&str, &str)],
    ) -> Result<WeatherObservation, ServiceError> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(location)
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "OpenWeather request failed");
                ServiceError::from(e)
            })?;

        let status = res.status();
        let body = res.text().await?;

        // OpenWeather reports failures in the body (`cod`/`message`), so the
        // body decides success rather than the HTTP status.
        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(%status, body = %truncate_body(&body), "OpenWeather returned non-JSON body");
            ServiceError::from(e)
        })?;

        if !is_success_code(parsed.get("cod")) {
            let message = parsed
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or(FALLBACK_MESSAGE);
            tracing::warn!(%status, message, "OpenWeather rejected request");
            return Err(ServiceError::upstream(message));
        }

        let current: OwCurrentResponse = serde_json::from_value(parsed)?;

        Ok(WeatherObservation {
            pressure: current.main.pressure,
            temperature: current.main.temp,
            humidity: current.main.humidity,
            cloud_cover_percent: current.clouds.all,
            wind_direction_deg: current.wind.deg,
            wind_speed: current.wind.speed,
        })
    }
}

/// `cod` is a number on success but a string on most errors.
fn is_success_code(cod: Option<&Value>) -> bool {
    match cod {
        Some(Value::Number(n)) => n.as_u64() == Some(200),
        Some(Value::String(s)) => s == "200",
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    clouds: OwClouds,
    wind: OwWind,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_by_city(&self, city: &str) -> Result<WeatherObservation, ServiceError> {
        self.fetch_current(&[("q", city)]).await
    }

    async fn current_by_coords(
        &self,
        lat: &str,
        lon: &str,
    ) -> Result<WeatherObservation, ServiceError> {
        self.fetch_current(&[("lat", lat), ("lon", lon)]).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
