use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    error::ServiceError,
    features::{DerivedWeatherFeatures, WeatherObservation, derive},
    provider::openweather::OpenWeatherProvider,
};

pub mod openweather;

/// Source of current weather observations.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_by_city(&self, city: &str) -> Result<WeatherObservation, ServiceError>;

    async fn current_by_coords(
        &self,
        lat: &str,
        lon: &str,
    ) -> Result<WeatherObservation, ServiceError>;
}

/// Validates lookup parameters, queries the provider and derives features.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherClient {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub async fn fetch_by_city(
        &self,
        city: Option<&str>,
    ) -> Result<DerivedWeatherFeatures, ServiceError> {
        let city = non_empty(city)
            .ok_or_else(|| ServiceError::validation("City parameter is missing"))?;

        tracing::info!(city, "fetching weather by city");
        let obs = self.provider.current_by_city(city).await?;
        Ok(derive(&obs))
    }

    pub async fn fetch_by_coords(
        &self,
        lat: Option<&str>,
        lon: Option<&str>,
    ) -> Result<DerivedWeatherFeatures, ServiceError> {
        let (Some(lat), Some(lon)) = (non_empty(lat), non_empty(lon)) else {
            return Err(ServiceError::validation(
                "Latitude and Longitude parameters are missing",
            ));
        };

        tracing::info!(lat, lon, "fetching weather by coordinates");
        let obs = self.provider.current_by_coords(lat, lon).await?;
        Ok(derive(&obs))
    }
}

/// Stands in when no API key is configured, so lookups still validate their
/// input but then fail with an internal error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProvider;

pub const UNCONFIGURED_MESSAGE: &str = "No OpenWeather API key configured";

#[async_trait]
impl WeatherProvider for UnconfiguredProvider {
    async fn current_by_city(&self, _city: &str) -> Result<WeatherObservation, ServiceError> {
        Err(ServiceError::internal(UNCONFIGURED_MESSAGE))
    }

    async fn current_by_coords(
        &self,
        _lat: &str,
        _lon: &str,
    ) -> Result<WeatherObservation, ServiceError> {
        Err(ServiceError::internal(UNCONFIGURED_MESSAGE))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Build the OpenWeather-backed client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<WeatherClient> {
    let api_key = config.require_api_key()?;

    let provider = OpenWeatherProvider::builder(api_key.to_owned())
        .base_url(config.base_url())
        .timeout(config.timeout())
        .build()?;

    Ok(WeatherClient::new(Arc::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    const OBS: WeatherObservation = WeatherObservation {
        pressure: 1013.0,
        temperature: 25.0,
        humidity: 60.0,
        cloud_cover_percent: 40.0,
        wind_direction_deg: 180.0,
        wind_speed: 5.0,
    };

    #[async_trait]
    impl WeatherProvider for CountingProvider {
        async fn current_by_city(&self, _city: &str) -> Result<WeatherObservation, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OBS)
        }

        async fn current_by_coords(
            &self,
            _lat: &str,
            _lon: &str,
        ) -> Result<WeatherObservation, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OBS)
        }
    }

    #[derive(Debug)]
    struct RejectingProvider;

    #[async_trait]
    impl WeatherProvider for RejectingProvider {
        async fn current_by_city(&self, _city: &str) -> Result<WeatherObservation, ServiceError> {
            Err(ServiceError::upstream("city not found"))
        }

        async fn current_by_coords(
            &self,
            _lat: &str,
            _lon: &str,
        ) -> Result<WeatherObservation, ServiceError> {
            Err(ServiceError::internal("connection refused"))
        }
    }

    #[tokio::test]
    async fn missing_city_never_reaches_provider() {
        let provider = Arc::new(CountingProvider::default());
        let client = WeatherClient::new(provider.clone());

        for city in [None, Some(""), Some("   ")] {
            let err = client.fetch_by_city(city).await.unwrap_err();
            assert_eq!(err, ServiceError::Validation("City parameter is missing".into()));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_coordinate_never_reaches_provider() {
        let provider = Arc::new(CountingProvider::default());
        let client = WeatherClient::new(provider.clone());

        for (lat, lon) in [(None, Some("2.35")), (Some("48.85"), None), (Some(""), Some(""))] {
            let err = client.fetch_by_coords(lat, lon).await.unwrap_err();
            assert_eq!(err.status_code(), 400);
            assert!(err.to_string().contains("Latitude and Longitude"));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn derives_features_from_one_provider_call() {
        let provider = Arc::new(CountingProvider::default());
        let client = WeatherClient::new(provider.clone());

        let by_city = client.fetch_by_city(Some("Paris")).await.unwrap();
        let by_coords = client.fetch_by_coords(Some("48.85"), Some("2.35")).await.unwrap();

        assert_eq!(by_city, by_coords);
        assert_eq!(by_city.dewpoint, 17.0);
        assert_eq!(by_city.sunshine, 14.4);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn provider_errors_pass_through_unchanged() {
        let client = WeatherClient::new(Arc::new(RejectingProvider));

        let err = client.fetch_by_city(Some("Atlantis")).await.unwrap_err();
        assert_eq!(err, ServiceError::Upstream("city not found".into()));

        let err = client.fetch_by_coords(Some("1"), Some("2")).await.unwrap_err();
        assert_eq!(err, ServiceError::Internal("connection refused".into()));
    }

    #[tokio::test]
    async fn unconfigured_provider_validates_first_then_fails_internally() {
        let client = WeatherClient::new(Arc::new(UnconfiguredProvider));

        let err = client.fetch_by_city(None).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = client.fetch_by_city(Some("Paris")).await.unwrap_err();
        assert_eq!(err, ServiceError::Internal(UNCONFIGURED_MESSAGE.into()));

        let err = client.fetch_by_coords(Some("1"), Some("2")).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn client_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = client_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn client_from_config_works_when_key_set() {
        let cfg = Config { api_key: Some("KEY".into()), ..Config::default() };
        assert!(client_from_config(&cfg).is_ok());
    }
}
