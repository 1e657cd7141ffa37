use serde::{Deserialize, Serialize};

/// Raw current-weather values as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// hPa
    pub pressure: f64,
    /// °C
    pub temperature: f64,
    /// percent, 0-100
    pub humidity: f64,
    /// percent, 0-100
    pub cloud_cover_percent: f64,
    /// degrees, 0-360
    pub wind_direction_deg: f64,
    /// m/s
    pub wind_speed: f64,
}

/// Feature set fed to the classifier, keyed the way the model was trained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedWeatherFeatures {
    pub pressure: f64,
    pub dewpoint: f64,
    pub humidity: f64,
    pub cloud: f64,
    pub sunshine: f64,
    pub winddirection: f64,
    pub windspeed: f64,
}

pub const HOURS_PER_DAY: f64 = 24.0;

/// Derive dew point and sunshine hours from an observation.
///
/// Dew point uses the linear approximation `T - (100 - RH) / 5` and is not
/// bounded. Sunshine is the cloud-free share of a day, clamped to `[0, 24]`
/// before rounding.
pub fn derive(obs: &WeatherObservation) -> DerivedWeatherFeatures {
    let dewpoint = obs.temperature - ((100.0 - obs.humidity) / 5.0);

    let sunshine = HOURS_PER_DAY - (obs.cloud_cover_percent / 100.0 * HOURS_PER_DAY);
    let sunshine = sunshine.clamp(0.0, HOURS_PER_DAY);

    DerivedWeatherFeatures {
        pressure: obs.pressure,
        dewpoint: round2(dewpoint),
        humidity: obs.humidity,
        cloud: obs.cloud_cover_percent,
        sunshine: round2(sunshine),
        winddirection: obs.wind_direction_deg,
        windspeed: obs.wind_speed,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl DerivedWeatherFeatures {
    /// Feature name / value pairs in the order the fields are declared.
    pub fn named(&self) -> [(&'static str, f64); 7] {
        [
            ("pressure", self.pressure),
            ("dewpoint", self.dewpoint),
            ("humidity", self.humidity),
            ("cloud", self.cloud),
            ("sunshine", self.sunshine),
            ("winddirection", self.winddirection),
            ("windspeed", self.windspeed),
        ]
    }
}
