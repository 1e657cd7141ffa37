//! HTTP routes: landing page, weather lookups and prediction.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rainfall_core::{
    DerivedWeatherFeatures, Prediction, PredictionService, ServiceError, WeatherClient,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Read-only state shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub weather: Arc<WeatherClient>,
    pub predictor: Arc<PredictionService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/get_weather", get(get_weather))
        .route("/get_weather_coords", get(get_weather_coords))
        .route("/predict", post(predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: Prediction,
}

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoordsQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// `ServiceError` rendered as `{"error": ...}` with the matching status.
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self.0 {
            ServiceError::Internal(msg) => tracing::error!(error = %msg, "request failed"),
            other => tracing::warn!(kind = other.kind(), error = %other, "request rejected"),
        }

        let body = ErrorResponse { error: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "features": state.predictor.required_features(),
    }))
}

async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> Result<Json<DerivedWeatherFeatures>, ApiError> {
    let features = state.weather.fetch_by_city(query.city.as_deref()).await?;
    Ok(Json(features))
}

async fn get_weather_coords(
    State(state): State<AppState>,
    Query(query): Query<CoordsQuery>,
) -> Result<Json<DerivedWeatherFeatures>, ApiError> {
    let features = state
        .weather
        .fetch_by_coords(query.lat.as_deref(), query.lon.as_deref())
        .await?;
    Ok(Json(features))
}

// Body is taken raw so malformed input still gets the `{"error": ...}` shape.
async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let input = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .ok_or_else(|| ServiceError::validation("Request body must be a JSON object"))?;

    let prediction = state.predictor.predict(&input)?;
    tracing::info!(%prediction, "prediction served");

    Ok(Json(PredictionResponse { prediction }))
}
