use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path as AxumPath, State},
    http::{header, StatusCode},
    response::{sse::Event as SseEvent, Html, IntoResponse, Json, Response, Sse},
};
use rust_embed::RustEmbed;
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, error, info, warn};

use super::events::MapEvent;
use super::state::AppState;
use crate::coordinator::Located;
use crate::geo::LatLng;
use crate::geocoding::GeocodeError;
use crate::listings::Preset;
use crate::markers::{Marker, MarkerId};
use crate::session::MapSnapshot;

#[derive(RustEmbed)]
#[folder = "frontend/"]
struct Asset;

/// Error body returned by every API endpoint: {"status": "error", "message": ...}
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "status": "error",
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<GeocodeError> for ApiError {
    fn from(e: GeocodeError) -> Self {
        let status = match &e {
            GeocodeError::InvalidInput => StatusCode::BAD_REQUEST,
            GeocodeError::ConcurrentRequestRejected => StatusCode::CONFLICT,
            GeocodeError::SemanticFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GeocodeError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
        };
        let message = match e {
            GeocodeError::SemanticFailure { message, .. } => message,
            other => other.to_string(),
        };
        ApiError::new(status, message)
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub max_distance_km: f64,
}

#[derive(Debug, Deserialize)]
pub struct NewMarker {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub info: String,
}

// Frontend assets
pub async fn index_html() -> Result<Html<Vec<u8>>, StatusCode> {
    let asset = Asset::get("index.html").ok_or(StatusCode::NOT_FOUND)?;
    Ok(Html(asset.data.into_owned()))
}

pub async fn style_css() -> Result<Response, StatusCode> {
    serve_asset("style.css", "text/css")
}

pub async fn script_js() -> Result<Response, StatusCode> {
    serve_asset("script.js", "application/javascript")
}

fn serve_asset(name: &str, content_type: &'static str) -> Result<Response, StatusCode> {
    let asset = Asset::get(name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(([(header::CONTENT_TYPE, content_type)], asset.data.into_owned()).into_response())
}

// Session and markers
pub async fn get_session(State(state): State<AppState>) -> Json<MapSnapshot> {
    Json(state.session.lock().snapshot())
}

pub async fn get_visible_markers(State(state): State<AppState>) -> Json<Vec<Marker>> {
    Json(state.session.lock().visible())
}

pub async fn get_all_markers(State(state): State<AppState>) -> Json<Vec<Marker>> {
    Json(state.session.lock().markers().iter().cloned().collect())
}

pub async fn add_marker(
    State(state): State<AppState>,
    Json(payload): Json<NewMarker>,
) -> ApiResult<MarkerId> {
    if !payload.lat.is_finite() || !payload.lng.is_finite() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Coordinates must be numbers"));
    }
    let marker = Marker::new(
        LatLng::new(payload.lat, payload.lng),
        payload.label,
        payload.icon,
        payload.info,
    );
    let id = state.session.lock().add_marker(marker);
    debug!(id = id.0, "Marker added");
    state.publish_snapshot();
    Ok(Json(id))
}

pub async fn add_random_marker(State(state): State<AppState>) -> Json<MarkerId> {
    let id = {
        let mut rng = rand::thread_rng();
        state.session.lock().add_random_listing(&mut rng)
    };
    state.publish_snapshot();
    Json(id)
}

// Slider input
pub async fn set_filter(
    State(state): State<AppState>,
    Json(payload): Json<FilterRequest>,
) -> ApiResult<MapSnapshot> {
    state
        .session
        .lock()
        .set_max_distance_km(payload.max_distance_km)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
    debug!(max_distance_km = payload.max_distance_km, "Distance filter changed");
    Ok(Json(state.publish_snapshot()))
}

// Browser geolocation result
pub async fn set_center(
    State(state): State<AppState>,
    Json(center): Json<LatLng>,
) -> ApiResult<MapSnapshot> {
    if !center.lat.is_finite() || !center.lng.is_finite() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Coordinates must be numbers"));
    }
    state.session.lock().set_center(center);
    info!(lat = center.lat, lng = center.lng, "Map centered on browser position");
    Ok(Json(state.publish_snapshot()))
}

pub async fn jump_to_preset(
    State(state): State<AppState>,
    AxumPath(city): AxumPath<String>,
) -> ApiResult<MapSnapshot> {
    let preset: Preset = city
        .parse()
        .map_err(|e: String| ApiError::new(StatusCode::NOT_FOUND, e))?;
    state.session.lock().apply_preset(preset);
    info!(city = %city, "Jumped to preset city");
    Ok(Json(state.publish_snapshot()))
}

pub async fn geocode_address(
    State(state): State<AppState>,
    Json(payload): Json<GeocodeRequest>,
) -> ApiResult<Located> {
    // runs detached so a client hanging up does not drop a lookup mid-flight
    let coordinator = state.coordinator.clone();
    let lookup = tokio::spawn(async move { coordinator.submit(&payload.address).await });
    let located = lookup.await.map_err(|e| {
        error!(error = %e, "Geocoding task failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Geocoding task failed")
    })??;
    Ok(Json(located))
}

// SSE stream of map events
pub async fn map_events_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let (tx, rx) = mpsc::channel(100);
    let mut event_receiver = state.events.subscribe();

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                received = event_receiver.recv() => match received {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "SSE client lagging, events dropped");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = tokio::time::sleep(Duration::from_secs(30)) => MapEvent::Heartbeat,
            };

            let sse_event = SseEvent::default()
                .json_data(&event)
                .unwrap_or_else(|_| SseEvent::default().data("Error serializing event"));

            if tx.send(Ok(sse_event)).await.is_err() {
                break; // Client disconnected
            }
        }
    });

    Sse::new(ReceiverStream::new(rx))
}
