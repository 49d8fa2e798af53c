use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer};
use tracing::info;

pub mod events;
pub mod handlers;
pub mod state;

use self::state::AppState;
use handlers::{
    add_marker, add_random_marker, geocode_address, get_all_markers, get_session,
    get_visible_markers, index_html, jump_to_preset, map_events_stream, script_js, set_center,
    set_filter, style_css,
};

// Create the main application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_html))
        .route("/style.css", get(style_css))
        .route("/script.js", get(script_js))
        .route("/api/session", get(get_session))
        .route("/api/markers", get(get_visible_markers).post(add_marker))
        .route("/api/markers/all", get(get_all_markers))
        .route("/api/markers/random", post(add_random_marker))
        .route("/api/filter", post(set_filter))
        .route("/api/center", post(set_center))
        .route("/api/presets/:city", post(jump_to_preset))
        .route("/api/geocode", post(geocode_address))
        .route("/api/events", get(map_events_stream))
        .layer(
            ServiceBuilder::new()
                .layer(CompressionLayer::new().gzip(true))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, port: u16) -> Result<()> {
    let app = create_app(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server started at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Ctrl-C received, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use crate::geocoding::GoogleGeocoder;
    use crate::session::{MapSession, SessionHandle};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use super::events::{EventHub, MapEvent};
    use http_body_util::BodyExt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    const EIFFEL: LatLng = LatLng::new(48.858370, 2.294481);

    /// Serves `body` for every geocoding request and returns its URL.
    async fn fake_geocoder(body: serde_json::Value) -> String {
        let router = Router::new().route(
            "/geocode",
            get(move || {
                let body = body.clone();
                async move { axum::Json(body) }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/geocode", addr)
    }

    async fn test_state(geocoder_url: &str, seed: usize) -> AppState {
        let mut session = MapSession::new(EIFFEL, 100.0).unwrap();
        session.seed_listings(seed, &mut StdRng::seed_from_u64(9));
        let geocoder = GoogleGeocoder::new(geocoder_url, "test").unwrap();
        AppState::new(SessionHandle::new(session), geocoder, EventHub::new(16))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_index_is_served() {
        let state = test_state("http://127.0.0.1:9/geocode", 0).await;
        let response = create_app(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_snapshot() {
        let state = test_state("http://127.0.0.1:9/geocode", 20).await;
        let (status, json) = call(create_app(state), "GET", "/api/session", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_markers"], 20);
        assert_eq!(json["visible"].as_array().unwrap().len(), 20);
        assert_eq!(json["max_distance_km"], 100.0);
        assert_eq!(json["geocoding_in_flight"], false);
    }

    #[tokio::test]
    async fn test_filter_slider() {
        let state = test_state("http://127.0.0.1:9/geocode", 20).await;
        let app = create_app(state.clone());

        let (status, json) = call(app.clone(), "POST", "/api/filter", Some(serde_json::json!({"max_distance_km": 0.0}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["visible"].as_array().unwrap().is_empty());

        let (status, json) = call(app.clone(), "POST", "/api/filter", Some(serde_json::json!({"max_distance_km": -3.0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "error");
        assert_eq!(state.session.lock().max_distance_km(), 0.0);
    }

    #[tokio::test]
    async fn test_presets() {
        let state = test_state("http://127.0.0.1:9/geocode", 20).await;
        let app = create_app(state.clone());

        let (status, json) = call(app.clone(), "POST", "/api/presets/marseille", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["center"]["lat"], 43.296482);
        // only the Marseille listing is within 100 km
        assert_eq!(json["visible"].as_array().unwrap().len(), 1);
        assert_eq!(json["total_markers"], 21);

        let (status, _) = call(app, "POST", "/api/presets/lyon", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_and_list_markers() {
        let state = test_state("http://127.0.0.1:9/geocode", 0).await;
        let app = create_app(state);

        let (status, id) = call(
            app.clone(),
            "POST",
            "/api/markers",
            Some(serde_json::json!({"lat": 48.86, "lng": 2.30, "label": "here"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(id, 1);

        call(app.clone(), "POST", "/api/markers", Some(serde_json::json!({"lat": 43.3, "lng": 5.4}))).await;
        let (_, random_id) = call(app.clone(), "POST", "/api/markers/random", None).await;
        assert_eq!(random_id, 3);

        let (_, visible) = call(app.clone(), "GET", "/api/markers", None).await;
        let (_, all) = call(app, "GET", "/api/markers/all", None).await;
        assert_eq!(visible.as_array().unwrap().len(), 2);
        assert_eq!(all.as_array().unwrap().len(), 3);
        assert_eq!(all[2]["label"], "Prix 3");
    }

    #[tokio::test]
    async fn test_geocode_success() {
        let url = fake_geocoder(serde_json::json!({
            "status": "OK",
            "results": [{
                "geometry": {"location": {"lat": 48.85, "lng": 2.35}},
                "formatted_address": "Paris, France"
            }]
        }))
        .await;
        let state = test_state(&url, 0).await;
        let mut events = state.events.subscribe();

        let (status, json) = call(
            create_app(state.clone()),
            "POST",
            "/api/geocode",
            Some(serde_json::json!({"address": "Paris"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["formatted_address"], "Paris, France");

        let session = state.session.lock();
        assert_eq!(session.center(), LatLng::new(48.85, 2.35));
        assert_eq!(session.markers().len(), 1);
        assert!(!session.is_geocoding());
        drop(session);

        match events.recv().await.unwrap() {
            MapEvent::MarkersChanged(snapshot) => assert_eq!(snapshot.visible.len(), 1),
            other => panic!("Expected MarkersChanged, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_geocode_failures() {
        let url = fake_geocoder(serde_json::json!({"status": "ZERO_RESULTS", "error_message": "no match"})).await;
        let state = test_state(&url, 0).await;
        let mut events = state.events.subscribe();
        let app = create_app(state.clone());

        let (status, json) = call(app.clone(), "POST", "/api/geocode", Some(serde_json::json!({"address": "zzzz"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["message"], "no match");
        match events.recv().await.unwrap() {
            MapEvent::Notification(n) => assert_eq!(n.message, "no match"),
            other => panic!("Expected Notification, got {:?}", other),
        }

        let (status, _) = call(app, "POST", "/api/geocode", Some(serde_json::json!({"address": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let session = state.session.lock();
        assert!(session.markers().is_empty());
        assert_eq!(session.center(), EIFFEL);
    }

    #[tokio::test]
    async fn test_geocode_finishes_after_client_hangs_up() {
        let hit = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let router = Router::new().route(
            "/geocode",
            get({
                let (hit, release) = (hit.clone(), release.clone());
                move || async move {
                    hit.notify_one();
                    release.notified().await;
                    axum::Json(serde_json::json!({
                        "status": "OK",
                        "results": [{
                            "geometry": {"location": {"lat": 43.3, "lng": 5.4}},
                            "formatted_address": "Marseille, France"
                        }]
                    }))
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/geocode", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let state = test_state(&url, 0).await;
        let mut events = state.events.subscribe();
        let request = tokio::spawn(call(
            create_app(state.clone()),
            "POST",
            "/api/geocode",
            Some(serde_json::json!({"address": "Marseille"})),
        ));

        hit.notified().await;
        request.abort();
        let _ = request.await;
        release.notify_one();

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, MapEvent::MarkersChanged(_)));

        let session = state.session.lock();
        assert_eq!(session.center(), LatLng::new(43.3, 5.4));
        assert_eq!(session.markers().len(), 1);
        assert!(!session.is_geocoding());
    }

    #[tokio::test]
    async fn test_geocode_unreachable_service() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/geocode", listener.local_addr().unwrap());
        drop(listener);

        let state = test_state(&url, 0).await;
        let (status, _) = call(create_app(state.clone()), "POST", "/api/geocode", Some(serde_json::json!({"address": "Lyon"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!state.session.lock().is_geocoding());
    }
}
