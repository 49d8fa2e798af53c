use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod constants;
mod coordinator;
mod geo;
mod geocoding;
mod listings;
mod markers;
mod server;
mod session;
mod settings;
mod utils;
mod view;

use constants::EVENT_CHANNEL_CAPACITY;
use geocoding::GoogleGeocoder;
use server::events::EventHub;
use server::state::AppState;
use server::start_server;
use session::{MapSession, SessionHandle};
use settings::{Settings, API_KEY_ENV};

fn init_logging() {
    // Defaults to INFO if RUST_LOG is not set
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    info!("EstateMap v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().context("Failed to load settings")?;
    if !Settings::config_path().exists() {
        match settings.save() {
            Ok(()) => info!(path = %Settings::config_path().display(), "Wrote default configuration"),
            Err(e) => warn!("Could not write default configuration: {:#}", e),
        }
    }
    if settings.api_key.is_empty() {
        warn!("No geocoding API key configured, set {} or api_key in the config file", API_KEY_ENV);
    }

    let mut session = MapSession::new(settings.center(), settings.max_distance_km)
        .context("Invalid distance filter in settings")?;
    session.seed_listings(settings.seed_markers, &mut rand::thread_rng());
    if session.markers().is_empty() {
        info!("Starting without synthetic listings");
    } else {
        info!(
            markers = session.markers().len(),
            visible = session.visible().len(),
            "Seeded synthetic listings"
        );
    }
    let center = session.center();
    info!(
        lat = center.lat,
        lng = center.lng,
        max_distance_km = session.max_distance_km(),
        "Map session ready"
    );

    let geocoder = GoogleGeocoder::new(settings.geocode_url.clone(), settings.api_key.clone())
        .context("Failed to create geocoding client")?;
    let state = AppState::new(
        SessionHandle::new(session),
        geocoder,
        EventHub::new(EVENT_CHANNEL_CAPACITY),
    );

    if settings.auto_open_browser {
        let url = format!("http://127.0.0.1:{}", settings.port);
        if let Err(e) = utils::open_browser(&url) {
            warn!("Failed to open browser: {:#}", e);
        }
    }

    start_server(state, settings.port).await
}
