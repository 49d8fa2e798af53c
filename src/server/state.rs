use std::sync::Arc;

use super::events::EventHub;
use crate::coordinator::GeocodeCoordinator;
use crate::geocoding::GoogleGeocoder;
use crate::session::{MapSnapshot, SessionHandle};
use crate::view::MapView;

// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub coordinator: Arc<GeocodeCoordinator<GoogleGeocoder, EventHub>>,
    pub events: EventHub,
}

impl AppState {
    pub fn new(session: SessionHandle, geocoder: GoogleGeocoder, events: EventHub) -> Self {
        let coordinator = GeocodeCoordinator::new(session.clone(), geocoder, events.clone());
        Self {
            session,
            coordinator: Arc::new(coordinator),
            events,
        }
    }

    /// Pushes the current visible set to every page and returns it.
    pub fn publish_snapshot(&self) -> MapSnapshot {
        let snapshot = self.session.lock().snapshot();
        self.events.show_markers(snapshot.clone());
        snapshot
    }
}
