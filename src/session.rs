use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::geo::LatLng;
use crate::listings::{add_random, seed, Preset};
use crate::markers::{Marker, MarkerId, MarkerStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    InFlight,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Distance must be a non-negative number of km, got {0}")]
    InvalidDistance(f64),
}

/// What the map page needs to draw itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSnapshot {
    pub center: LatLng,
    pub max_distance_km: f64,
    pub geocoding_in_flight: bool,
    pub total_markers: usize,
    pub visible: Vec<Marker>,
}

/// All mutable state of the map page: markers, focal point, distance filter
/// and the geocoding request flag.
#[derive(Debug)]
pub struct MapSession {
    markers: MarkerStore,
    center: LatLng,
    max_distance_km: f64,
    request_state: RequestState,
}

impl MapSession {
    pub fn new(center: LatLng, max_distance_km: f64) -> Result<Self, SessionError> {
        validate_distance(max_distance_km)?;
        Ok(Self {
            markers: MarkerStore::new(),
            center,
            max_distance_km,
            request_state: RequestState::Idle,
        })
    }

    /// Seeds `count` synthetic listings around the current center.
    pub fn seed_listings<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        seed(&mut self.markers, self.center, count, rng);
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn set_center(&mut self, center: LatLng) {
        self.center = center;
    }

    pub fn max_distance_km(&self) -> f64 {
        self.max_distance_km
    }

    pub fn set_max_distance_km(&mut self, km: f64) -> Result<(), SessionError> {
        validate_distance(km)?;
        self.max_distance_km = km;
        Ok(())
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    pub fn add_marker(&mut self, marker: Marker) -> MarkerId {
        self.markers.add(marker)
    }

    pub fn add_random_listing<R: Rng + ?Sized>(&mut self, rng: &mut R) -> MarkerId {
        add_random(&mut self.markers, self.center, rng)
    }

    /// Jumps to a preset city and drops its showcase listing.
    pub fn apply_preset(&mut self, preset: Preset) -> MarkerId {
        self.center = preset.center();
        self.markers.add(preset.listing())
    }

    pub fn visible(&self) -> Vec<Marker> {
        self.markers.recompute_visible(self.center, self.max_distance_km)
    }

    pub fn snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            center: self.center,
            max_distance_km: self.max_distance_km,
            geocoding_in_flight: self.is_geocoding(),
            total_markers: self.markers.len(),
            visible: self.visible(),
        }
    }

    pub fn request_state(&self) -> RequestState {
        self.request_state
    }

    pub fn is_geocoding(&self) -> bool {
        self.request_state() == RequestState::InFlight
    }

    /// Moves `Idle -> InFlight`. Returns false if a request is already running.
    pub fn begin_geocoding(&mut self) -> bool {
        match self.request_state {
            RequestState::Idle => {
                self.request_state = RequestState::InFlight;
                true
            }
            RequestState::InFlight => false,
        }
    }

    pub fn finish_geocoding(&mut self) {
        self.request_state = RequestState::Idle;
    }

    /// Applies a resolved address: recenters, drops `marker` there and goes
    /// back to `Idle` in one step.
    pub fn complete_geocoding(&mut self, marker: Marker) -> (MarkerId, MapSnapshot) {
        self.center = marker.position;
        let id = self.markers.add(marker);
        self.finish_geocoding();
        (id, self.snapshot())
    }
}

fn validate_distance(km: f64) -> Result<(), SessionError> {
    if km.is_finite() && km >= 0.0 {
        Ok(())
    } else {
        Err(SessionError::InvalidDistance(km))
    }
}

/// Shared handle to the single session of this process.
#[derive(Debug, Clone)]
pub struct SessionHandle(Arc<Mutex<MapSession>>);

impl SessionHandle {
    pub fn new(session: MapSession) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    /// Locks the session. A panic while holding the lock does not leave the
    /// session unusable: every mutation keeps it consistent.
    pub fn lock(&self) -> MutexGuard<'_, MapSession> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
