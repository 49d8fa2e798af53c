use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::constants::{GEOCODED_MARKER_LABEL, RECENTER_DELAY_MS, TRANSPORT_ERROR_MESSAGE};
use crate::geo::LatLng;
use crate::geocoding::{GeocodeError, Geocoder};
use crate::markers::{Marker, MarkerId};
use crate::session::SessionHandle;
use crate::view::{MapView, Notification};

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Located {
    pub marker_id: MarkerId,
    pub center: LatLng,
    pub formatted_address: String,
}

/// Runs address lookups one at a time against the session.
pub struct GeocodeCoordinator<G, V> {
    session: SessionHandle,
    geocoder: G,
    view: V,
}

/// Puts the session back to `Idle` however the lookup ends, including when
/// the submitting task is dropped mid-request.
struct InFlightGuard<'a> {
    session: &'a SessionHandle,
    armed: bool,
}

impl InFlightGuard<'_> {
    /// The session already went back to `Idle` along with the result.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.lock().finish_geocoding();
        }
    }
}

impl<G: Geocoder, V: MapView> GeocodeCoordinator<G, V> {
    pub fn new(session: SessionHandle, geocoder: G, view: V) -> Self {
        Self {
            session,
            geocoder,
            view,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    #[cfg(test)]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Looks up `address` and drops a marker on it.
    ///
    /// Blank input and a submit while another lookup is running are rejected
    /// before anything is sent. Service and transport failures are reported
    /// to the view and leave markers and center untouched.
    pub async fn submit(&self, address: &str) -> Result<Located, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            debug!("Ignoring empty address");
            return Err(GeocodeError::InvalidInput);
        }

        if !self.session.lock().begin_geocoding() {
            info!(address = address, "Geocoding already in progress, rejecting submit");
            return Err(GeocodeError::ConcurrentRequestRejected);
        }
        let in_flight = InFlightGuard {
            session: &self.session,
            armed: true,
        };

        info!(address = address, "Geocoding address");
        let outcome = match self.geocoder.geocode(address).await {
            Ok(response) => response.into_first_result(),
            Err(e) => Err(e),
        };

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                drop(in_flight);
                return Err(self.report_failure(e));
            }
        };

        let center = result.geometry.location;
        let marker = Marker::new(center, GEOCODED_MARKER_LABEL, "", result.formatted_address.clone());
        let (marker_id, snapshot) = self.session.lock().complete_geocoding(marker);
        in_flight.disarm();

        info!(
            lat = center.lat,
            lng = center.lng,
            address = %result.formatted_address,
            "Address located"
        );
        self.view
            .recenter_after(center, Duration::from_millis(RECENTER_DELAY_MS));
        self.view.show_markers(snapshot);

        Ok(Located {
            marker_id,
            center,
            formatted_address: result.formatted_address,
        })
    }

    fn report_failure(&self, error: GeocodeError) -> GeocodeError {
        match error {
            GeocodeError::SemanticFailure { status, message } => {
                warn!(status = %status, message = %message, "Geocoder could not resolve address");
                self.view.notify(Notification::error(message.clone()));
                GeocodeError::SemanticFailure { status, message }
            }
            e => {
                error!(error = %e, "Geocoder transport error");
                self.view.notify(Notification::error(TRANSPORT_ERROR_MESSAGE));
                e
            }
        }
    }
}
