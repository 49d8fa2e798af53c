use serde::{Deserialize, Serialize};

use crate::geo::{is_visible, LatLng};

/// Stable marker identifier, assigned by [`MarkerStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub u64);

// Structure for a single point on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub position: LatLng,
    pub label: String,
    pub icon: String,       // Icon URL, empty for the map widget's default pin
    pub info_html: String,  // Info-window content
}

impl Marker {
    /// Builds a marker that has not been stored yet. Its id is replaced on insertion.
    pub fn new(
        position: LatLng,
        label: impl Into<String>,
        icon: impl Into<String>,
        info_html: impl Into<String>,
    ) -> Self {
        Self {
            id: MarkerId(0),
            position,
            label: label.into(),
            icon: icon.into(),
            info_html: info_html.into(),
        }
    }
}

/// Every marker known to the session, in insertion order.
#[derive(Debug, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    next_id: u64,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `marker` and returns the id it was given. Ids are never reused.
    pub fn add(&mut self, mut marker: Marker) -> MarkerId {
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        marker.id = id;
        self.markers.push(marker);
        id
    }

    /// Markers within `max_distance_km` of `center`, keeping insertion order.
    pub fn recompute_visible(&self, center: LatLng, max_distance_km: f64) -> Vec<Marker> {
        self.markers
            .iter()
            .filter(|m| is_visible(m, &center, max_distance_km))
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        // ids are assigned in increasing order, so the vec is sorted by id
        self.markers
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|idx| &self.markers[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
