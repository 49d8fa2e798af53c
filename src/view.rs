use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geo::LatLng;
use crate::session::MapSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Error,
}

/// A message for the user, shown as a snackbar on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Whatever draws the map. The core only tells it what to show.
pub trait MapView: Send + Sync {
    /// The visible marker set or the center changed.
    fn show_markers(&self, snapshot: MapSnapshot);

    /// Pan to `center` once `delay` has passed. Must be a no-op if the view is
    /// gone by then.
    fn recenter_after(&self, center: LatLng, delay: Duration);

    fn notify(&self, notification: Notification);
}

impl<T: MapView + ?Sized> MapView for Arc<T> {
    fn show_markers(&self, snapshot: MapSnapshot) {
        (**self).show_markers(snapshot)
    }

    fn recenter_after(&self, center: LatLng, delay: Duration) {
        (**self).recenter_after(center, delay)
    }

    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}
