use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::geo::LatLng;
use crate::session::MapSnapshot;
use crate::view::{MapView, Notification};

// SSE event types, serialized as {"event_type": ..., "data": ...}
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", content = "data", rename_all = "snake_case")]
pub enum MapEvent {
    MarkersChanged(MapSnapshot),
    PanTo(LatLng),
    Notification(Notification),
    Heartbeat,
}

/// Fan-out of map events to every connected page.
#[derive(Clone)]
pub struct EventHub {
    sender: Arc<broadcast::Sender<MapEvent>>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: MapEvent) {
        // no subscribers is fine, the page fetches a snapshot when it connects
        let _ = self.sender.send(event);
    }
}

impl MapView for EventHub {
    fn show_markers(&self, snapshot: MapSnapshot) {
        self.publish(MapEvent::MarkersChanged(snapshot));
    }

    fn recenter_after(&self, center: LatLng, delay: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, dropping recenter request");
            return;
        };

        let sender = Arc::downgrade(&self.sender);
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            match sender.upgrade() {
                Some(sender) => {
                    let _ = sender.send(MapEvent::PanTo(center));
                }
                None => debug!("Map view closed before recenter fired"),
            }
        });
    }

    fn notify(&self, notification: Notification) {
        self.publish(MapEvent::Notification(notification));
    }
}
