//! In-process event bus
//!
//! Lets mounted observers (a navigation drawer, a profile screen) react to
//! profile changes without polling. The bus lives in the application's
//! composition root and is handed around explicitly; there is no global.

use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the broadcast channel; slow subscribers lag, they do not
/// block publishers
const CHANNEL_CAPACITY: usize = 16;

/// Events published on the bus
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A user's profile row changed
    ProfileUpdated {
        /// Whose profile changed
        user_id: Uuid,
    },
}

/// A typed publish/subscribe channel
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with no subscribers
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self { sender }
    }

    /// Subscribe to all events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Announce a profile change
    ///
    /// Publishing without subscribers is fine; the event is dropped.
    pub fn profile_updated(&self, user_id: Uuid) {
        let _ = self.sender.send(Event::ProfileUpdated { user_id });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
