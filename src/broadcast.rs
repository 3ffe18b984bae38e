use std::sync::Arc;

use tokio::sync::broadcast;

use crate::models::Visitor;

/// Event name real-time clients listen for.
pub const NEW_VISITOR_EVENT: &str = "new-visitor";

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of freshly stored visitors to whoever is connected right now.
///
/// Each listener owns a receiver; dropping it unsubscribes. Nothing is
/// buffered for listeners that connect later.
#[derive(Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<Arc<Visitor>>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Visitor>> {
        self.sender.subscribe()
    }

    /// Deliver `visitor` to every current listener and return how many there
    /// were. Zero listeners is not an error.
    pub fn publish(&self, visitor: &Visitor) -> usize {
        self.sender.send(Arc::new(visitor.clone())).unwrap_or(0)
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
