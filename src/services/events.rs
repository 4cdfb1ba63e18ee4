//! Event system for lost-and-found state changes
//!
//! Services emit an event after every committed write. Nothing here is
//! delivered to end users; the bus feeds audit logging and any in-process
//! listener that wants to react to returns.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::db::{ClaimStatus, ItemKind};

/// Events emitted by services
#[derive(Debug, Clone)]
pub enum LostFoundEvent {
    ItemReported {
        item_id: i64,
        kind: ItemKind,
        reporter_user_id: i64,
    },
    ClaimSubmitted {
        claim_id: i64,
        found_id: i64,
        claimant_user_id: i64,
    },
    ClaimDecided {
        claim_id: i64,
        status: ClaimStatus,
        admin_user_id: i64,
    },
    ItemReturned {
        history_id: i64,
        claim_id: i64,
        found_id: i64,
        user_id: i64,
    },
}

/// Trait for event listeners
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &LostFoundEvent);
}

/// Event bus for broadcasting state changes
pub struct EventBus {
    sender: broadcast::Sender<LostFoundEvent>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: LostFoundEvent) {
        trace!(event = ?event, "Emitting event");
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LostFoundEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging event listener for audit trails
pub struct LoggingEventListener;

impl EventListener for LoggingEventListener {
    fn on_event(&self, event: &LostFoundEvent) {
        match event {
            LostFoundEvent::ItemReported {
                item_id,
                kind,
                reporter_user_id,
            } => {
                debug!(item_id, kind = %kind, reporter = reporter_user_id, "Item reported");
            }
            LostFoundEvent::ClaimSubmitted {
                claim_id,
                found_id,
                claimant_user_id,
            } => {
                info!(claim_id, found_id, claimant = claimant_user_id, "Claim submitted");
            }
            LostFoundEvent::ClaimDecided {
                claim_id,
                status,
                admin_user_id,
            } => {
                info!(claim_id, status = %status, admin = admin_user_id, "Claim decided");
            }
            LostFoundEvent::ItemReturned {
                history_id,
                claim_id,
                found_id,
                user_id,
            } => {
                info!(history_id, claim_id, found_id, user_id, "Item returned");
            }
        }
    }
}

/// Spawn a background task that logs all events
pub fn spawn_logging_listener(event_bus: Arc<EventBus>) -> tokio::task::JoinHandle<()> {
    let mut receiver = event_bus.subscribe();
    let listener = LoggingEventListener;

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => listener.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Event listener lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stopping listener");
                    break;
                }
            }
        }
    })
}
