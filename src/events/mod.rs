//! Event Dispatch module
//!
//! Delivers committed domain events to in-process subscribers. The gate
//! hands events over only after the store has saved the unit of work
//! they belong to; nothing in here ever sees uncommitted events.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::DomainEvent;

/// Receives the events of a committed unit of work, in queue order
pub trait EventDispatcher: Send + Sync {
    fn dispatch(&self, events: Vec<DomainEvent>);
}

/// Broadcast-backed event bus
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventDispatcher for EventBus {
    fn dispatch(&self, events: Vec<DomainEvent>) {
        for event in events {
            debug!(
                event_type = event.event_type(),
                entity_kind = %event.entity_kind(),
                entity_key = %event.entity_key(),
                "Dispatching domain event"
            );

            // No subscribers is not an error
            if self.sender.send(event).is_err() {
                debug!("No event subscribers");
            }
        }
    }
}

/// Spawn a task that logs every event published on the bus
pub fn spawn_event_logger(mut receiver: broadcast::Receiver<DomainEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    info!(
                        event_type = event.event_type(),
                        entity_kind = %event.entity_kind(),
                        entity_key = %event.entity_key(),
                        "Domain event"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event logger lagged {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Event bus closed, logger stopping");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::War;
    use chrono::Utc;

    fn war(id: i64) -> War {
        War {
            id,
            begin_day: Utc::now(),
            duration_secs: 1,
        }
    }

    #[test]
    fn test_dispatch_preserves_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.dispatch(vec![
            DomainEvent::WarCreated { war: war(1) },
            DomainEvent::WarDeleted { war: war(1) },
        ]);

        assert_eq!(rx.try_recv().unwrap().event_type(), "WarCreated");
        assert_eq!(rx.try_recv().unwrap().event_type(), "WarDeleted");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dispatch_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        bus.dispatch(vec![DomainEvent::WarCreated { war: war(1) }]);
    }

    #[tokio::test]
    async fn test_event_logger_stops_when_bus_dropped() {
        let bus = EventBus::new(4);
        let handle = spawn_event_logger(bus.subscribe());

        bus.dispatch(vec![DomainEvent::WarCreated { war: war(3) }]);
        drop(bus);

        handle.await.unwrap();
    }
}
