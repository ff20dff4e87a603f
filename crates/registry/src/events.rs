//! Lifecycle event bus: subscribers register by event kind; emission must
//! never block the command reader, so publishing is a non-blocking
//! broadcast send.

use rrcp_core::{EventKind, LifecycleEvent};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Emit an event to all subscribers. Never blocks: a lagging subscriber
    /// drops events rather than stalling the publisher.
    pub fn publish(&self, event: LifecycleEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A connection's subscription: which session it cares about, and which
/// event kinds (empty means "all kinds are of interest but session-scoped").
#[derive(Debug, Clone, Default)]
pub struct Subscription {
    pub kinds: Vec<EventKind>,
}

impl Subscription {
    pub fn parse(csv: &str) -> Self {
        let kinds = csv.split(',').map(str::trim).filter(|s| !s.is_empty()).filter_map(EventKind::parse).collect();
        Self { kinds }
    }

    pub fn admits(&self, event: &LifecycleEvent) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&event.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_parses_csv_event_kinds() {
        let sub = Subscription::parse("route_added,config_applied");
        assert_eq!(sub.kinds, vec![EventKind::RouteAdded, EventKind::ConfigApplied]);
    }

    #[test]
    fn empty_subscription_admits_everything() {
        let sub = Subscription::default();
        let event = LifecycleEvent::config_applied("s1".into());
        assert!(sub.admits(&event));
    }

    #[test]
    fn subscription_filters_by_kind() {
        let sub = Subscription::parse("route_added");
        let admitted = LifecycleEvent::route_added("s1".into(), "r1".into());
        let rejected = LifecycleEvent::config_applied("s1".into());
        assert!(sub.admits(&admitted));
        assert!(!sub.admits(&rejected));
    }
}
