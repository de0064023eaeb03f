//! Broadcast hub for resource change events.

use std::fmt;

use serde_json::{json, Value};
use tokio::sync::broadcast;

/// Events a lagging listener may buffer before it starts losing the oldest.
pub const EVENT_BUFFER: usize = 64;

/// Resource family an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    User,
    Invoice,
    ExpenseAccount,
    Budget,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Invoice => "invoice",
            Self::ExpenseAccount => "expense_account",
            Self::Budget => "budget",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
    AttachmentAdded,
}

impl ChangeAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::AttachmentAdded => "attachment_added",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutation, ready to fan out to live listeners.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ResourceKind,
    pub action: ChangeAction,
    /// Projection of the affected resource, as the read API would return it.
    pub payload: Value,
}

impl ChangeEvent {
    #[must_use]
    pub const fn new(kind: ResourceKind, action: ChangeAction, payload: Value) -> Self {
        Self {
            kind,
            action,
            payload,
        }
    }

    /// Dotted event name, e.g. `invoice.created`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}.{}", self.kind, self.action)
    }

    /// Wire frame sent to listeners: `{"event": name, "data": payload}`.
    #[must_use]
    pub fn to_frame(&self) -> String {
        json!({ "event": self.name(), "data": self.payload }).to_string()
    }
}

/// Fan-out point for change events.
///
/// The hub owns the sending half of a broadcast channel; each listener holds
/// its own receiver. Listener count is derived from the channel itself, so
/// it can never drift from the set of live receivers.
#[derive(Debug)]
pub struct EventHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl EventHub {
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        Self { tx }
    }

    /// Publishes an event to all current listeners. With no listeners the
    /// event is dropped, which is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    /// Registers a new listener. Events published after this call are
    /// delivered to it.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Number of currently connected listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(EVENT_BUFFER)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(ResourceKind::Invoice, ChangeAction::Created, "invoice.created")]
    #[case(ResourceKind::ExpenseAccount, ChangeAction::AttachmentAdded, "expense_account.attachment_added")]
    #[case(ResourceKind::Budget, ChangeAction::Deleted, "budget.deleted")]
    #[case(ResourceKind::User, ChangeAction::Updated, "user.updated")]
    fn event_names_are_dotted(
        #[case] kind: ResourceKind,
        #[case] action: ChangeAction,
        #[case] expected: &str,
    ) {
        let event = ChangeEvent::new(kind, action, Value::Null);
        assert_eq!(event.name(), expected);
    }

    #[test]
    fn frame_wraps_name_and_payload() {
        let event = ChangeEvent::new(
            ResourceKind::Invoice,
            ChangeAction::Created,
            json!({ "id": "abc", "amount": 12.5 }),
        );
        let frame: Value = serde_json::from_str(&event.to_frame()).unwrap();
        assert_eq!(frame["event"], "invoice.created");
        assert_eq!(frame["data"]["amount"], 12.5);
    }

    #[tokio::test]
    async fn every_listener_sees_every_event() {
        let hub = EventHub::default();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.listener_count(), 2);

        hub.publish(ChangeEvent::new(
            ResourceKind::Budget,
            ChangeAction::Created,
            json!({ "id": 1 }),
        ));

        assert_eq!(a.recv().await.unwrap().name(), "budget.created");
        assert_eq!(b.recv().await.unwrap().name(), "budget.created");
    }

    #[test]
    fn dropping_a_listener_updates_the_count() {
        let hub = EventHub::default();
        let rx = hub.subscribe();
        assert_eq!(hub.listener_count(), 1);
        drop(rx);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn publishing_with_no_listeners_is_fine() {
        let hub = EventHub::default();
        hub.publish(ChangeEvent::new(
            ResourceKind::User,
            ChangeAction::Deleted,
            Value::Null,
        ));
    }
}
