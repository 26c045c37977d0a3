/// Subscriber handles
///
/// The hub keeps a `SubscriberSlot` per live subscriber (queue sender plus a
/// state publisher). The transport owns the matching `Subscription` and reads
/// events from it. Once the hub drops the slot the queue is closed: buffered
/// events can still be drained, then `recv` returns `None`.
use tokio::sync::{mpsc, watch};

use super::message::Event;

/// Subscriber ID (unique per hub)
pub type SubscriberId = u64;

/// Lifecycle of a subscriber
///
/// `Registered -> Active -> Evicted | Unregistered`; both end states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// Created, registration not yet processed by the hub loop
    Registered,
    /// In the live set, receiving broadcasts
    Active,
    /// Dropped because its queue was full during a broadcast
    Evicted,
    /// Removed on request, on disconnect or when the hub stopped
    Unregistered,
}

impl SubscriberState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriberState::Evicted | SubscriberState::Unregistered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberState::Registered => "registered",
            SubscriberState::Active => "active",
            SubscriberState::Evicted => "evicted",
            SubscriberState::Unregistered => "unregistered",
        }
    }
}

/// Hub-side half of a subscriber
#[derive(Debug)]
pub(crate) struct SubscriberSlot {
    pub(crate) id: SubscriberId,
    pub(crate) sender: mpsc::Sender<Event>,
    state: watch::Sender<SubscriberState>,
}

impl SubscriberSlot {
    pub(crate) fn set_state(&self, state: SubscriberState) {
        self.state.send_replace(state);
    }
}

/// Transport-side half of a subscriber
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<Event>,
    state: watch::Receiver<SubscriberState>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriberId, buffer: usize) -> (Self, SubscriberSlot) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let (state_tx, state_rx) = watch::channel(SubscriberState::Registered);

        (
            Self {
                id,
                receiver,
                state: state_rx,
            },
            SubscriberSlot {
                id,
                sender,
                state: state_tx,
            },
        )
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next queued event; `None` once the hub closed the queue and it is drained
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of `recv`
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }

    /// Events waiting in the queue
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }

    pub fn state(&self) -> SubscriberState {
        *self.state.borrow()
    }

    /// Wait until the hub has evicted or unregistered this subscriber
    pub async fn closed(&self) -> SubscriberState {
        let mut state = self.state.clone();
        let final_state = match state.wait_for(SubscriberState::is_terminal).await {
            Ok(current) => *current,
            // Slot dropped without a final state; only happens if the hub task died
            Err(_) => SubscriberState::Unregistered,
        };
        final_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_resolves_on_terminal_state() {
        let (subscription, slot) = Subscription::new(7, 4);
        assert_eq!(subscription.id(), 7);
        assert_eq!(subscription.state(), SubscriberState::Registered);

        slot.set_state(SubscriberState::Active);
        assert_eq!(subscription.state(), SubscriberState::Active);

        slot.set_state(SubscriberState::Evicted);
        assert_eq!(subscription.closed().await, SubscriberState::Evicted);
    }

    #[tokio::test]
    async fn test_closed_waits_for_later_unregister() {
        let (subscription, slot) = Subscription::new(3, 4);
        slot.set_state(SubscriberState::Active);

        let waiter = tokio::spawn(async move { subscription.closed().await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        slot.set_state(SubscriberState::Unregistered);
        assert_eq!(waiter.await.unwrap(), SubscriberState::Unregistered);
    }

    #[tokio::test]
    async fn test_buffered_events_survive_slot_drop() {
        let (mut subscription, slot) = Subscription::new(1, 2);
        slot.sender
            .try_send(Event::new(super::super::EventPayload::Update(serde_json::json!(1))))
            .unwrap();
        assert_eq!(subscription.queued(), 1);
        drop(slot);

        assert!(subscription.recv().await.is_some());
        assert!(subscription.recv().await.is_none());
        assert_eq!(subscription.closed().await, SubscriberState::Unregistered);
    }
}
