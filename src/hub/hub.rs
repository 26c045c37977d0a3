/// Broadcast hub - single-owner fan-out loop
///
/// One task owns the live subscriber set. Producers and transports talk to it
/// only through a bounded command inbox:
/// - register / unregister subscriber slots
/// - publish events, fanned out to every live subscriber with `try_send`
/// - stop, which closes every subscriber and ends the loop
///
/// A subscriber whose queue is full when an event arrives is evicted on the
/// spot, so one slow consumer never delays the others. Events reach each
/// subscriber in the order the loop accepted them.
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::config::HubConfig;
use crate::errors::{HubError, PayloadError};
use crate::logger::{self, LogTag};

use super::message::{Event, EventPayload};
use super::metrics::{HubMetrics, HubMetricsSnapshot};
use super::subscriber::{SubscriberId, SubscriberSlot, SubscriberState, Subscription};

// ============================================================================
// HUB TYPES
// ============================================================================

type LiveSet = Arc<RwLock<HashMap<SubscriberId, SubscriberSlot>>>;

enum HubCommand {
    Register {
        slot: SubscriberSlot,
        ack: oneshot::Sender<()>,
    },
    Unregister {
        id: SubscriberId,
        ack: oneshot::Sender<()>,
    },
    Publish(Event),
    Stop,
}

// ============================================================================
// HUB
// ============================================================================

pub struct Hub {
    /// Inbox of the loop task
    commands: mpsc::Sender<HubCommand>,

    /// Live subscribers; written only by the loop, read by anyone
    subscribers: LiveSet,

    next_id: AtomicU64,

    /// Cleared by `stop()`; submissions fail fast afterwards
    running: AtomicBool,

    subscriber_buffer: usize,

    metrics: Arc<HubMetrics>,

    /// Loop task; held across the join so concurrent `stop()` callers all wait for it
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Hub {
    /// Create the hub and spawn its loop; must be called from within a tokio runtime
    pub fn start(config: HubConfig) -> Arc<Self> {
        let (commands, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let subscribers: LiveSet = Arc::new(RwLock::new(HashMap::new()));
        let metrics = HubMetrics::new();

        let handle = tokio::spawn(run_loop(inbox, subscribers.clone(), metrics.clone()));

        logger::debug(
            LogTag::Hub,
            &format!(
                "Hub started (inbox={}, subscriber_buffer={})",
                config.inbox_capacity, config.subscriber_buffer
            ),
        );

        Arc::new(Self {
            commands,
            subscribers,
            next_id: AtomicU64::new(1),
            running: AtomicBool::new(true),
            subscriber_buffer: config.subscriber_buffer,
            metrics,
            handle: Mutex::new(Some(handle)),
        })
    }

    async fn submit(&self, command: HubCommand) -> Result<(), HubError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(HubError::Stopped);
        }
        self.commands
            .send(command)
            .await
            .map_err(|_| HubError::Stopped)
    }

    /// Create a subscriber and register it; returns once the subscriber is live
    pub async fn subscribe(&self) -> Result<Subscription, HubError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (subscription, slot) = Subscription::new(id, self.subscriber_buffer);
        let (ack, registered) = oneshot::channel();

        self.submit(HubCommand::Register { slot, ack }).await?;
        registered.await.map_err(|_| HubError::Stopped)?;
        Ok(subscription)
    }

    /// Remove a subscriber and close its queue; unknown ids are ignored
    pub async fn unregister(&self, id: SubscriberId) -> Result<(), HubError> {
        let (ack, done) = oneshot::channel();
        self.submit(HubCommand::Unregister { id, ack }).await?;
        done.await.map_err(|_| HubError::Stopped)
    }

    /// Submit a prepared event for fan-out
    pub async fn publish(&self, event: Event) -> Result<(), HubError> {
        self.submit(HubCommand::Publish(event)).await
    }

    /// Build an event stamped now and submit it
    pub async fn broadcast(&self, scope: Option<&str>, payload: EventPayload) -> Result<(), HubError> {
        let event = match scope {
            Some(scope) => Event::scoped(scope, payload),
            None => Event::new(payload),
        };
        self.publish(event).await
    }

    /// Untyped producer entry point: serialize `data`, check it fits `kind`, broadcast
    pub async fn broadcast_json<T: Serialize>(
        &self,
        kind: &str,
        scope: Option<&str>,
        data: T,
    ) -> Result<(), HubError> {
        let value = serde_json::to_value(data).map_err(PayloadError::Serialize)?;
        let payload = EventPayload::from_code(kind, value)?;
        self.broadcast(scope, payload).await
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Snapshot of live subscriber ids, ascending
    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        let mut ids: Vec<SubscriberId> = self.subscribers.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> HubMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stop the loop after it handles everything submitted so far, then join it
    ///
    /// Every subscriber ends `Unregistered`. Concurrent callers all return only
    /// after the loop has exited; calling it again later is a no-op.
    pub async fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            // The loop only exits on Stop or when all senders are gone
            let _ = self.commands.send(HubCommand::Stop).await;
        }

        let mut handle = self.handle.lock().await;
        if let Some(task) = handle.as_mut() {
            if let Err(e) = task.await {
                logger::error(LogTag::Hub, &format!("Hub loop failed: {}", e));
            }
            *handle = None;
        }
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("running", &self.is_running())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// LOOP
// ============================================================================

async fn run_loop(
    mut inbox: mpsc::Receiver<HubCommand>,
    subscribers: LiveSet,
    metrics: Arc<HubMetrics>,
) {
    while let Some(command) = inbox.recv().await {
        match command {
            HubCommand::Register { slot, ack } => {
                let id = slot.id;
                slot.set_state(SubscriberState::Active);
                let active = {
                    let mut live = subscribers.write();
                    live.insert(id, slot);
                    live.len()
                };
                metrics.subscriber_registered();
                logger::debug(
                    LogTag::Hub,
                    &format!("Subscriber {} registered (active={})", id, active),
                );
                let _ = ack.send(());
            }
            HubCommand::Unregister { id, ack } => {
                let removed = subscribers.write().remove(&id);
                if let Some(slot) = removed {
                    slot.set_state(SubscriberState::Unregistered);
                    metrics.subscriber_unregistered();
                    logger::debug(LogTag::Hub, &format!("Subscriber {} unregistered", id));
                }
                let _ = ack.send(());
            }
            HubCommand::Publish(event) => {
                metrics.event_published();
                deliver(&subscribers, &metrics, event);
            }
            HubCommand::Stop => break,
        }
    }

    // Commands that raced with stop are discarded; pending acks are dropped
    inbox.close();
    while inbox.try_recv().is_ok() {}

    let closed: Vec<SubscriberSlot> = subscribers.write().drain().map(|(_, slot)| slot).collect();
    for slot in &closed {
        slot.set_state(SubscriberState::Unregistered);
        metrics.subscriber_unregistered();
    }

    logger::debug(
        LogTag::Hub,
        &format!("Hub stopped ({} subscribers closed)", closed.len()),
    );
}

fn deliver(subscribers: &LiveSet, metrics: &HubMetrics, event: Event) {
    let mut dropped: Vec<(SubscriberId, SubscriberState)> = Vec::new();
    let mut delivered = 0u64;

    {
        let live = subscribers.read();
        if live.is_empty() {
            return;
        }

        for (id, slot) in live.iter() {
            match slot.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    dropped.push((*id, SubscriberState::Evicted));
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dropped.push((*id, SubscriberState::Unregistered));
                }
            }
        }
    }

    metrics.messages_delivered(delivered);

    if dropped.is_empty() {
        return;
    }

    let mut live = subscribers.write();
    for (id, state) in dropped {
        let Some(slot) = live.remove(&id) else {
            continue;
        };
        slot.set_state(state);

        if state == SubscriberState::Evicted {
            metrics.subscriber_evicted();
            logger::warning(
                LogTag::Hub,
                &format!("Subscriber {} evicted (queue full on '{}')", id, event.kind()),
            );
        } else {
            metrics.subscriber_unregistered();
            logger::debug(LogTag::Hub, &format!("Subscriber {} went away", id));
        }
    }
}
