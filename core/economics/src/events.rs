// o2ul/core/economics/src/events.rs

//! Fan-out of UltraStable events to any number of subscribers.
//!
//! Channels are bounded `tokio::sync::broadcast` queues: publishing never
//! waits, and a subscriber that falls behind loses its oldest events instead
//! of slowing the producer or other subscribers.

use crate::seigniorage::{AdjustmentDecision, AppliedAdjustment};
use parking_lot::RwLock;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

/// Default per-subscriber buffer
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Published once per processed update cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueUpdate {
    pub decision: AdjustmentDecision,
    pub target_value: U256,
    pub current_value: U256,
    /// Unix seconds of the cycle
    pub timestamp: u64,
}

pub struct EventNotifier {
    updates: RwLock<Option<broadcast::Sender<ValueUpdate>>>,
    adjustments: RwLock<Option<broadcast::Sender<AppliedAdjustment>>>,
}

impl EventNotifier {
    pub fn new(capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(capacity.max(1));
        let (adjustments, _) = broadcast::channel(capacity.max(1));
        Self {
            updates: RwLock::new(Some(updates)),
            adjustments: RwLock::new(Some(adjustments)),
        }
    }

    /// Returns how many subscribers the event reached
    pub fn publish_update(&self, update: ValueUpdate) -> usize {
        publish(&self.updates, update)
    }

    pub fn publish_adjustment(&self, adjustment: AppliedAdjustment) -> usize {
        publish(&self.adjustments, adjustment)
    }

    pub fn subscribe_updates(&self) -> Subscription<ValueUpdate> {
        subscribe(&self.updates)
    }

    pub fn subscribe_adjustments(&self) -> Subscription<AppliedAdjustment> {
        subscribe(&self.adjustments)
    }

    /// End every subscription. Later publishes are dropped and later
    /// subscriptions start out closed.
    pub fn close(&self) {
        self.updates.write().take();
        self.adjustments.write().take();
    }

    pub fn is_closed(&self) -> bool {
        self.updates.read().is_none()
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

fn publish<T: Clone>(sender: &RwLock<Option<broadcast::Sender<T>>>, event: T) -> usize {
    match sender.read().as_ref() {
        // Err only means nobody is listening
        Some(tx) => tx.send(event).unwrap_or(0),
        None => 0,
    }
}

fn subscribe<T: Clone>(sender: &RwLock<Option<broadcast::Sender<T>>>) -> Subscription<T> {
    Subscription {
        receiver: sender.read().as_ref().map(|tx| tx.subscribe()),
    }
}

/// Handle to one subscriber's queue. Dropping it unsubscribes.
pub struct Subscription<T> {
    receiver: Option<broadcast::Receiver<T>>,
}

impl<T: Clone> Subscription<T> {
    /// Next event, or `None` once unsubscribed or the notifier closed
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Subscriber fell behind, dropped oldest events");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Next queued event without waiting
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Subscriber fell behind, dropped oldest events");
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    pub fn unsubscribe(&mut self) {
        self.receiver = None;
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}
