use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Weak,
    },
};

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus is closed")]
    Closed,
}

/// Invoked by the bus for every payload published on the subscribed topic.
pub type Handler = Arc<dyn Fn(&[u8]) + Send + Sync>;

pub trait Bus: Send + Sync {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BusError>;

    fn subscribe(&self, topic: &str, handler: Handler) -> Result<Subscription, BusError>;
}

/// Keeps a handler registered until dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    topic: String,
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Subscription {
        Subscription {
            topic: topic.into(),
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
            debug!(topic = %self.topic, "unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Default)]
struct Topics {
    handlers: DashMap<String, HashMap<u64, Handler>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

/// In-process bus. Clones share the same topics.
#[derive(Clone, Default)]
pub struct LocalBus {
    topics: Arc<Topics>,
}

impl LocalBus {
    pub fn new() -> LocalBus {
        LocalBus::default()
    }

    /// Rejects every later publish and subscribe, like a dropped broker
    /// connection.
    pub fn close(&self) {
        self.topics.closed.store(true, Ordering::SeqCst);
        self.topics.handlers.clear();
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.handlers.get(topic).map_or(0, |handlers| handlers.len())
    }
}

impl Bus for LocalBus {
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BusError> {
        if self.topics.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }

        // Snapshot so handlers never run under the shard lock.
        let handlers: Vec<Handler> = match self.topics.handlers.get(topic) {
            Some(handlers) => handlers.values().cloned().collect(),
            None => Vec::new(),
        };

        trace!(topic, subscribers = handlers.len(), "dispatching");
        for handler in handlers {
            handler(payload);
        }
        Ok(())
    }

    fn subscribe(&self, topic: &str, handler: Handler) -> Result<Subscription, BusError> {
        if self.topics.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }

        let id = self.topics.next_id.fetch_add(1, Ordering::Relaxed);
        self.topics.handlers
            .entry(topic.to_owned())
            .or_default()
            .insert(id, handler);
        debug!(topic, id, "subscribed");

        let topics: Weak<Topics> = Arc::downgrade(&self.topics);
        let owned_topic = topic.to_owned();
        Ok(Subscription::new(topic, move || {
            let Some(topics) = topics.upgrade() else {
                return;
            };
            topics.handlers.remove_if_mut(&owned_topic, |_, handlers| {
                handlers.remove(&id);
                handlers.is_empty()
            });
        }))
    }
}
