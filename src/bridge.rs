use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace};

use crate::bus::{Bus, BusError, Handler, Subscription};

pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

#[derive(Clone)]
pub struct Bridge {
    bus: Arc<dyn Bus>,
    topic: Arc<str>,
    capacity: usize,
}

impl Bridge {
    pub fn new(bus: Arc<dyn Bus>, topic: impl Into<Arc<str>>, capacity: usize) -> Bridge {
        Bridge {
            bus,
            topic: topic.into(),
            capacity: capacity.max(1),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Subscribes a fresh bounded queue to the topic. The subscription lives
    /// exactly as long as the returned [`Signals`].
    pub fn attach(&self) -> Result<Signals, BusError> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let dropped = Arc::new(AtomicU64::new(0));

        let handler: Handler = {
            let dropped = dropped.clone();
            let topic = self.topic.clone();
            Arc::new(move |payload: &[u8]| match tx.try_send(payload.to_vec()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    dropped.fetch_add(1, Ordering::Relaxed);
                    debug!(topic = %topic, "signal queue full, dropping signal");
                }
                Err(TrySendError::Closed(_)) => {
                    trace!(topic = %topic, "signal queue closed");
                }
            })
        };

        let subscription = self.bus.subscribe(&self.topic, handler)?;
        Ok(Signals { rx, dropped, _subscription: subscription })
    }
}

/// The receiving end of one viewer's queue.
pub struct Signals {
    rx: mpsc::Receiver<Vec<u8>>,
    dropped: Arc<AtomicU64>,
    // Declared after `rx` so the queue closes before the handler goes away.
    _subscription: Subscription,
}

impl Signals {
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Signals discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
