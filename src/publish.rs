use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    bus::Bus,
    db::{Chatter, Message, Store, StoreResult},
    envelope::Envelope,
};

/// Persists a message, then announces it on the bus topic.
#[derive(Clone)]
pub struct Publisher {
    store: Store,
    bus: Arc<dyn Bus>,
    topic: Arc<str>,
}

impl Publisher {
    pub fn new(store: Store, bus: Arc<dyn Bus>, topic: impl Into<Arc<str>>) -> Publisher {
        Publisher {
            store,
            bus,
            topic: topic.into(),
        }
    }

    /// Succeeds as soon as the message is stored. A failed announce is logged
    /// and not retried; viewers catch up on the next signal.
    pub async fn publish(&self, chatter: &Chatter, room_id: i64, content: &str) -> StoreResult<Message> {
        let message = self.store.insert_message(chatter.id, room_id, content).await?;

        let envelope = Envelope::new(&chatter.username, content);
        match self.bus.publish(&self.topic, &envelope.encode()) {
            Ok(()) => debug!(message_id = message.id, room_id, topic = %self.topic, "announced message"),
            Err(err) => warn!(message_id = message.id, room_id, topic = %self.topic, "stored message was not announced: {err}"),
        }

        Ok(message)
    }
}
