use std::{collections::VecDeque, future::Future};

use rand::seq::IndexedRandom;
use tracing::{info, warn};

use crate::{
    auth,
    bridge::Bridge,
    bus::BusError,
    db::{Chatter, Store, StoreResult},
    publish::Publisher,
};

pub const BOT_USERNAME: &str = "posibot";
pub const BOT_NAME: &str = "PosiBot";

const RESPONSES: [&str; 8] = [
    "That's great to hear! Keep up the positive vibes!",
    "Love that energy!",
    "You're doing amazing, keep going!",
    "What a wonderful thing to share!",
    "This made my day brighter!",
    "So glad you're here!",
    "Great point, thanks for saying it!",
    "Sending good vibes your way!",
];

/// How many recent responses the bot avoids repeating.
const MEMORY: usize = 5;

pub struct ChatBot {
    store: Store,
    chatter: Chatter,
    room_id: i64,
    answered: Option<i64>,
    last_responses: VecDeque<&'static str>,
}

impl ChatBot {
    pub async fn new(store: &Store, room_id: i64) -> StoreResult<ChatBot> {
        let chatter = auth::ensure_chatter(store, BOT_USERNAME, BOT_NAME).await?;
        Ok(ChatBot {
            store: store.clone(),
            chatter,
            room_id,
            answered: None,
            last_responses: VecDeque::with_capacity(MEMORY),
        })
    }

    pub fn chatter(&self) -> &Chatter {
        &self.chatter
    }

    /// `None` for the bot's own messages.
    pub fn respond(&mut self, author: &str) -> Option<&'static str> {
        if author == self.chatter.username {
            return None;
        }

        let fresh: Vec<&'static str> = RESPONSES
            .iter()
            .copied()
            .filter(|response| !self.last_responses.contains(response))
            .collect();
        let response = *fresh.choose(&mut rand::rng()).unwrap_or(&RESPONSES[0]);

        if self.last_responses.len() == MEMORY {
            self.last_responses.pop_front();
        }
        self.last_responses.push_back(response);
        Some(response)
    }

    /// Newest message in the bot's room that it has not looked at yet.
    async fn unanswered(&mut self) -> StoreResult<Option<(i64, String)>> {
        let newest = self.store.list_messages_for_room(self.room_id).await?.pop();
        let Some(newest) = newest else {
            return Ok(None);
        };
        if self.answered.is_some_and(|id| id >= newest.id) {
            return Ok(None);
        }
        self.answered = Some(newest.id);
        Ok(Some((newest.id, newest.username)))
    }

    /// Answers new messages in its room until `cancelled` resolves.
    ///
    /// The topic carries every room's announcements, so a signal only wakes
    /// the bot up; what it answers comes from re-reading its own room.
    pub async fn listen(
        mut self,
        bridge: &Bridge,
        publisher: &Publisher,
        cancelled: impl Future<Output = ()>,
    ) -> Result<(), BusError> {
        // History from before the bot joined stays unanswered.
        if let Err(err) = self.unanswered().await {
            warn!(room_id = self.room_id, "bot could not read its room: {err}");
        }
        let mut signals = bridge.attach()?;
        info!(room_id = self.room_id, "{} listening on {}", self.chatter.display_name, bridge.topic());

        tokio::pin!(cancelled);
        loop {
            tokio::select! {
                biased;

                _ = &mut cancelled => break,
                payload = signals.recv() => {
                    if payload.is_none() {
                        break;
                    }
                }
            }

            let (message_id, author) = match self.unanswered().await {
                Ok(Some(newest)) => newest,
                Ok(None) => continue,
                Err(err) => {
                    warn!(room_id = self.room_id, "bot could not read its room: {err}");
                    continue;
                }
            };
            let Some(response) = self.respond(&author) else {
                continue;
            };

            if let Err(err) = publisher.publish(&self.chatter, self.room_id, response).await {
                warn!(room_id = self.room_id, message_id, "bot failed to respond: {err}");
            }
        }

        info!(room_id = self.room_id, "{} stopped", self.chatter.display_name);
        Ok(())
    }
}
