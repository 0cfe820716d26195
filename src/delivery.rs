use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    bridge::Signals,
    db::{MessageWithChatter, Store},
};

/// Full ordered history of a room, as pushed to a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomState {
    pub room_id: i64,
    pub messages: Vec<MessageWithChatter>,
}

#[derive(Debug, Error)]
#[error("viewer is gone: {0}")]
pub struct PushError(pub String);

/// Where room state goes: a websocket, or a channel in tests.
pub trait StateSink: Send {
    fn push(&mut self, state: &RoomState) -> impl Future<Output = Result<(), PushError>> + Send;
}

impl StateSink for mpsc::UnboundedSender<RoomState> {
    async fn push(&mut self, state: &RoomState) -> Result<(), PushError> {
        self.send(state.clone()).map_err(|err| PushError(err.to_string()))
    }
}

/// Why a delivery loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Cancelled,
    Disconnected,
    QueueClosed,
}

pub struct DeliveryLoop {
    store: Store,
    room_id: i64,
    signals: Signals,
}

impl DeliveryLoop {
    /// `signals` should be attached before the loop is built so nothing
    /// published between attach and the first fetch is missed.
    pub fn new(store: Store, room_id: i64, signals: Signals) -> DeliveryLoop {
        DeliveryLoop { store, room_id, signals }
    }

    /// Pushes current state once, then once per signal, until `cancelled`
    /// resolves or the sink fails. The bus subscription is released on return.
    pub async fn run<S, C>(mut self, sink: &mut S, cancelled: C) -> Exit
    where
        S: StateSink,
        C: Future<Output = ()>,
    {
        let room_id = self.room_id;
        info!(room_id, "viewer connected");

        let exit = 'run: {
            if self.refresh(sink).await.is_err() {
                break 'run Exit::Disconnected;
            }

            tokio::pin!(cancelled);
            loop {
                tokio::select! {
                    biased;

                    _ = &mut cancelled => break 'run Exit::Cancelled,
                    signal = self.signals.recv() => {
                        let Some(_) = signal else {
                            break 'run Exit::QueueClosed;
                        };
                        if self.refresh(sink).await.is_err() {
                            break 'run Exit::Disconnected;
                        }
                    }
                }
            }
        };

        if self.signals.dropped() > 0 {
            debug!(room_id, dropped = self.signals.dropped(), "viewer skipped signals");
        }
        info!(room_id, ?exit, "viewer disconnected");
        exit
    }

    /// Fetch failures are logged and skipped; only a failed push ends the loop.
    async fn refresh<S: StateSink>(&self, sink: &mut S) -> Result<(), PushError> {
        let messages = match self.store.list_messages_for_room(self.room_id).await {
            Ok(messages) => messages,
            Err(err) => {
                warn!(room_id = self.room_id, "failed to list messages: {err}");
                return Ok(());
            }
        };

        let state = RoomState { room_id: self.room_id, messages };
        sink.push(&state).await.inspect_err(|err| {
            debug!(room_id = self.room_id, "failed to push room state: {err}");
        })
    }
}
