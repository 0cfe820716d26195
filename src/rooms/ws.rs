use axum::{
    debug_handler,
    extract::{ws::{self, WebSocket}, Path, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tower_sessions::Session;
use tracing::debug;

use crate::{
    auth,
    bridge::Bridge,
    db::Store,
    delivery::{DeliveryLoop, PushError, RoomState, StateSink},
    session, AppResult,
};

struct WsSink(SplitSink<WebSocket, ws::Message>);

impl StateSink for WsSink {
    async fn push(&mut self, state: &RoomState) -> Result<(), PushError> {
        let json = serde_json::to_string(state).map_err(|err| PushError(err.to_string()))?;
        self.0
            .send(ws::Message::Text(json.into()))
            .await
            .map_err(|err| PushError(err.to_string()))
    }
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn room_ws(
    Path(room_id): Path<i64>,
    State(store): State<Store>,
    State(bridge): State<Bridge>,
    session: Session,

    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    store.get_room(room_id).await?;

    let token = session::token(&session).await?;
    let chatter = auth::resolve_chatter(&store, &token).await?;

    // Subscribe before the first fetch so nothing slips between the two.
    let signals = bridge.attach()?;

    Ok(ws.on_upgrade(move |stream| async move {
        let (sender, mut receiver) = stream.split();
        let mut sink = WsSink(sender);

        let closed = async move {
            while let Some(Ok(msg)) = receiver.next().await {
                if let ws::Message::Close(_) = msg {
                    break;
                }
            }
        };

        let exit = DeliveryLoop::new(store, room_id, signals)
            .run(&mut sink, closed)
            .await;
        debug!(chatter_id = chatter.id, room_id, ?exit, "stream closed");
    }).into_response())
}
