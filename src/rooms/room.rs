use axum::{debug_handler, extract::{Path, State}, Json};
use serde::Serialize;
use tower_sessions::Session;

use crate::{auth, db::{Chatter, Room, Store}, session, AppResult};

#[derive(Serialize)]
pub(crate) struct RoomPage {
    room: Room,
    chatter: Chatter,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn room(
    State(store): State<Store>,
    session: Session,
    Path(room_id): Path<i64>,
) -> AppResult<Json<RoomPage>> {
    let room = store.get_room(room_id).await?;

    let token = session::token(&session).await?;
    let chatter = auth::resolve_chatter(&store, &token).await?;

    Ok(Json(RoomPage { room, chatter }))
}
