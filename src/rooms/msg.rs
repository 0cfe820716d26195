use axum::{debug_handler, extract::{Path, State}, http::StatusCode, Json};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{auth, db::Store, publish::Publisher, session, AppResult};

#[derive(Deserialize)]
pub(crate) struct SendMessageQuery {
    content: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn send_msg(
    State(store): State<Store>,
    State(publisher): State<Publisher>,
    session: Session,
    Path(room_id): Path<i64>,

    Json(SendMessageQuery { content }): Json<SendMessageQuery>,
) -> AppResult<StatusCode> {
    let token = session::token(&session).await?;
    let chatter = auth::resolve_chatter(&store, &token).await?;

    publisher.publish(&chatter, room_id, &content).await?;

    Ok(StatusCode::NO_CONTENT)
}
