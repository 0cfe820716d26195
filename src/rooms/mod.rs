mod room;
mod msg;
mod ws;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(room::room))
        .route("/{id}/messages", get(ws::room_ws))
        .route("/{id}/message", post(msg::send_msg))
}
