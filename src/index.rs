use axum::{debug_handler, extract::State, Json};

use crate::{db::{Room, Store}, AppResult};

#[debug_handler(state = crate::AppState)]
pub async fn index(
    State(store): State<Store>,
) -> AppResult<Json<Vec<Room>>> {
    Ok(Json(store.list_rooms().await?))
}
