pub mod auth;
pub mod bot;
pub mod bridge;
pub mod bus;
pub mod config;
pub mod db;
pub mod delivery;
pub mod envelope;
pub mod index;
pub mod publish;
pub mod rooms;
pub mod session;

use std::sync::Arc;

use axum::{extract::FromRef, http::StatusCode, response::{IntoResponse, Response}, routing::get, Router};
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing::{debug, error};

use crate::{bridge::Bridge, bus::{Bus, BusError}, db::{Store, StoreError}, publish::Publisher};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: Store,
    pub publisher: Publisher,
    pub bridge: Bridge,
}

impl AppState {
    /// Wires the publish side and the viewer side to the same bus topic.
    pub fn new(store: Store, bus: Arc<dyn Bus>, topic: &str, queue_capacity: usize) -> AppState {
        AppState {
            publisher: Publisher::new(store.clone(), bus.clone(), topic),
            bridge: Bridge::new(bus, topic, queue_capacity),
            store,
        }
    }
}

pub fn app(state: AppState, session_expiry: time::Duration) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(session_expiry));

    Router::new()
        .route("/", get(index::index))
        .nest("/room", rooms::router())

        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<StoreError>() {
            return match err {
                StoreError::Validation(_) | StoreError::ForeignKey => StatusCode::BAD_REQUEST,
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::Io(_) => StatusCode::SERVICE_UNAVAILABLE,
            };
        }
        if self.0.is::<BusError>() {
            return StatusCode::SERVICE_UNAVAILABLE;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                error!("{:#}", self.0);
                (status, format!("{}\n\n{}", self.0, self.0.backtrace())).into_response()
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                error!("{:#}", self.0);
                (status, "temporarily unavailable, try again").into_response()
            }
            _ => {
                debug!("rejected request: {}", self.0);
                (status, self.0.to_string()).into_response()
            }
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
