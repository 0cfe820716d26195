use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watercooler::{app, bot::ChatBot, bus::LocalBus, config::Config, db::{Store, DEFAULT_ROOM_NAME}, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watercooler=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store = Store::open(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("opening {}", config.database_url))?;

    let bus = Arc::new(LocalBus::new());
    let app_state = AppState::new(store.clone(), bus.clone(), &config.topic, config.queue_capacity);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let bot_task = if config.bot {
        let room_id = store
            .list_rooms()
            .await?
            .into_iter()
            .find(|room| room.name == DEFAULT_ROOM_NAME)
            .map(|room| room.id)
            .context("default room is missing")?;
        let bot = ChatBot::new(&store, room_id).await?;
        let bridge = app_state.bridge.clone();
        let publisher = app_state.publisher.clone();
        let mut stop = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            let cancelled = async move {
                let _ = stop.wait_for(|stop| *stop).await;
            };
            if let Err(err) = bot.listen(&bridge, &publisher, cancelled).await {
                warn!("bot stopped: {err}");
            }
        }))
    } else {
        None
    };

    let app = app(app_state, time::Duration::minutes(config.session_minutes));
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    info!("listening on http://{}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(bot_task) = bot_task {
        let _ = bot_task.await;
    }
    bus.close();
    Ok(())
}
