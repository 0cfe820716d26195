use std::{net::SocketAddr, str::FromStr};

use anyhow::{Context, Result};

use crate::bridge::DEFAULT_QUEUE_CAPACITY;

pub const DEFAULT_TOPIC: &str = "chat-messages";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub addr: SocketAddr,
    /// Bus topic carrying every room signal.
    pub topic: String,
    /// Per-viewer signal queue size.
    pub queue_capacity: usize,
    pub max_connections: u32,
    pub session_minutes: i64,
    pub bot: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite://chat-db.db".to_owned(),
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            topic: DEFAULT_TOPIC.to_owned(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_connections: 16,
            session_minutes: 60,
            bot: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let defaults = Config::default();

        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            addr: parse(&lookup, "WATERCOOLER_ADDR")?.unwrap_or(defaults.addr),
            topic: match lookup("WATERCOOLER_TOPIC") {
                Some(topic) if topic.is_empty() => anyhow::bail!("WATERCOOLER_TOPIC cannot be empty"),
                Some(topic) => topic,
                None => defaults.topic,
            },
            queue_capacity: match parse::<usize>(&lookup, "WATERCOOLER_QUEUE_CAPACITY")? {
                Some(0) => anyhow::bail!("WATERCOOLER_QUEUE_CAPACITY must be at least 1"),
                Some(capacity) => capacity,
                None => defaults.queue_capacity,
            },
            max_connections: parse(&lookup, "WATERCOOLER_MAX_CONNECTIONS")?.unwrap_or(defaults.max_connections),
            session_minutes: parse(&lookup, "WATERCOOLER_SESSION_MINUTES")?.unwrap_or(defaults.session_minutes),
            bot: parse(&lookup, "WATERCOOLER_BOT")?.unwrap_or(defaults.bot),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| raw.parse::<T>().with_context(|| format!("invalid {key}: {raw:?}")))
        .transpose()
}
