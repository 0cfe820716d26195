mod error;
mod models;

use std::str::FromStr;

use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, SqlitePool};
use tracing::{debug, info};

pub use error::{StoreError, StoreResult};
pub use models::{Chatter, Message, MessageWithChatter, Room};

pub const DEFAULT_ROOM_NAME: &str = "Watercooler";
pub const DEFAULT_ROOM_DESCRIPTION: &str = "place to hang";

const SCHEMA: [(&str, &str); 3] = [
    ("rooms", "
        id INTEGER NOT NULL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''"),
    ("chatters", "
        id INTEGER NOT NULL PRIMARY KEY,
        username TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL"),
    ("messages", "
        id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
        userId INTEGER NOT NULL,
        roomId INTEGER NOT NULL,
        content TEXT NOT NULL,
        timestamp DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
        FOREIGN KEY(userId) REFERENCES chatters(id),
        FOREIGN KEY(roomId) REFERENCES rooms(id)"),
];

const MESSAGE_COLUMNS: &str =
    "id, userId AS chatter_id, roomId AS room_id, content, timestamp AS created_at";

/// Durable home of chatters, rooms and messages.
///
/// Cloning is cheap; all clones share one pool, and SQLite serializes the
/// writers behind it.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if missing) the database at `url` and brings the schema
    /// up to date.
    pub async fn open(url: &str, max_connections: u32) -> StoreResult<Store> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Store { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// A private in-memory database. It lives on exactly one connection that
    /// is never recycled, otherwise the data would vanish with it.
    pub async fn in_memory() -> StoreResult<Store> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Store { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Creates missing tables and seeds the default room. Safe to run on every
    /// startup.
    pub async fn initialize(&self) -> StoreResult<()> {
        for (table, columns) in SCHEMA {
            sqlx::query(&format!("CREATE TABLE IF NOT EXISTS {table} ({columns})"))
                .execute(&self.pool)
                .await?;
        }

        let (seeded,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rooms WHERE name=?")
            .bind(DEFAULT_ROOM_NAME)
            .fetch_one(&self.pool)
            .await?;

        if seeded == 0 {
            let room = self.insert_room(DEFAULT_ROOM_NAME, DEFAULT_ROOM_DESCRIPTION).await?;
            info!(room_id = room.id, "seeded default room {DEFAULT_ROOM_NAME}");
        }

        Ok(())
    }

    pub async fn insert_chatter(&self, username: &str, display_name: &str) -> StoreResult<Chatter> {
        if username.is_empty() {
            return Err(StoreError::Validation("username cannot be empty"));
        }

        let chatter = sqlx::query_as::<_, Chatter>(
            "INSERT INTO chatters (username,name) VALUES (?,?) RETURNING id,username,name AS display_name"
        )
            .bind(username)
            .bind(display_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| StoreError::classify(err, || format!("chatter {username}")))?;

        debug!(chatter_id = chatter.id, "inserted chatter {display_name}");
        Ok(chatter)
    }

    /// Exact, case-sensitive lookup.
    pub async fn get_chatter_by_username(&self, username: &str) -> StoreResult<Chatter> {
        sqlx::query_as("SELECT id,username,name AS display_name FROM chatters WHERE username=?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("chatter {username}")))
    }

    pub async fn count_chatters(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chatters")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn insert_message(&self, chatter_id: i64, room_id: i64, content: &str) -> StoreResult<Message> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (userId,roomId,content) VALUES (?,?,?) RETURNING {MESSAGE_COLUMNS}"
        ))
            .bind(chatter_id)
            .bind(room_id)
            .bind(content)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| StoreError::classify(err, || format!("message in room {room_id}")))?;

        debug!(message_id = message.id, chatter_id, room_id, "inserted message");
        Ok(message)
    }

    /// Every message of the room in insertion order. Unknown rooms are simply
    /// empty.
    pub async fn list_messages_for_room(&self, room_id: i64) -> StoreResult<Vec<MessageWithChatter>> {
        let messages = sqlx::query_as(
            "SELECT m.id, m.userId AS chatter_id, m.roomId AS room_id, m.content, m.timestamp AS created_at,
                    c.name AS display_name, c.username
             FROM messages m
             JOIN chatters c ON m.userId = c.id
             WHERE m.roomId=?
             ORDER BY m.timestamp ASC, m.id ASC"
        )
            .bind(room_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(messages)
    }

    pub async fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        let rooms = sqlx::query_as("SELECT id,name,description FROM rooms ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }

    pub async fn get_room(&self, room_id: i64) -> StoreResult<Room> {
        sqlx::query_as("SELECT id,name,description FROM rooms WHERE id=?")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("room {room_id}")))
    }

    pub async fn insert_room(&self, name: &str, description: &str) -> StoreResult<Room> {
        if name.is_empty() {
            return Err(StoreError::Validation("room name cannot be empty"));
        }

        let room = sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (name,description) VALUES (?,?) RETURNING id,name,description"
        )
            .bind(name)
            .bind(description)
            .fetch_one(&self.pool)
            .await?;
        Ok(room)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
