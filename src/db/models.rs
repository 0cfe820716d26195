use serde::Serialize;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Chatter {
    pub id: i64,
    pub username: String,
    pub display_name: String,

    // unique: username
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub chatter_id: i64,
    pub room_id: i64,

    pub content: String,
    pub created_at: PrimitiveDateTime,
}

/// A message joined with its author, as shown to viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MessageWithChatter {
    pub id: i64,
    pub chatter_id: i64,
    pub room_id: i64,

    pub content: String,
    pub created_at: PrimitiveDateTime,

    pub display_name: String,
    pub username: String,
}
