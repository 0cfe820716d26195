use watercooler::db::{Store, StoreError, DEFAULT_ROOM_DESCRIPTION, DEFAULT_ROOM_NAME};

async fn store() -> Store {
    Store::in_memory().await.expect("in-memory store")
}

async fn message_count(store: &Store) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(store.pool())
        .await
        .unwrap();
    count
}

#[tokio::test]
async fn test_default_room_is_seeded() {
    let store = store().await;

    let rooms = store.list_rooms().await.unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].name, DEFAULT_ROOM_NAME);
    assert_eq!(rooms[0].description, DEFAULT_ROOM_DESCRIPTION);
}

#[tokio::test]
async fn test_repeated_initialization_seeds_once() {
    let store = store().await;
    store.initialize().await.unwrap();
    store.initialize().await.unwrap();

    let seeded = store
        .list_rooms()
        .await
        .unwrap()
        .into_iter()
        .filter(|room| room.name == DEFAULT_ROOM_NAME)
        .count();
    assert_eq!(seeded, 1);
}

#[tokio::test]
async fn test_reopening_file_database_seeds_once() {
    let path = std::env::temp_dir().join(format!("watercooler-{}.db", uuid::Uuid::now_v7()));
    let url = format!("sqlite://{}", path.display());

    {
        let store = Store::open(&url, 4).await.unwrap();
        store.pool().close().await;
    }
    let store = Store::open(&url, 4).await.unwrap();
    assert_eq!(store.list_rooms().await.unwrap().len(), 1);

    store.pool().close().await;
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_insert_then_list_message() {
    let store = store().await;
    let room = store.get_room(1).await.unwrap();
    let alice = store.insert_chatter("alice", "Alice").await.unwrap();

    let message = store.insert_message(alice.id, room.id, "hello").await.unwrap();
    assert_eq!(message.chatter_id, alice.id);
    assert_eq!(message.room_id, room.id);

    let listed = store.list_messages_for_room(room.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, message.id);
    assert_eq!(listed[0].content, "hello");
    assert_eq!(listed[0].chatter_id, alice.id);
    assert_eq!(listed[0].display_name, "Alice");
    assert_eq!(listed[0].username, "alice");
    assert_eq!(listed[0].created_at, message.created_at);
}

#[tokio::test]
async fn test_messages_listed_in_insertion_order() {
    let store = store().await;
    let alice = store.insert_chatter("alice", "Alice").await.unwrap();
    let bob = store.insert_chatter("bob", "Bob").await.unwrap();

    let mut inserted = Vec::new();
    for i in 0..25 {
        let author = if i % 2 == 0 { &alice } else { &bob };
        inserted.push(store.insert_message(author.id, 1, &format!("message {i}")).await.unwrap().id);
    }

    let listed = store.list_messages_for_room(1).await.unwrap();
    assert_eq!(listed.len(), 25);
    assert_eq!(listed.iter().map(|m| m.id).collect::<Vec<_>>(), inserted);
    assert!(listed.windows(2).all(|pair| pair[0].id < pair[1].id && pair[0].created_at <= pair[1].created_at));
}

#[tokio::test]
async fn test_rooms_do_not_leak_messages() {
    let store = store().await;
    let other = store.insert_room("Backroom", "").await.unwrap();
    let alice = store.insert_chatter("alice", "Alice").await.unwrap();

    store.insert_message(alice.id, 1, "front").await.unwrap();
    store.insert_message(alice.id, other.id, "back").await.unwrap();

    let front = store.list_messages_for_room(1).await.unwrap();
    assert_eq!(front.len(), 1);
    assert_eq!(front[0].content, "front");
}

#[tokio::test]
async fn test_unknown_room_lists_empty() {
    let store = store().await;
    assert!(store.list_messages_for_room(999).await.unwrap().is_empty());
    assert!(store.list_messages_for_room(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_orphan_message_is_rejected() {
    let store = store().await;
    let alice = store.insert_chatter("alice", "Alice").await.unwrap();

    let unknown_chatter = store.insert_message(alice.id + 100, 1, "ghost").await;
    assert!(matches!(unknown_chatter, Err(StoreError::ForeignKey)));

    let unknown_room = store.insert_message(alice.id, 404, "nowhere").await;
    assert!(matches!(unknown_room, Err(StoreError::ForeignKey)));

    assert_eq!(message_count(&store).await, 0);
}

#[tokio::test]
async fn test_empty_username_is_rejected() {
    let store = store().await;

    let err = store.insert_chatter("", "Nobody").await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.count_chatters().await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_username_keeps_original() {
    let store = store().await;
    let original = store.insert_chatter("alice", "First").await.unwrap();

    let err = store.insert_chatter("alice", "Second").await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let stored = store.get_chatter_by_username("alice").await.unwrap();
    assert_eq!(stored, original);
    assert_eq!(stored.display_name, "First");
    assert_eq!(store.count_chatters().await.unwrap(), 1);
}

#[tokio::test]
async fn test_username_lookup_is_exact() {
    let store = store().await;
    store.insert_chatter("alice", "Alice").await.unwrap();

    let err = store.get_chatter_by_username("ALICE").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let err = store.get_chatter_by_username("nobody").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_rooms_listed_by_name() {
    let store = store().await;
    for name in ["Zebra", "Attic", "Kitchen"] {
        store.insert_room(name, "").await.unwrap();
    }

    let names: Vec<_> = store.list_rooms().await.unwrap().into_iter().map(|room| room.name).collect();
    assert_eq!(names, ["Attic", "Kitchen", "Watercooler", "Zebra"]);
}

#[tokio::test]
async fn test_room_lookup_and_validation() {
    let store = store().await;

    let room = store.insert_room("Library", "quiet please").await.unwrap();
    assert_eq!(store.get_room(room.id).await.unwrap(), room);

    assert!(matches!(store.get_room(12345).await, Err(StoreError::NotFound(_))));
    assert!(matches!(store.insert_room("", "nameless").await, Err(StoreError::Validation(_))));
}
