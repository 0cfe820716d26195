use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use watercooler::{app, bus::LocalBus, db::Store, AppState};

async fn router() -> (Router, Store) {
    let store = Store::in_memory().await.unwrap();
    let state = AppState::new(store.clone(), Arc::new(LocalBus::new()), "chat-messages", 10);
    (app(state, time::Duration::minutes(5)), store)
}

async fn json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn send(room_id: i64, content: &str, cookie: Option<&str>) -> Request<Body> {
    let mut request = Request::post(format!("/room/{room_id}/message"))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    request
        .body(Body::from(serde_json::json!({ "content": content }).to_string()))
        .unwrap()
}

fn session_cookie(response: &axum::response::Response) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().to_owned()
}

#[tokio::test]
async fn test_index_lists_rooms_by_name() {
    let (app, store) = router().await;
    store.insert_room("Attic", "dusty").await.unwrap();

    let response = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rooms = json(response).await;
    let names: Vec<_> = rooms.as_array().unwrap().iter().map(|room| room["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Attic", "Watercooler"]);
}

#[tokio::test]
async fn test_room_page_resolves_same_chatter_per_session() {
    let (app, _) = router().await;

    let first = app.clone().oneshot(Request::get("/room/1").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let cookie = session_cookie(&first);
    let first = json(first).await;
    assert_eq!(first["room"]["name"], "Watercooler");
    assert_eq!(first["chatter"]["display_name"], "User No. 1");

    let again = app
        .oneshot(Request::get("/room/1").header(header::COOKIE, &cookie).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let again = json(again).await;
    assert_eq!(again["chatter"]["id"], first["chatter"]["id"]);
}

#[tokio::test]
async fn test_unknown_room_is_not_found() {
    let (app, _) = router().await;

    let response = app.oneshot(Request::get("/room/77").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_send_message_stores_and_returns_no_content() {
    let (app, store) = router().await;

    let response = app.oneshot(send(1, "hello", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let messages = store.list_messages_for_room(1).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hello");
    assert_eq!(messages[0].display_name, "User No. 1");
}

#[tokio::test]
async fn test_send_reuses_session_chatter() {
    let (app, store) = router().await;

    let first = app.clone().oneshot(send(1, "one", None)).await.unwrap();
    let cookie = session_cookie(&first);
    app.oneshot(send(1, "two", Some(&cookie))).await.unwrap();

    let messages = store.list_messages_for_room(1).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].chatter_id, messages[1].chatter_id);
    assert_eq!(store.count_chatters().await.unwrap(), 1);
}

#[tokio::test]
async fn test_send_to_unknown_room_is_rejected() {
    let (app, store) = router().await;

    let response = app.oneshot(send(404, "lost", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.list_messages_for_room(404).await.unwrap().is_empty());
}
