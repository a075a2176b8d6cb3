use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use studycards_core::{Library, MemoryStore};

use super::server::router;

async fn seeded_app() -> Router {
    let library = Arc::new(Library::new(Arc::new(MemoryStore::new())));
    library.decks.initialize().await.unwrap();
    router(library)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => req
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn lists_seed_decks_and_filters() {
    let app = seeded_app().await;

    let (status, all) = send(&app, "GET", "/decks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 5);

    let (_, featured) = send(&app, "GET", "/decks/featured", None).await;
    let ids: Vec<&str> = featured
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["deck-animals", "deck-colors", "deck-alphabet"]);

    let (_, shapes) = send(&app, "GET", "/decks?category=shapes", None).await;
    assert_eq!(shapes.as_array().unwrap().len(), 1);
    assert_eq!(shapes[0]["cardCount"], 5);

    let (_, found) = send(&app, "GET", "/decks?q=rainbow", None).await;
    assert_eq!(found[0]["id"], "deck-colors");
}

#[tokio::test]
async fn missing_deck_is_404() {
    let app = seeded_app().await;
    let (status, body) = send(&app, "GET", "/decks/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found: deck");

    let (status, _) = send(&app, "POST", "/decks/nope/cards", Some(json!({"front": "a", "back": "b"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deck_lifecycle_over_http() {
    let app = seeded_app().await;

    let draft = json!({
        "title": "Spanish Vocab",
        "description": "Basics",
        "category": "other"
    });
    let (status, created) = send(&app, "POST", "/decks", Some(draft)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("deck-"));

    let (status, card) = send(
        &app,
        "POST",
        &format!("/decks/{id}/cards"),
        Some(json!({"front": "Hola", "back": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let card_id = card["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/decks/{id}/cards/{card_id}/learned"),
        Some(json!({"learned": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, deck) = send(&app, "GET", &format!("/decks/{id}"), None).await;
    assert_eq!(deck["cardCount"], 1);
    assert_eq!(deck["cards"][0]["learned"], true);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/decks/{id}"),
        Some(json!({"title": "Spanish Basics"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, deck) = send(&app, "GET", &format!("/decks/{id}"), None).await;
    assert_eq!(deck["title"], "Spanish Basics");
    assert_eq!(deck["description"], "Basics");

    let (status, _) = send(&app, "DELETE", &format!("/decks/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/decks/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_title_is_400() {
    let app = seeded_app().await;
    let draft = json!({"title": "", "description": "x", "category": "other"});
    let (status, body) = send(&app, "POST", "/decks", Some(draft)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid input: deck title is empty");
}

#[tokio::test]
async fn progress_endpoints() {
    let app = seeded_app().await;

    let (status, _) = send(&app, "GET", "/progress/u1/deck-colors", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let patch = json!({"cardsLearned": ["card-colors-1", "card-colors-1"], "totalStudySessions": 2});
    let (status, p) = send(&app, "PATCH", "/progress/u1/deck-colors", Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(p["deckId"], "deck-colors");
    assert_eq!(p["cardsLearned"], json!(["card-colors-1"]));
    assert_eq!(p["totalStudySessions"], 2);

    let (status, p) = send(&app, "GET", "/progress/u1/deck-colors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(p["totalStudySessions"], 2);
}

#[tokio::test]
async fn categories_follow_deck_order() {
    let app = seeded_app().await;
    let (_, cats) = send(&app, "GET", "/categories", None).await;
    assert_eq!(cats, json!(["animals", "colors", "alphabet", "numbers", "shapes"]));
}
