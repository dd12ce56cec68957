use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use podium_chat::server;
use podium_chat::{Catalog, ChatEngine, ChatService, EngineOptions, InMemoryStore, ServiceOptions};

fn chat_service() -> web::Data<ChatService> {
    let engine = Arc::new(ChatEngine::new(
        Arc::new(Catalog::builtin().unwrap()),
        EngineOptions::default(),
    ));
    web::Data::new(ChatService::new(
        engine,
        Arc::new(InMemoryStore::new()),
        ServiceOptions {
            typing_delay: Duration::ZERO,
            ..Default::default()
        },
    ))
}

#[actix_web::test]
async fn chat_round_trip() {
    let app = test::init_service(App::new().app_data(chat_service()).configure(server::configure)).await;

    let req = test::TestRequest::post()
        .uri("/session")
        .set_json(json!({ "session_id": "web-1", "language": "en" }))
        .to_request();
    let snapshot: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(snapshot["session_id"], "web-1");
    assert_eq!(snapshot["language"], "en");
    assert_eq!(snapshot["messages"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(json!({ "session_id": "web-1", "message": "What is the price for executive coaching?" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["reply"]["response"]["type"], "pricing");
    assert_eq!(body["reply"]["response"]["service"], "Executive Coaching");
    assert!(body["reply"]["suggestions"].is_array());

    let req = test::TestRequest::get().uri("/session/web-1/stats").to_request();
    let stats: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stats["total_messages"], 3);
    assert_eq!(stats["current_service"], "Executive Coaching");
    assert_eq!(stats["message_types"]["welcome"], 1);
    assert_eq!(stats["message_types"]["pricing"], 1);
    assert_eq!(stats["languages"], json!(["en"]));

    let req = test::TestRequest::get()
        .uri("/session/web-1/export?anonymize=true&context=false")
        .to_request();
    let export: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(export["conversation_id"], "web-1");
    assert!(export.get("service_context").is_none());
    assert_eq!(export["messages"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn open_session_without_body() {
    let app = test::init_service(App::new().app_data(chat_service()).configure(server::configure)).await;
    let req = test::TestRequest::post().uri("/session").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let snapshot: Value = test::read_body_json(resp).await;
    assert!(!snapshot["session_id"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn unknown_session_is_not_found() {
    let app = test::init_service(App::new().app_data(chat_service()).configure(server::configure)).await;

    let req = test::TestRequest::get().uri("/session/nope/stats").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(json!({ "session_id": "nope", "message": "hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn empty_message_is_rejected() {
    let app = test::init_service(App::new().app_data(chat_service()).configure(server::configure)).await;
    let req = test::TestRequest::post()
        .uri("/session")
        .set_json(json!({ "session_id": "web-2" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(json!({ "session_id": "web-2", "message": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn language_switch_and_close() {
    let app = test::init_service(App::new().app_data(chat_service()).configure(server::configure)).await;
    let req = test::TestRequest::post()
        .uri("/session")
        .set_json(json!({ "session_id": "web-3" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/session/web-3/language")
        .set_json(json!({ "language": "sw" }))
        .to_request();
    let snapshot: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(snapshot["language"], "sw");
    assert!(snapshot["messages"][0]["content"]
        .as_str()
        .unwrap()
        .starts_with("Habari"));

    let req = test::TestRequest::post()
        .uri("/session/web-3/language")
        .set_json(json!({ "language": "fr" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::delete().uri("/session/web-3").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri("/session/web-3/stats").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn index_serves_widget() {
    let app = test::init_service(App::new().app_data(chat_service()).configure(server::configure)).await;
    let req = test::TestRequest::get().uri("/").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("Podium chat"));
}
