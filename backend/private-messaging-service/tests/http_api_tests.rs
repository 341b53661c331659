//! HTTP surface: routing, authentication and the response envelope.

mod common;

use actix_web::{http::StatusCode, test, App};
use chrono::Duration;
use common::*;
use private_messaging_service::routes;
use serde_json::{json, Value};

macro_rules! app {
    ($harness:expr) => {{
        let state = $harness.app_state();
        test::init_service(App::new().configure(move |cfg| routes::configure(cfg, &state))).await
    }};
}

#[actix_web::test]
async fn health_is_public() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "OK");
}

#[actix_web::test]
async fn api_requires_bearer_token() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/inbox")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "TOKEN_MISSING");

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/inbox")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["error_type"], "authentication_error");
    assert_eq!(body["error"]["code"], "TOKEN_INVALID");
}

#[actix_web::test]
async fn send_then_read_through_the_api() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/messages")
        .insert_header(bearer(ALICE))
        .set_json(json!({ "recipientId": BOB, "content": "hi bob", "subject": "Hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["threadId"], "1-2");
    assert_eq!(body["data"]["subject"], "Hello");
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/unread-count")
        .insert_header(bearer(BOB))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["unreadCount"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/inbox?page=1&limit=10")
        .insert_header(bearer(BOB))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], id);
    assert_eq!(body["data"]["hasMore"], false);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/messages/{id}/read"))
        .insert_header(bearer(BOB))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["markedRead"], true);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/messages/{id}/read"))
        .insert_header(bearer(BOB))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["error_type"], "conflict_error");
    assert_eq!(body["error"]["code"], "MESSAGE_ALREADY_READ");
}

#[actix_web::test]
async fn validation_errors_use_the_envelope() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/messages")
        .insert_header(bearer(ALICE))
        .set_json(json!({ "recipientId": BOB, "content": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["error_type"], "validation_error");

    let req = test::TestRequest::post()
        .uri("/api/v1/messages")
        .insert_header(bearer(ALICE))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/inbox?page=0")
        .insert_header(bearer(ALICE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_message_is_not_found_for_outsiders_too() {
    let h = Harness::new();
    let m = h.service.send(ALICE, send_request(BOB, "private")).await.unwrap();
    let app = app!(h);

    for uri in ["/api/v1/messages/4242".to_string(), format!("/api/v1/messages/{}", m.id)] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(CAROL))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "MESSAGE_NOT_FOUND");
    }
}

#[actix_web::test]
async fn recall_after_window_is_forbidden() {
    let h = Harness::new();
    let m = h.service.send(ALICE, send_request(BOB, "late")).await.unwrap();
    h.clock.advance(Duration::minutes(4));
    let app = app!(h);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/messages/{}/recall", m.id))
        .insert_header(bearer(ALICE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "RECALL_WINDOW_EXPIRED");
    assert!(body["error"]["details"]
        .as_str()
        .is_some_and(|d| d.contains("window_secs=180")));
}

#[actix_web::test]
async fn wrong_party_gets_a_role_specific_code() {
    let h = Harness::new();
    let m = h.service.send(ALICE, send_request(BOB, "hello")).await.unwrap();
    let app = app!(h);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/messages/{}/read", m.id))
        .insert_header(bearer(ALICE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "NOT_MESSAGE_RECIPIENT");

    for action in ["recall", "edit"] {
        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/messages/{}/{action}", m.id))
            .insert_header(bearer(BOB))
            .set_json(json!({ "content": "mine now" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "NOT_MESSAGE_SENDER");
    }
}

#[actix_web::test]
async fn recall_and_edit_through_the_api() {
    let h = Harness::new();
    let m = h.service.send(ALICE, send_request(BOB, "tpyo")).await.unwrap();
    let app = app!(h);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/messages/{}/recall", m.id))
        .insert_header(bearer(ALICE))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["recalled"], true);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/messages/{}/edit", m.id))
        .insert_header(bearer(ALICE))
        .set_json(json!({ "content": "typo" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["content"], "typo");
    assert_eq!(body["data"]["isRecalled"], false);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/messages/conversation/{ALICE}"))
        .insert_header(bearer(BOB))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["content"], "typo");
}

#[actix_web::test]
async fn thread_routes_and_delete() {
    let h = Harness::new();
    let m = h.service.send(ALICE, send_request(BOB, "one")).await.unwrap();
    h.service.send(ALICE, send_request(BOB, "two")).await.unwrap();
    let app = app!(h);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/messages/thread-id/{ALICE}"))
        .insert_header(bearer(BOB))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["threadId"], "1-2");

    let req = test::TestRequest::put()
        .uri("/api/v1/messages/thread/1-2/read")
        .insert_header(bearer(BOB))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["markedCount"], 2);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/messages/{}", m.id))
        .insert_header(bearer(BOB))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["deleted"], true);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/messages/{}", m.id))
        .insert_header(bearer(BOB))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::delete()
        .uri("/api/v1/messages/thread/1-2")
        .insert_header(bearer(BOB))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["deletedCount"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/conversations")
        .insert_header(bearer(BOB))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["total"], 0);
}

#[actix_web::test]
async fn admin_routes_require_admin_role() {
    let h = Harness::new();
    let m = h.service.send(ALICE, send_request(BOB, "report me")).await.unwrap();
    let app = app!(h);

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/admin/all")
        .insert_header(bearer(ALICE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "ADMIN_REQUIRED");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/messages/admin/all?senderId={ALICE}"))
        .insert_header(admin_bearer())
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["content"], "report me");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/messages/admin/{}", m.id))
        .insert_header(admin_bearer())
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["deleted"], true);

    let req = test::TestRequest::post()
        .uri("/api/v1/messages/admin/purge")
        .insert_header(admin_bearer())
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["purgedCount"], 0);
}
