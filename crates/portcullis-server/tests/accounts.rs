//! Registration, activation, login and the user cache.

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use portcullis_server::middleware::Role;
use serde_json::json;

fn registration() -> serde_json::Value {
    json!({
        "username": "ada",
        "email": "ada@example.com",
        "password": "analytical"
    })
}

#[tokio::test]
async fn test_register_activate_login() {
    let ctx = TestContext::new();
    let (_, viewer) = ctx.user("viewer", Role::User);

    let registered = ctx
        .json(Method::POST, "/v1/authentication/user", None, registration())
        .await;
    assert_eq!(registered.status, StatusCode::CREATED);
    let user_id = registered.body["data"]["id"].as_i64().unwrap();
    let activation = registered.body["data"]["token"].as_str().unwrap().to_string();
    assert!(registered.body["data"].get("password").is_none());

    let login = json!({ "email": "ada@example.com", "password": "analytical" });

    // Inactive accounts cannot log in.
    let early = ctx
        .json(Method::POST, "/v1/authentication/token", None, login.clone())
        .await;
    assert_eq!(early.status, StatusCode::UNAUTHORIZED);

    // First read caches the inactive snapshot.
    let before = ctx.get(&format!("/v1/users/{user_id}"), Some(&viewer)).await;
    assert_eq!(before.status, StatusCode::OK);
    assert_eq!(before.body["data"]["is_active"], json!(false));

    let activated = ctx
        .send(common::request(
            Method::PUT,
            &format!("/v1/users/activate/{activation}"),
            None,
            None,
        ))
        .await;
    assert_eq!(activated.status, StatusCode::NO_CONTENT);

    // Activation dropped the cached snapshot.
    let after = ctx.get(&format!("/v1/users/{user_id}"), Some(&viewer)).await;
    assert_eq!(after.body["data"]["is_active"], json!(true));

    let issued = ctx
        .json(Method::POST, "/v1/authentication/token", None, login)
        .await;
    assert_eq!(issued.status, StatusCode::OK);
    assert_eq!(issued.body["data"]["token_type"], json!("Bearer"));
    let token = issued.body["data"]["token"].as_str().unwrap();

    let me = ctx.get(&format!("/v1/users/{user_id}"), Some(token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["username"], json!("ada"));
}

#[tokio::test]
async fn test_activation_token_is_single_use() {
    let ctx = TestContext::new();
    let registered = ctx
        .json(Method::POST, "/v1/authentication/user", None, registration())
        .await;
    let activation = registered.body["data"]["token"].as_str().unwrap().to_string();
    let uri = format!("/v1/users/activate/{activation}");

    let first = ctx.send(common::request(Method::PUT, &uri, None, None)).await;
    assert_eq!(first.status, StatusCode::NO_CONTENT);

    let second = ctx.send(common::request(Method::PUT, &uri, None, None)).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);

    let bogus = ctx
        .send(common::request(
            Method::PUT,
            "/v1/users/activate/not-a-real-token",
            None,
            None,
        ))
        .await;
    assert_eq!(bogus.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let ctx = TestContext::new();
    let first = ctx
        .json(Method::POST, "/v1/authentication/user", None, registration())
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = ctx
        .json(Method::POST, "/v1/authentication/user", None, registration())
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.error_code(), "conflict");
}

#[tokio::test]
async fn test_invalid_registration_payload() {
    let ctx = TestContext::new();
    let response = ctx
        .json(
            Method::POST,
            "/v1/authentication/user",
            None,
            json!({ "username": "", "email": "nope", "password": "abc" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "validation_error");
    assert!(response.body["error"]["fields"]["email"].is_array());

    let mistyped = json!({ "username": 5, "email": "x@example.com", "password": "abcd" });
    let malformed = ctx
        .json(Method::POST, "/v1/authentication/user", None, mistyped)
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.error_code(), "bad_request");
}

#[tokio::test]
async fn test_login_with_unknown_email_is_uniform() {
    let ctx = TestContext::new();
    let response = ctx
        .json(
            Method::POST,
            "/v1/authentication/token",
            None,
            json!({ "email": "ghost@example.com", "password": "whatever" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"]["message"], json!("unauthorized"));
}

#[tokio::test]
async fn test_get_unknown_user() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user("viewer", Role::User);

    let response = ctx.get("/v1/users/4242", Some(&token)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "not_found");
}
