mod common;

use axum::http::StatusCode;
use common::{authed_json_request, authed_request, read_json, sign_in, test_app};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn user_management_is_admin_only() {
    let (app, store) = test_app();
    store.put(common::user("johndoe", "supersecurepassword"));

    // No token at all.
    let resp = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/v1/users")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Valid token, but no ADMIN role.
    let token = sign_in(&app, "johndoe", "supersecurepassword").await;
    let resp = app
        .clone()
        .oneshot(authed_request("GET", "/api/v1/users", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Token whose subject no longer exists.
    let ghost_token =
        account_backend::utils::token::issue_token("ghost", common::JWT_SECRET).unwrap();
    let resp = app
        .clone()
        .oneshot(authed_request("GET", "/api/v1/users", &ghost_token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_creates_and_fetches_users() {
    let (app, store) = test_app();
    store.put(common::admin("admin", "adminpassword"));
    let token = sign_in(&app, "admin", "adminpassword").await;

    let resp = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/v1/users",
            &token,
            json!({
                "username": "janedoe",
                "email": "janedoe@example.com",
                "password": "supersecurepassword",
                "roles": ["MANAGER"],
                "status": "ACTIVE"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = read_json(resp).await;
    assert_eq!(body["username"], "janedoe");
    assert_eq!(body["status"], "ACTIVE");
    assert!(body["roles"].as_array().unwrap().contains(&json!("MANAGER")));

    // The stored password is hashed, never the plaintext.
    let jane = store.get("janedoe").unwrap();
    assert_ne!(jane.password, "supersecurepassword");

    let resp = app
        .clone()
        .oneshot(authed_request("GET", "/api/v1/users/janedoe", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["email"], "janedoe@example.com");

    let resp = app
        .clone()
        .oneshot(authed_request("GET", "/api/v1/users/ghost", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_create_conflicts_on_duplicate() {
    let (app, store) = test_app();
    store.put(common::admin("admin", "adminpassword"));
    store.put(common::user("johndoe", "supersecurepassword"));
    let token = sign_in(&app, "admin", "adminpassword").await;

    let resp = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/v1/users",
            &token,
            json!({
                "username": "johndoe",
                "email": "fresh@example.com",
                "password": "supersecurepassword",
                "roles": [],
                "status": "ACTIVE"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_update_replaces_the_document_or_404s() {
    let (app, store) = test_app();
    store.put(common::admin("admin", "adminpassword"));
    store.put(common::user("johndoe", "supersecurepassword"));
    let token = sign_in(&app, "admin", "adminpassword").await;

    let payload = json!({
        "email": "john.doe@example.com",
        "password": "mynewpassword",
        "roles": ["ADMIN", "MANAGER"],
        "status": "INACTIVE"
    });
    let resp = app
        .clone()
        .oneshot(authed_json_request(
            "PUT",
            "/api/v1/users/johndoe",
            &token,
            payload.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["email"], "john.doe@example.com");
    assert_eq!(body["status"], "INACTIVE");

    let resp = app
        .clone()
        .oneshot(authed_json_request(
            "PUT",
            "/api/v1/users/ghost",
            &token,
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_delete_is_idempotent() {
    let (app, store) = test_app();
    store.put(common::admin("admin", "adminpassword"));
    store.put(common::user("johndoe", "supersecurepassword"));
    let token = sign_in(&app, "admin", "adminpassword").await;

    let resp = app
        .clone()
        .oneshot(authed_request("DELETE", "/api/v1/users/johndoe", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(store.get("johndoe").is_none());

    let resp = app
        .clone()
        .oneshot(authed_request("DELETE", "/api/v1/users/johndoe", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn list_pagination_echoes_page_and_size() {
    let (app, store) = test_app();
    store.put(common::admin("admin", "adminpassword"));
    for name in ["alice", "bob", "carol"] {
        store.put(common::user(name, "supersecurepassword"));
    }
    let token = sign_in(&app, "admin", "adminpassword").await;

    let resp = app
        .clone()
        .oneshot(authed_request("GET", "/api/v1/users?page=0&size=2", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["page"], 0);
    assert_eq!(body["size"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    // Deterministic ordering by username.
    assert_eq!(body["items"][0]["username"], "admin");
    assert_eq!(body["items"][1]["username"], "alice");

    // A page beyond the data comes back empty with the query echoed.
    let resp = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/api/v1/users?page=9&size=50",
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["page"], 9);
    assert_eq!(body["size"], 50);
    assert!(body["items"].as_array().unwrap().is_empty());
}
