#![allow(dead_code)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use account_backend::database::store::UserStore;
use account_backend::error::{Error, Result};
use account_backend::models::user::{AccountStatus, User, UserRole};
use account_backend::utils::crypto;
use account_backend::{build_router, AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
    Router,
};
use serde_json::Value as JsonValue;

pub const JWT_SECRET: &str = "test_secret_key";

/// In-memory stand-in for the Postgres store, keyed by username with the
/// same uniqueness rules (email and one-time keys collide as Conflict).
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<BTreeMap<String, User>>,
}

impl MemoryUserStore {
    pub fn get(&self, username: &str) -> Option<User> {
        self.users.lock().unwrap().get(username).cloned()
    }

    pub fn put(&self, user: User) {
        self.users
            .lock()
            .unwrap()
            .insert(user.username.clone(), user);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.get(username))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_activation_key(&self, key: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.activation_key.as_deref() == Some(key))
            .cloned())
    }

    async fn find_by_password_reset_key(&self, key: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.password_reset_key.as_deref() == Some(key))
            .cloned())
    }

    async fn exists(&self, username: &str, email: &str) -> Result<bool> {
        let users = self.users.lock().unwrap();
        Ok(users.contains_key(username) || users.values().any(|u| u.email == email))
    }

    async fn insert(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let duplicate = users.contains_key(&user.username)
            || users.values().any(|u| u.email == user.email);
        if duplicate {
            return Err(Error::Conflict("account already exists".to_string()));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn delete(&self, username: &str) -> Result<()> {
        self.users.lock().unwrap().remove(username);
        Ok(())
    }

    async fn list(&self, page: i64, size: i64) -> Result<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .skip((page * size) as usize)
            .take(size as usize)
            .cloned()
            .collect())
    }
}

pub fn test_app() -> (Router, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::default());
    let state = AppState::new(store.clone(), JWT_SECRET.to_string());
    (build_router(state), store)
}

pub fn user(username: &str, password: &str) -> User {
    User {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: crypto::hash_password(password).unwrap(),
        status: AccountStatus::Active,
        roles: BTreeSet::new(),
        activation_key: None,
        password_reset_key: None,
    }
}

pub fn admin(username: &str, password: &str) -> User {
    User {
        roles: BTreeSet::from([UserRole::Admin]),
        ..user(username, password)
    }
}

pub fn json_request(method: &str, uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn authed_json_request(
    method: &str,
    uri: &str,
    token: &str,
    body: JsonValue,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn read_json(resp: Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Signs in through the real endpoint and returns the issued token.
pub async fn sign_in(app: &Router, username: &str, password: &str) -> String {
    use tower::ServiceExt;

    let req = json_request(
        "POST",
        "/api/v1/signin",
        serde_json::json!({"username": username, "password": password}),
    );
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), axum::http::StatusCode::OK);
    let body = read_json(resp).await;
    body["token"].as_str().unwrap().to_string()
}
