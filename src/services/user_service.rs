use std::sync::Arc;

use crate::database::store::UserStore;
use crate::dto::user_dto::{CreateUserRequest, UpdateUserRequest, UserDto};
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::crypto;

/// Admin-only CRUD over user documents. Role enforcement happens in the
/// access control layer before any of these are reached.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, page: i64, size: i64) -> Result<Vec<UserDto>> {
        let users = self.store.list(page, size).await?;
        Ok(users.into_iter().map(UserDto::from).collect())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<UserDto> {
        self.store
            .find_by_username(username)
            .await?
            .map(UserDto::from)
            .ok_or_else(|| Error::NotFound("account does not exist".to_string()))
    }

    pub async fn create(&self, req: CreateUserRequest) -> Result<UserDto> {
        if self.store.exists(&req.username, &req.email).await? {
            return Err(Error::Conflict("account already exists".to_string()));
        }
        let user = User {
            username: req.username,
            email: req.email,
            password: hash(&req.password)?,
            status: req.status,
            roles: req.roles,
            activation_key: None,
            password_reset_key: None,
        };
        self.store.insert(&user).await?;
        Ok(UserDto::from(user))
    }

    /// Full replace of email, password, roles and status.
    pub async fn update(&self, username: &str, req: UpdateUserRequest) -> Result<UserDto> {
        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or_else(|| Error::NotFound("account does not exist".to_string()))?;
        let user = User {
            email: req.email,
            password: hash(&req.password)?,
            roles: req.roles,
            status: req.status,
            ..user
        };
        self.store.save(&user).await?;
        Ok(UserDto::from(user))
    }

    pub async fn delete(&self, username: &str) -> Result<()> {
        self.store.delete(username).await
    }
}

fn hash(plain: &str) -> Result<String> {
    crypto::hash_password(plain)
        .map_err(|err| Error::Internal(format!("password hashing failed: {}", err)))
}
