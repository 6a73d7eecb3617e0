use std::collections::BTreeSet;
use std::sync::Arc;

use crate::database::store::UserStore;
use crate::dto::account_dto::{
    AccountDto, ResetPasswordRequest, SignInRequest, SignUpRequest, UpdatePasswordRequest,
};
use crate::error::{Error, Result};
use crate::models::user::{AccountStatus, User};
use crate::utils::{crypto, token};

/// Registration, activation, sign-in and password lifecycle. Every
/// operation is a single lookup plus at most one write; concurrent
/// duplicates lose the race at the store's unique index and surface
/// as `Error::Conflict`.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>, jwt_secret: String) -> Self {
        Self { store, jwt_secret }
    }

    /// Creates an INACTIVE account with a fresh activation key.
    pub async fn sign_up(&self, req: SignUpRequest) -> Result<()> {
        if self.store.exists(&req.username, &req.email).await? {
            return Err(Error::Conflict("account already exists".to_string()));
        }
        let user = User {
            username: req.username,
            email: req.email,
            password: hash(&req.password)?,
            status: AccountStatus::Inactive,
            roles: BTreeSet::new(),
            activation_key: Some(crypto::generate_key()),
            password_reset_key: None,
        };
        self.store.insert(&user).await
    }

    /// Consumes the activation key: the account becomes ACTIVE and the
    /// key is cleared so it can never be replayed.
    pub async fn activate(&self, key: &str) -> Result<()> {
        let user = self
            .store
            .find_by_activation_key(key)
            .await?
            .ok_or_else(|| Error::BadRequest("no account matches activation key".to_string()))?;
        let user = User {
            status: AccountStatus::Active,
            activation_key: None,
            ..user
        };
        self.store.save(&user).await
    }

    /// Verifies credentials and issues a bearer token. The response never
    /// distinguishes between unknown user, wrong password and inactive
    /// account.
    pub async fn sign_in(&self, req: SignInRequest) -> Result<String> {
        let user = self.store.find_by_username(&req.username).await?;
        match user {
            Some(user)
                if crypto::verify_password(&req.password, &user.password)
                    && user.is_active() =>
            {
                token::issue_token(&user.username, &self.jwt_secret)
            }
            _ => Err(Error::Unauthorized("bad credentials".to_string())),
        }
    }

    /// Stores a fresh reset key on the matching account. An unknown email
    /// is a silent no-op so the endpoint does not leak account existence.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let Some(user) = self.store.find_by_email(email).await? else {
            return Ok(());
        };
        let user = User {
            password_reset_key: Some(crypto::generate_key()),
            ..user
        };
        self.store.save(&user).await
    }

    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<()> {
        let user = self
            .store
            .find_by_password_reset_key(&req.key)
            .await?
            .ok_or_else(|| Error::BadRequest("invalid key".to_string()))?;
        if crypto::verify_password(&req.new_password, &user.password) {
            return Err(Error::Conflict(
                "can NOT use the same password".to_string(),
            ));
        }
        let user = User {
            password: hash(&req.new_password)?,
            password_reset_key: None,
            ..user
        };
        self.store.save(&user).await
    }

    /// Password change for an already authenticated user; `username` comes
    /// from the validated bearer token, not from the request body.
    pub async fn update_password(&self, username: &str, req: UpdatePasswordRequest) -> Result<()> {
        if req.old_password == req.new_password {
            return Err(Error::BadRequest(
                "can NOT reuse the same password".to_string(),
            ));
        }
        let user = self
            .store
            .find_by_username(username)
            .await?
            .filter(|user| crypto::verify_password(&req.old_password, &user.password))
            .ok_or_else(|| Error::BadRequest("invalid old password".to_string()))?;
        let user = User {
            password: hash(&req.new_password)?,
            ..user
        };
        self.store.save(&user).await
    }

    pub async fn current_account(&self, username: &str) -> Result<AccountDto> {
        self.store
            .find_by_username(username)
            .await?
            .filter(User::is_active)
            .map(AccountDto::from)
            .ok_or_else(|| Error::BadRequest("user not found or not active".to_string()))
    }
}

fn hash(plain: &str) -> Result<String> {
    crypto::hash_password(plain)
        .map_err(|err| Error::Internal(format!("password hashing failed: {}", err)))
}
