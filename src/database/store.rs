use crate::error::{Error, Result};
use crate::models::user::User;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

/// Persistence seam for user documents. Each method is a single-document
/// read or write; uniqueness of username, email and the one-time keys is
/// enforced by the store and surfaced as `Error::Conflict`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_activation_key(&self, key: &str) -> Result<Option<User>>;
    async fn find_by_password_reset_key(&self, key: &str) -> Result<Option<User>>;

    /// True when the username or the email is already taken.
    async fn exists(&self, username: &str, email: &str) -> Result<bool>;

    /// Creates a new document. A concurrent duplicate loses the race at the
    /// unique index and comes back as `Error::Conflict`.
    async fn insert(&self, user: &User) -> Result<()>;

    /// Full replace of the document identified by `user.username`.
    async fn save(&self, user: &User) -> Result<()>;

    /// Idempotent; removing an absent user is not an error.
    async fn delete(&self, username: &str) -> Result<()>;

    /// Page of users ordered by username. An out-of-range page is empty.
    async fn list(&self, page: i64, size: i64) -> Result<Vec<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by(&self, column: &str, value: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT username, email, password, status, roles, activation_key, password_reset_key \
             FROM users WHERE {} = $1",
            column
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_by("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_by("email", email).await
    }

    async fn find_by_activation_key(&self, key: &str) -> Result<Option<User>> {
        self.find_by("activation_key", key).await
    }

    async fn find_by_password_reset_key(&self, key: &str) -> Result<Option<User>> {
        self.find_by("password_reset_key", key).await
    }

    async fn exists(&self, username: &str, email: &str) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users \
             (username, email, password, status, roles, activation_key, password_reset_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.status.as_str())
        .bind(roles_to_vec(user))
        .bind(&user.activation_key)
        .bind(&user.password_reset_key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<()> {
        sqlx::query(
            "UPDATE users SET email = $2, password = $3, status = $4, roles = $5, \
             activation_key = $6, password_reset_key = $7 WHERE username = $1",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.status.as_str())
        .bind(roles_to_vec(user))
        .bind(&user.activation_key)
        .bind(&user.password_reset_key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, username: &str) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, page: i64, size: i64) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT username, email, password, status, roles, activation_key, password_reset_key \
             FROM users ORDER BY username LIMIT $1 OFFSET $2",
        )
        .bind(size)
        .bind(page.saturating_mul(size))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }
}

fn roles_to_vec(user: &User) -> Vec<String> {
    user.roles.iter().map(|r| r.to_string()).collect()
}

#[derive(FromRow)]
struct UserRow {
    username: String,
    email: String,
    password: String,
    status: String,
    roles: Vec<String>,
    activation_key: Option<String>,
    password_reset_key: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<User> {
        let status = row.status.parse().map_err(Error::Internal)?;
        let roles = row
            .roles
            .iter()
            .map(|r| r.parse().map_err(Error::Internal))
            .collect::<Result<_>>()?;
        Ok(User {
            username: row.username,
            email: row.email,
            password: row.password,
            status,
            roles,
            activation_key: row.activation_key,
            password_reset_key: row.password_reset_key,
        })
    }
}
