use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{Error, Result};
use crate::utils::token;
use crate::AppState;

/// Authenticated principal resolved from the bearer token, passed to
/// handlers as a request extension instead of ambient security context.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

fn bearer_token(req: &Request) -> Result<&str> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("missing authorization header".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("malformed authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("unsupported authorization scheme".to_string()))
}

/// Rejects the request unless it carries a valid, unexpired bearer token.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let subject =
        bearer_token(&req).and_then(|token| token::decode_token(token, &state.jwt_secret));
    match subject {
        Ok(username) => {
            req.extensions_mut().insert(AuthUser { username });
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

/// Bearer validation plus an ADMIN role check. Roles are resolved through
/// the user store from the token subject, never trusted from the token.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let subject =
        bearer_token(&req).and_then(|token| token::decode_token(token, &state.jwt_secret));
    let username = match subject {
        Ok(username) => username,
        Err(err) => return err.into_response(),
    };
    let user = match state.store.find_by_username(&username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Error::Unauthorized("unknown token subject".to_string()).into_response()
        }
        Err(err) => return err.into_response(),
    };
    if !user.is_admin() {
        return Error::Forbidden("insufficient role".to_string()).into_response();
    }
    req.extensions_mut().insert(AuthUser { username });
    next.run(req).await
}
