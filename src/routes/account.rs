use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::account_dto::{AccountDto, ActivateQuery, SignInRequest, SignUpRequest, TokenDto},
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignUpRequest,
    responses(
        (status = 204, description = "Account created, pending activation"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Username or email already taken")
    )
)]
#[axum::debug_handler]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.account_service.sign_up(payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Bearer token issued", body = Json<TokenDto>),
        (status = 401, description = "Bad credentials")
    )
)]
#[axum::debug_handler]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<impl IntoResponse> {
    let token = state.account_service.sign_in(payload).await?;
    Ok(Json(TokenDto { token }))
}

#[utoipa::path(
    get,
    path = "/api/v1/activate",
    params(
        ("key" = String, Query, description = "Activation key from sign-up")
    ),
    responses(
        (status = 204, description = "Account activated"),
        (status = 400, description = "Unknown activation key")
    )
)]
#[axum::debug_handler]
pub async fn activate(
    State(state): State<AppState>,
    Query(query): Query<ActivateQuery>,
) -> Result<impl IntoResponse> {
    state.account_service.activate(&query.key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts/current",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = Json<AccountDto>),
        (status = 400, description = "User absent or inactive"),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn current_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let account: AccountDto = state.account_service.current_account(&auth.username).await?;
    Ok(Json(account))
}
