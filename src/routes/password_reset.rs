use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::account_dto::{EmailWrapper, ResetPasswordRequest, UpdatePasswordRequest},
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/requestpasswordreset",
    request_body = EmailWrapper,
    responses(
        (status = 204, description = "Reset key stored if the email is known; always 204")
    )
)]
#[axum::debug_handler]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<EmailWrapper>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .account_service
        .request_password_reset(&payload.email)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/resetpassword",
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password replaced, reset key consumed"),
        (status = 400, description = "Unknown reset key"),
        (status = 409, description = "New password equals the current one")
    )
)]
#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.account_service.reset_password(payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/v1/updatepassword",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, description = "Password reuse or wrong old password"),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .account_service
        .update_password(&auth.username, payload)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
