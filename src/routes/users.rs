use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::user_dto::{
        CreateUserRequest, PaginatedResponse, UpdateUserRequest, UserDto, UserListQuery,
    },
    error::Result,
    AppState,
};

const DEFAULT_PAGE: i64 = 0;
const DEFAULT_PAGE_SIZE: i64 = 100;

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(
        ("page" = Option<i64>, Query, description = "Zero-based page number"),
        ("size" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Page of users", body = Json<PaginatedResponse<UserDto>>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin")
    )
)]
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse> {
    let page = query.page.unwrap_or(DEFAULT_PAGE).max(0);
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE).max(0);
    let items = state.user_service.list(page, size).await?;
    Ok(Json(PaginatedResponse { page, size, items }))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "User found", body = Json<UserDto>),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    let user: UserDto = state.user_service.find_by_username(&username).await?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = Json<UserDto>),
        (status = 409, description = "Username or email already taken")
    )
)]
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{username}",
    params(
        ("username" = String, Path, description = "Username")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = Json<UserDto>),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.update(&username, payload).await?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{username}",
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 204, description = "User deleted (idempotent)")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse> {
    state.user_service.delete(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}
