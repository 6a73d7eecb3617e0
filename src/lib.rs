pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::store::UserStore;
use crate::services::{account_service::AccountService, user_service::UserService};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub account_service: AccountService,
    pub user_service: UserService,
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, jwt_secret: String) -> Self {
        let account_service = AccountService::new(store.clone(), jwt_secret.clone());
        let user_service = UserService::new(store.clone());

        Self {
            store,
            account_service,
            user_service,
            jwt_secret,
        }
    }
}

/// Assembles the full application router. Access control is layered per
/// route group: public routes carry no middleware, `/api/v1/accounts/current`
/// and `/api/v1/updatepassword` require a valid bearer token, and the
/// `/api/v1/users` tree additionally requires the ADMIN role.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/v1/signup", post(routes::account::sign_up))
        .route("/api/v1/signin", post(routes::account::sign_in))
        .route("/api/v1/activate", get(routes::account::activate))
        .route(
            "/api/v1/requestpasswordreset",
            post(routes::password_reset::request_password_reset),
        )
        .route(
            "/api/v1/resetpassword",
            post(routes::password_reset::reset_password),
        );

    let protected_routes = Router::new()
        .route(
            "/api/v1/accounts/current",
            get(routes::account::current_account),
        )
        .route(
            "/api/v1/updatepassword",
            put(routes::password_reset::update_password),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_bearer_auth,
        ));

    let admin_routes = Router::new()
        .route(
            "/api/v1/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/api/v1/users/:username",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
