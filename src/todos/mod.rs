pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

use crate::{
    auth::{jwt::JwtKeys, middleware::require_auth},
    state::AppState,
};
use axum::{middleware::from_fn_with_state, Router};

/// Todo routes; every one of them sits behind the bearer-token middleware.
/// The keys are derived from the secret once, here, not per request.
pub fn router(keys: JwtKeys) -> Router<AppState> {
    handlers::todo_routes().route_layer(from_fn_with_state(keys, require_auth))
}
