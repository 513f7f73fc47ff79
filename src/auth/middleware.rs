use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::{extractors::AuthUser, jwt::JwtKeys};
use crate::error::ApiError;

/// Single body for every token failure.
pub const INVALID_TOKEN: &str = "invalid or missing token";

/// Verifies the bearer token and attaches [`AuthUser`] to the request.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            warn!("missing authorization header");
            ApiError::Unauthorized(INVALID_TOKEN)
        })?;

    let token = header.strip_prefix("Bearer ").unwrap_or(header);

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        ApiError::Unauthorized(INVALID_TOKEN)
    })?;

    req.extensions_mut().insert(AuthUser(claims.user_id));
    Ok(next.run(req).await)
}
