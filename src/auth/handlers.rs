use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::NewUser,
    },
    error::ApiError,
    state::AppState,
    store::StoreError,
};

/// Same body for unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
const USER_EXISTS: &str = "User already exists";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);

    // Fast path only; the unique index on users.email settles concurrent sign-ups.
    let existing = state
        .store
        .find_user_by_email(&email)
        .await
        .map_err(ApiError::internal("Unable to create user"))?;
    if existing.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::BadRequest(USER_EXISTS.into()));
    }

    let password_hash =
        hash_password(&payload.password).map_err(ApiError::internal("Unable to hash password"))?;

    let user = match state
        .store
        .create_user(NewUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email,
            password_hash,
        })
        .await
    {
        Ok(u) => u,
        Err(StoreError::DuplicateEmail) => {
            warn!("email registered concurrently");
            return Err(ApiError::BadRequest(USER_EXISTS.into()));
        }
        Err(e) => return Err(ApiError::internal("Unable to create user")(e)),
    };

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::OK, "User created successfully"))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);

    let user = match state.store.find_user_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%email, "login unknown email");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
        }
        Err(e) => return Err(ApiError::internal("Unable to log in")(e)),
    };

    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(ApiError::internal("Unable to log in"))?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    let token = JwtKeys::from_ref(&state)
        .sign(user.id)
        .map_err(ApiError::internal("Unable to generate token"))?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::repo_types::User,
        store::{RecordStore, StoreResult},
        todos::{dto::TodoInput, repo_types::TodoItem},
    };
    use axum::{async_trait, body, response::IntoResponse};
    use std::sync::Arc;

    /// Lookup misses but the insert hits the unique index, as when two
    /// sign-ups for one email interleave.
    struct ConcurrentSignupStore;

    #[async_trait]
    impl RecordStore for ConcurrentSignupStore {
        async fn find_user_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }
        async fn create_user(&self, _new: NewUser) -> StoreResult<User> {
            Err(StoreError::DuplicateEmail)
        }
        async fn create_todo(&self, _user_id: i64, _input: TodoInput) -> StoreResult<TodoItem> {
            unreachable!("registration never touches todos")
        }
        async fn list_todos(&self, _user_id: i64) -> StoreResult<Vec<TodoItem>> {
            Ok(Vec::new())
        }
        async fn find_todo(&self, _user_id: i64, _id: i64) -> StoreResult<Option<TodoItem>> {
            Ok(None)
        }
        async fn replace_todo(
            &self,
            _user_id: i64,
            _id: i64,
            _input: TodoInput,
        ) -> StoreResult<Option<TodoItem>> {
            Ok(None)
        }
        async fn delete_todo(&self, _user_id: i64, _id: i64) -> StoreResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn unique_violation_on_insert_reads_as_existing_user() {
        let state = AppState::from_parts(
            AppState::fake().config,
            Arc::new(ConcurrentSignupStore),
        );
        let payload = RegisterRequest {
            first_name: String::new(),
            last_name: String::new(),
            email: "race@x.com".into(),
            password: "p".into(),
        };

        let resp = register(State(state), Ok(Json(payload))).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], USER_EXISTS.as_bytes());
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  A@X.com "), "a@x.com");
    }

    #[test]
    fn token_response_shape() {
        let json = serde_json::to_value(TokenResponse { token: "t".into() }).unwrap();
        assert_eq!(json, serde_json::json!({ "token": "t" }));
    }
}
