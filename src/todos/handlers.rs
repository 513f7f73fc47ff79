use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{auth::AuthUser, error::ApiError, state::AppState};

use super::{dto::TodoInput, repo_types::TodoItem};

const NOT_FOUND_OR_UNAUTHORIZED: &str = "Todo item not found or unauthorized";
const NOT_FOUND_OR_NO_PERMISSION: &str = "Todo item not found or you do not have permission";

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos/create", post(create_todo))
        .route("/todos/list", get(list_todos))
        .route("/todos/:id", put(update_todo))
        .route("/todos/delete/:id", delete(delete_todo))
}

fn todo_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    match path {
        Ok(Path(id)) if id > 0 => Ok(id),
        Ok(Path(id)) => Err(ApiError::BadRequest(format!("Invalid todo ID in URL: {id}"))),
        Err(rejection) => {
            warn!(error = %rejection, "bad todo id");
            Err(ApiError::BadRequest("Missing or invalid todo ID in URL".into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<TodoInput>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoItem>), ApiError> {
    let Json(input) = payload?;

    let todo = state
        .store
        .create_todo(user_id, input)
        .await
        .map_err(ApiError::internal("Unable to create todo item"))?;

    info!(user_id, todo_id = todo.id, "todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

#[instrument(skip(state))]
pub async fn list_todos(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TodoItem>>, ApiError> {
    let todos = state
        .store
        .list_todos(user_id)
        .await
        .map_err(ApiError::internal("Failed to retrieve todos"))?;
    Ok(Json(todos))
}

#[instrument(skip(state, path, payload))]
pub async fn update_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TodoInput>, JsonRejection>,
) -> Result<Json<TodoItem>, ApiError> {
    let id = todo_id(path)?;
    let Json(input) = payload?;

    let existing = state
        .store
        .find_todo(user_id, id)
        .await
        .map_err(ApiError::internal("Failed to update todo item"))?
        .ok_or(ApiError::NotFound(NOT_FOUND_OR_UNAUTHORIZED))?;

    // Id and owner come from the stored row, never from the body.
    let saved = state
        .store
        .replace_todo(existing.user_id, existing.id, input)
        .await
        .map_err(ApiError::internal("Failed to update todo item"))?
        .ok_or(ApiError::NotFound(NOT_FOUND_OR_UNAUTHORIZED))?;

    info!(user_id, todo_id = saved.id, "todo replaced");
    Ok(Json(saved))
}

#[instrument(skip(state, path))]
pub async fn delete_todo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = todo_id(path)?;

    let affected = state
        .store
        .delete_todo(user_id, id)
        .await
        .map_err(ApiError::internal("Failed to delete todo item"))?;
    if affected == 0 {
        return Err(ApiError::NotFound(NOT_FOUND_OR_NO_PERMISSION));
    }

    info!(user_id, todo_id = id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}
