use sqlx::PgPool;

use super::{dto::TodoInput, repo_types::TodoItem};

// Every query is scoped by owner and skips soft-deleted rows.

pub async fn insert(db: &PgPool, user_id: i64, input: &TodoInput) -> Result<TodoItem, sqlx::Error> {
    sqlx::query_as::<_, TodoItem>(
        r#"
        INSERT INTO todo_items (title, description, completed, due_date, priority, user_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, title, description, completed, due_date, priority, user_id,
                  created_at, updated_at, deleted_at
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.completed)
    .bind(input.due_date)
    .bind(&input.priority)
    .bind(user_id)
    .fetch_one(db)
    .await
}

pub async fn list_by_user(db: &PgPool, user_id: i64) -> Result<Vec<TodoItem>, sqlx::Error> {
    sqlx::query_as::<_, TodoItem>(
        r#"
        SELECT id, title, description, completed, due_date, priority, user_id,
               created_at, updated_at, deleted_at
        FROM todo_items
        WHERE user_id = $1 AND deleted_at IS NULL
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn find_for_user(
    db: &PgPool,
    user_id: i64,
    id: i64,
) -> Result<Option<TodoItem>, sqlx::Error> {
    sqlx::query_as::<_, TodoItem>(
        r#"
        SELECT id, title, description, completed, due_date, priority, user_id,
               created_at, updated_at, deleted_at
        FROM todo_items
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Full overwrite of the mutable columns.
pub async fn replace(
    db: &PgPool,
    user_id: i64,
    id: i64,
    input: &TodoInput,
) -> Result<Option<TodoItem>, sqlx::Error> {
    sqlx::query_as::<_, TodoItem>(
        r#"
        UPDATE todo_items
           SET title = $3,
               description = $4,
               completed = $5,
               due_date = $6,
               priority = $7,
               updated_at = now()
         WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        RETURNING id, title, description, completed, due_date, priority, user_id,
                  created_at, updated_at, deleted_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.completed)
    .bind(input.due_date)
    .bind(&input.priority)
    .fetch_optional(db)
    .await
}

/// Soft delete; returns the number of rows affected.
pub async fn soft_delete(db: &PgPool, user_id: i64, id: i64) -> Result<u64, sqlx::Error> {
    let done = sqlx::query(
        r#"
        UPDATE todo_items
           SET deleted_at = now()
         WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(done.rows_affected())
}
