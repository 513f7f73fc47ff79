use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::{
    auth::repo_types::{NewUser, User},
    todos::{dto::TodoInput, repo as todo_repo, repo_types::TodoItem},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence seam for users and their todo items.
///
/// Every todo operation takes the owner's id and only ever sees that
/// owner's live rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;

    async fn create_todo(&self, user_id: i64, input: TodoInput) -> StoreResult<TodoItem>;
    async fn list_todos(&self, user_id: i64) -> StoreResult<Vec<TodoItem>>;
    async fn find_todo(&self, user_id: i64, id: i64) -> StoreResult<Option<TodoItem>>;
    async fn replace_todo(
        &self,
        user_id: i64,
        id: i64,
        input: TodoInput,
    ) -> StoreResult<Option<TodoItem>>;
    async fn delete_todo(&self, user_id: i64, id: i64) -> StoreResult<u64>;
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        info!("database migrated");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.db, email).await?)
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        User::create(&self.db, &new).await.map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            other => StoreError::Database(other),
        })
    }

    async fn create_todo(&self, user_id: i64, input: TodoInput) -> StoreResult<TodoItem> {
        Ok(todo_repo::insert(&self.db, user_id, &input).await?)
    }

    async fn list_todos(&self, user_id: i64) -> StoreResult<Vec<TodoItem>> {
        Ok(todo_repo::list_by_user(&self.db, user_id).await?)
    }

    async fn find_todo(&self, user_id: i64, id: i64) -> StoreResult<Option<TodoItem>> {
        Ok(todo_repo::find_for_user(&self.db, user_id, id).await?)
    }

    async fn replace_todo(
        &self,
        user_id: i64,
        id: i64,
        input: TodoInput,
    ) -> StoreResult<Option<TodoItem>> {
        Ok(todo_repo::replace(&self.db, user_id, id, &input).await?)
    }

    async fn delete_todo(&self, user_id: i64, id: i64) -> StoreResult<u64> {
        Ok(todo_repo::soft_delete(&self.db, user_id, id).await?)
    }
}

#[cfg(test)]
pub use memory::MemoryStore;

#[cfg(test)]
mod memory {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::{RecordStore, StoreError, StoreResult};
    use crate::{
        auth::repo_types::{NewUser, User},
        todos::{dto::TodoInput, repo_types::TodoItem},
    };

    /// In-process store for HTTP tests; mirrors the SQL filters of `PgStore`.
    #[derive(Default)]
    pub struct MemoryStore {
        inner: Mutex<Tables>,
    }

    #[derive(Default)]
    struct Tables {
        users: Vec<User>,
        todos: Vec<TodoItem>,
        next_user_id: i64,
        next_todo_id: i64,
    }

    fn live_todo(t: &TodoItem, user_id: i64, id: i64) -> bool {
        t.id == id && t.user_id == user_id && t.deleted_at.is_none()
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables
                .users
                .iter()
                .find(|u| u.email == email && u.deleted_at.is_none())
                .cloned())
        }

        async fn create_user(&self, new: NewUser) -> StoreResult<User> {
            let mut tables = self.inner.lock().unwrap();
            if tables
                .users
                .iter()
                .any(|u| u.email == new.email && u.deleted_at.is_none())
            {
                return Err(StoreError::DuplicateEmail);
            }
            tables.next_user_id += 1;
            let now = OffsetDateTime::now_utc();
            let user = User {
                id: tables.next_user_id,
                first_name: new.first_name,
                last_name: new.last_name,
                email: new.email,
                password_hash: new.password_hash,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            tables.users.push(user.clone());
            Ok(user)
        }

        async fn create_todo(&self, user_id: i64, input: TodoInput) -> StoreResult<TodoItem> {
            let mut tables = self.inner.lock().unwrap();
            tables.next_todo_id += 1;
            let now = OffsetDateTime::now_utc();
            let todo = TodoItem {
                id: tables.next_todo_id,
                title: input.title,
                description: input.description,
                completed: input.completed,
                due_date: input.due_date,
                priority: input.priority,
                user_id,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            tables.todos.push(todo.clone());
            Ok(todo)
        }

        async fn list_todos(&self, user_id: i64) -> StoreResult<Vec<TodoItem>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables
                .todos
                .iter()
                .filter(|t| t.user_id == user_id && t.deleted_at.is_none())
                .cloned()
                .collect())
        }

        async fn find_todo(&self, user_id: i64, id: i64) -> StoreResult<Option<TodoItem>> {
            let tables = self.inner.lock().unwrap();
            Ok(tables
                .todos
                .iter()
                .find(|t| live_todo(t, user_id, id))
                .cloned())
        }

        async fn replace_todo(
            &self,
            user_id: i64,
            id: i64,
            input: TodoInput,
        ) -> StoreResult<Option<TodoItem>> {
            let mut tables = self.inner.lock().unwrap();
            let Some(todo) = tables.todos.iter_mut().find(|t| live_todo(t, user_id, id)) else {
                return Ok(None);
            };
            todo.title = input.title;
            todo.description = input.description;
            todo.completed = input.completed;
            todo.due_date = input.due_date;
            todo.priority = input.priority;
            todo.updated_at = OffsetDateTime::now_utc();
            Ok(Some(todo.clone()))
        }

        async fn delete_todo(&self, user_id: i64, id: i64) -> StoreResult<u64> {
            let mut tables = self.inner.lock().unwrap();
            let mut affected = 0;
            for todo in tables.todos.iter_mut().filter(|t| live_todo(t, user_id, id)) {
                todo.deleted_at = Some(OffsetDateTime::now_utc());
                affected += 1;
            }
            Ok(affected)
        }
    }
}
