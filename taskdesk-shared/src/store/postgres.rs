/// PostgreSQL storage backend
///
/// Thin adapter from the store traits onto the model queries. Each call is a
/// single statement, so concurrent updates to one task are last-write-wins.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::models::task::{CreateTask, Task, TaskQuery, UpdateTask};
use crate::models::user::{normalize_email, CreateUser, User};

/// Store backed by a sqlx connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps constraint violations onto domain errors
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let on_email = db_err
                .constraint()
                .map(|name| name.contains("email"))
                .unwrap_or(true);
            if on_email {
                return StoreError::DuplicateEmail;
            }
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(
                db_err.constraint().unwrap_or("foreign key").to_string(),
            );
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, mut data: CreateUser) -> Result<User, StoreError> {
        data.email = normalize_email(&data.email);
        User::create(&self.pool, data).await.map_err(map_write_error)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, &normalize_email(email)).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        Task::create(&self.pool, data).await.map_err(map_write_error)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<(Vec<Task>, i64), StoreError> {
        let tasks = Task::list(&self.pool, query).await?;
        let total = Task::count(&self.pool, query).await?;
        Ok((tasks, total))
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}
