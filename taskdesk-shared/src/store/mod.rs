/// Storage abstraction for identities and tasks
///
/// Services talk to storage only through these traits, so the same business
/// rules run against PostgreSQL in production and an in-memory store in tests
/// or local demos.
///
/// # Backends
///
/// - [`postgres::PgStore`]: sqlx-backed, uses the queries in [`crate::models`]
/// - [`memory::MemoryStore`]: `RwLock`-guarded maps, no persistence

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::task::{CreateTask, Task, TaskQuery, UpdateTask};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Email already registered
    #[error("Email already registered")]
    DuplicateEmail,

    /// Referenced record does not exist
    #[error("Referenced record not found: {0}")]
    MissingReference(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Identity persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new identity
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEmail` if the normalized email exists
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Looks up by email, case-insensitively
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

/// Task persistence
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Returns one page of matching tasks, newest first, plus the total count
    async fn list_tasks(&self, query: &TaskQuery) -> Result<(Vec<Task>, i64), StoreError>;

    /// Applies the present fields and bumps `updated_at`
    ///
    /// Returns None if the task doesn't exist.
    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError>;

    /// Returns true if a task was removed
    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Complete storage backend
#[async_trait]
pub trait Store: UserStore + TaskStore {
    /// Backend name for health reporting
    fn backend(&self) -> &'static str;

    /// Checks that the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}
