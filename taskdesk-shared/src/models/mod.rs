/// Database models for Taskdesk
///
/// This module contains the domain records and their PostgreSQL queries.
///
/// # Models
///
/// - `user`: Registered identities (USER or ADMIN)
/// - `task`: Tasks owned by a single identity
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::user::{CreateUser, Role, User};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "Jane Doe".to_string(),
///     role: Role::User,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod task;
pub mod user;
