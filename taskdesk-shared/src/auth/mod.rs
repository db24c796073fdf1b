/// Authentication and authorization utilities
///
/// This module provides the security primitives for Taskdesk:
///
/// # Modules
///
/// - [`jwt`]: Token service issuing and verifying signed identity tokens
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`authorization`]: Ownership/role access policy
/// - [`middleware`]: Request gate turning a bearer token into an [`middleware::AuthContext`]
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Tokens**: HS256 signing, 7 day default expiry, stateless verification
/// - **Policy**: ADMIN may act on any task, USER only on owned tasks
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::jwt::TokenService;
/// use taskdesk_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new("a-secret-key-that-is-at-least-32-bytes");
/// let token = tokens.issue(Uuid::new_v4(), "user@example.com", Role::User)?;
/// let identity = tokens.verify(&token)?;
/// assert_eq!(identity.role, Role::User);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
