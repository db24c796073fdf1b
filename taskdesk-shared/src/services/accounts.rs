/// Account operations: registration, login and profile lookup
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::jwt::TokenService;
/// use taskdesk_shared::models::user::Role;
/// use taskdesk_shared::services::accounts::{login, register, LoginInput, RegisterInput};
/// use taskdesk_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let tokens = TokenService::new("a-secret-key-that-is-at-least-32-bytes");
///
/// let registered = register(&store, &tokens, RegisterInput {
///     email: "jane@example.com".to_string(),
///     password: "Passw0rd".to_string(),
///     name: "Jane".to_string(),
/// }).await?;
/// assert_eq!(registered.user.role, Role::User);
///
/// let session = login(&store, &tokens, LoginInput {
///     email: "JANE@example.com".to_string(),
///     password: "Passw0rd".to_string(),
/// }).await?;
/// assert_eq!(session.user.id, registered.user.id);
/// # Ok(())
/// # }
/// ```

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info, warn};
use validator::Validate;

use super::{field_errors, FieldError, ServiceError};
use crate::auth::jwt::TokenService;
use crate::auth::middleware::AuthContext;
use crate::auth::password::{
    dummy_hash, hash_password_blocking, validate_password_strength, verify_password_blocking,
};
use crate::models::user::{normalize_email, CreateUser, Role, User, UserProfile};
use crate::store::UserStore;

/// Account settings taken from configuration
#[derive(Debug, Clone, Default)]
pub struct AccountSettings {
    /// Secret required to register an ADMIN; None disables admin registration
    pub admin_secret: Option<String>,
}

/// Registration request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterInput {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,

    pub password: String,

    #[validate(length(
        min = 2,
        max = 100,
        message = "Name must be between 2 and 100 characters"
    ))]
    pub name: String,
}

impl RegisterInput {
    fn normalized(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            name: self.name.trim().to_string(),
            ..self
        }
    }

    fn check(&self) -> Vec<FieldError> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };
        if let Err(message) = validate_password_strength(&self.password) {
            errors.push(FieldError::new("password", message));
        }
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        errors
    }
}

/// Admin registration request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminInput {
    #[serde(flatten)]
    pub account: RegisterInput,

    #[serde(default)]
    pub admin_secret: String,
}

/// Login request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginInput {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token plus public profile, returned by register and login
#[derive(Debug, Clone, Serialize)]
pub struct AuthResult {
    pub token: String,
    pub user: UserProfile,
}

/// Registers a USER
pub async fn register<S>(
    store: &S,
    tokens: &TokenService,
    input: RegisterInput,
) -> Result<AuthResult, ServiceError>
where
    S: UserStore + ?Sized,
{
    let input = input.normalized();
    let errors = input.check();
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let user = create_account(store, input, Role::User).await?;
    info!(user_id = %user.id, email = %user.email, "New user registered");

    issue_for(tokens, &user)
}

/// Registers an ADMIN, gated on the configured admin secret
pub async fn register_admin<S>(
    store: &S,
    tokens: &TokenService,
    settings: &AccountSettings,
    input: RegisterAdminInput,
) -> Result<AuthResult, ServiceError>
where
    S: UserStore + ?Sized,
{
    let account = input.account.normalized();
    let mut errors = account.check();
    if input.admin_secret.is_empty() {
        errors.push(FieldError::new("adminSecret", "Admin secret is required"));
    }
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let authorized = settings
        .admin_secret
        .as_deref()
        .map(|expected| secrets_match(expected, &input.admin_secret))
        .unwrap_or(false);
    if !authorized {
        warn!(email = %account.email, "Admin registration with invalid secret");
        return Err(ServiceError::InvalidAdminSecret);
    }

    let user = create_account(store, account, Role::Admin).await?;
    info!(user_id = %user.id, email = %user.email, "Admin user registered");

    issue_for(tokens, &user)
}

/// Authenticates by email and password
///
/// Unknown email and wrong password both yield `InvalidCredentials`.
pub async fn login<S>(
    store: &S,
    tokens: &TokenService,
    input: LoginInput,
) -> Result<AuthResult, ServiceError>
where
    S: UserStore + ?Sized,
{
    let input = LoginInput {
        email: normalize_email(&input.email),
        ..input
    };
    input.validate()?;

    let user = store.find_user_by_email(&input.email).await?;

    let (hash, user) = match user {
        Some(user) => (user.password_hash.clone(), Some(user)),
        None => (dummy_hash()?.to_string(), None),
    };
    let valid = verify_password_blocking(input.password, hash).await?;

    match user {
        Some(user) if valid => {
            info!(user_id = %user.id, "User logged in");
            issue_for(tokens, &user)
        }
        Some(user) => {
            debug!(user_id = %user.id, "Login rejected: wrong password");
            Err(ServiceError::InvalidCredentials)
        }
        None => {
            debug!("Login rejected: unknown email");
            Err(ServiceError::InvalidCredentials)
        }
    }
}

/// Loads the profile of the authenticated identity
pub async fn current_user<S>(store: &S, auth: &AuthContext) -> Result<UserProfile, ServiceError>
where
    S: UserStore + ?Sized,
{
    store
        .find_user_by_id(auth.user_id)
        .await?
        .map(|user| UserProfile::from(&user))
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
}

async fn create_account<S>(store: &S, input: RegisterInput, role: Role) -> Result<User, ServiceError>
where
    S: UserStore + ?Sized,
{
    if store.find_user_by_email(&input.email).await?.is_some() {
        return Err(ServiceError::DuplicateEmail);
    }

    let password_hash = hash_password_blocking(input.password).await?;

    Ok(store
        .create_user(CreateUser {
            email: input.email,
            password_hash,
            name: input.name,
            role,
        })
        .await?)
}

fn issue_for(tokens: &TokenService, user: &User) -> Result<AuthResult, ServiceError> {
    let token = tokens.issue(user.id, &user.email, user.role)?;
    Ok(AuthResult {
        token,
        user: UserProfile::from(user),
    })
}

/// Compares secrets in constant time
///
/// Both sides are reduced to an HMAC tag first, so the comparison does not
/// leak the secret's length either.
fn secrets_match(expected: &str, candidate: &str) -> bool {
    type HmacSha256 = Hmac<Sha256>;

    let Ok(mut mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    mac.update(expected.as_bytes());
    let expected_tag = mac.finalize().into_bytes();

    let Ok(mut mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    mac.update(candidate.as_bytes());
    mac.verify_slice(&expected_tag).is_ok()
}
