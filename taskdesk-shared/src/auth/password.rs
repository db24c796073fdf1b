/// Password hashing and strength rules
///
/// Passwords are stored as Argon2id PHC strings. The cost parameters are
/// written into every hash, so verification keeps working if they change.
///
/// | Parameter | Value |
/// |---|---|
/// | memory | 64 MiB (`m=65536`) |
/// | passes | 3 (`t=3`) |
/// | lanes | 4 (`p=4`) |
/// | output | 32 bytes |
///
/// Hashing at these settings is deliberately slow. Async callers should use
/// [`hash_password_blocking`] and [`verify_password_blocking`].
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Passw0rd")?;
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(verify_password("Passw0rd", &hash)?);
/// assert!(!verify_password("passw0rd", &hash)?);
/// # Ok(())
/// # }
/// ```

use std::sync::OnceLock;

use argon2::password_hash::{
    rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

/// Error type for password operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored value is not a PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

const MEMORY_KIB: u32 = 64 * 1024;
const PASSES: u32 = 3;
const LANES: u32 = 4;
const OUTPUT_LEN: usize = 32;

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_KIB, PASSES, LANES, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt
///
/// Returns the PHC string, e.g. `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Checks a password against a stored PHC string
///
/// `Ok(false)` means the password is wrong; `Err` means the stored hash is
/// unusable. The digest comparison is constant time.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Minimum password length, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validates password strength
///
/// Checks that password meets minimum requirements:
/// - At least 6 characters long
/// - Contains at least one uppercase letter
/// - Contains at least one lowercase letter
/// - Contains at least one digit
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("Passw0rd").is_ok());
///
/// // Too short
/// assert!(validate_password_strength("Ab1").is_err());
///
/// // Missing digit
/// assert!(validate_password_strength("Password").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 6 characters long".to_string());
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_upper && has_lower && has_digit) {
        return Err(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number"
                .to_string(),
        );
    }

    Ok(())
}

/// Hashes a password on the blocking thread pool
///
/// Argon2id with 64 MB of memory takes tens of milliseconds; running it inline
/// would stall the async runtime.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::HashError(format!("Hashing task failed: {}", e)))?
}

/// Verifies a password on the blocking thread pool
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::VerifyError(format!("Verification task failed: {}", e)))?
}

static DUMMY_HASH: OnceLock<Result<String, PasswordError>> = OnceLock::new();

/// A valid hash of a random throwaway password
///
/// Login verifies against this when the email is unknown so that both failure
/// paths cost one Argon2 verification.
pub fn dummy_hash() -> Result<&'static str, PasswordError> {
    DUMMY_HASH
        .get_or_init(|| hash_password("taskdesk-dummy-password"))
        .as_deref()
        .map_err(Clone::clone)
}
