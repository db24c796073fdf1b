/// JWT token service
///
/// Issues and verifies the signed, time-limited identity tokens used for
/// stateless authentication. Tokens are signed using HS256 (HMAC-SHA256) and
/// carry the identity ID, email and role.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable, default 7 days, no leeway
/// - **Validation**: Signature, issuer and expiration checks
/// - **Single key**: Tokens signed with any other key are rejected
///
/// A token stays valid until it expires, even if the identity's role changes
/// or the identity is removed. There is no revocation list.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::jwt::{JwtError, TokenService};
/// use taskdesk_shared::models::user::Role;
/// use chrono::{Duration, Utc};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::with_ttl("secret-key-at-least-32-bytes-long!", Duration::hours(1));
/// let now = Utc::now();
///
/// let token = tokens.issue_at(Uuid::new_v4(), "user@example.com", Role::Admin, now)?;
/// assert!(tokens.verify_at(&token, now).is_ok());
///
/// let later = now + Duration::hours(2);
/// assert!(matches!(tokens.verify_at(&token, later), Err(JwtError::ExpiredToken)));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

/// Issuer claim stamped on every token
pub const ISSUER: &str = "taskdesk";

/// Error type for token operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, issuer or structure did not check out
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Current time is past the embedded expiry
    #[error("Token has expired")]
    ExpiredToken,
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (identity ID)
/// - `iss`: Issuer (always "taskdesk")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
///
/// # Custom Claims
///
/// - `email`: Identity email at issuance time
/// - `role`: Identity role at issuance time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - identity ID
    pub sub: Uuid,

    /// Issuer - always "taskdesk"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Email (custom claim)
    pub email: String,

    /// Role (custom claim)
    pub role: Role,
}

impl Claims {
    /// Builds claims issued at `now` and expiring after `ttl`
    ///
    /// Fails when the expiry falls outside the representable date range.
    pub fn new(
        user_id: Uuid,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, JwtError> {
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| JwtError::CreateError(format!("Token lifetime {} out of range", ttl)))?;

        Ok(Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            email: email.to_string(),
            role,
        })
    }

    /// Checks if the claims are expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}

/// Identity payload recovered from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Claims read from a token WITHOUT signature verification
///
/// Diagnostic only. There is deliberately no conversion from this type into
/// [`VerifiedIdentity`] or an authentication context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnverifiedClaims {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub exp: Option<i64>,
}

/// Token service
///
/// Owns the signing key and token lifetime. Construct one per process from
/// configuration and share it behind an `Arc`.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Default token lifetime
    pub fn default_ttl() -> Duration {
        Duration::days(7)
    }

    /// Creates a token service with the default 7 day lifetime
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Self::default_ttl())
    }

    /// Creates a token service with a custom lifetime
    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for an identity, using the current time
    pub fn issue(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, JwtError> {
        self.issue_at(user_id, email, role, Utc::now())
    }

    /// Issues a token as if the clock read `now`
    ///
    /// Deterministic for a fixed key and clock.
    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, email, role, now, self.ttl)?;

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token against the current time
    ///
    /// # Errors
    ///
    /// - `JwtError::InvalidToken` if the signature, issuer or format is wrong
    /// - `JwtError::ExpiredToken` if the token has expired
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token as if the clock read `now`
    ///
    /// The signature is checked before expiry, so a forged token reports
    /// `InvalidToken` even when its `exp` is in the past.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedIdentity, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        // Expiry is compared against the supplied clock below.
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?
            .claims;

        if claims.is_expired_at(now) {
            return Err(JwtError::ExpiredToken);
        }

        Ok(VerifiedIdentity {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }

    /// Best-effort read of a token's payload, see [`decode_unverified`]
    pub fn decode(&self, token: &str) -> Option<UnverifiedClaims> {
        decode_unverified(token)
    }
}

/// Reads a token's claims without checking its signature or expiry
///
/// Returns None for anything that isn't a structurally valid JWT. Never use
/// the result for authorization decisions.
pub fn decode_unverified(token: &str) -> Option<UnverifiedClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<UnverifiedClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_default_ttl_is_seven_days() {
        let tokens = TokenService::new(SECRET);
        assert_eq!(tokens.ttl(), Duration::days(7));
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let tokens = TokenService::with_ttl(SECRET, Duration::weeks(1_000_000_000));

        let result = tokens.issue(Uuid::new_v4(), "user@example.com", Role::User);
        assert!(matches!(result, Err(JwtError::CreateError(_))));
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new(SECRET);
        let user_id = Uuid::new_v4();

        let token = tokens
            .issue(user_id, "user@example.com", Role::User)
            .expect("Should issue token");
        let identity = tokens.verify(&token).expect("Should verify token");

        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email, "user@example.com");
        assert_eq!(identity.role, Role::User);
    }

    #[test]
    fn test_issue_is_deterministic_for_fixed_clock() {
        let tokens = TokenService::new(SECRET);
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let a = tokens.issue_at(user_id, "a@example.com", Role::Admin, now).unwrap();
        let b = tokens.issue_at(user_id, "a@example.com", Role::Admin, now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_expired_once_clock_passes_expiry() {
        let tokens = TokenService::with_ttl(SECRET, Duration::minutes(30));
        let issued = Utc::now();
        let token = tokens
            .issue_at(Uuid::new_v4(), "user@example.com", Role::User, issued)
            .unwrap();

        // Exactly at expiry is still valid
        assert!(tokens.verify_at(&token, issued + Duration::minutes(30)).is_ok());

        let result = tokens.verify_at(&token, issued + Duration::minutes(30) + Duration::seconds(1));
        assert_eq!(result, Err(JwtError::ExpiredToken));
    }

    #[test]
    fn test_already_expired_token_rejected_by_verify() {
        let tokens = TokenService::with_ttl(SECRET, Duration::seconds(-3600));
        let token = tokens.issue(Uuid::new_v4(), "user@example.com", Role::User).unwrap();

        assert_eq!(tokens.verify(&token), Err(JwtError::ExpiredToken));
    }

    #[test]
    fn test_different_key_is_invalid() {
        let issuer = TokenService::new(SECRET);
        let other = TokenService::new("another-secret-key-also-32-bytes-long");

        let token = issuer.issue(Uuid::new_v4(), "user@example.com", Role::User).unwrap();
        assert!(matches!(other.verify(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        let issuer = TokenService::with_ttl(SECRET, Duration::seconds(-60));
        let other = TokenService::new("another-secret-key-also-32-bytes-long");

        let token = issuer.issue(Uuid::new_v4(), "user@example.com", Role::User).unwrap();
        assert!(matches!(other.verify(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let tokens = TokenService::new(SECRET);
        assert!(matches!(tokens.verify("not-a-jwt"), Err(JwtError::InvalidToken(_))));
        assert!(matches!(tokens.verify(""), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_decode_unverified_reads_foreign_tokens() {
        let foreign = TokenService::new("another-secret-key-also-32-bytes-long");
        let user_id = Uuid::new_v4();
        let token = foreign.issue(user_id, "user@example.com", Role::Admin).unwrap();

        let tokens = TokenService::new(SECRET);
        let claims = tokens.decode(&token).expect("Should decode structure");
        assert_eq!(claims.sub, Some(user_id.to_string()));
        assert_eq!(claims.email.as_deref(), Some("user@example.com"));
        assert_eq!(claims.role.as_deref(), Some("ADMIN"));

        // Same token still fails real verification
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_decode_unverified_garbage() {
        assert!(decode_unverified("definitely.not.jwt").is_none());
        assert!(decode_unverified("").is_none());
    }

    #[test]
    fn test_debug_hides_keys() {
        let tokens = TokenService::new(SECRET);
        let debug = format!("{:?}", tokens);
        assert!(!debug.contains(SECRET));
    }
}
