/// Authentication middleware for Axum
///
/// This module provides the authentication gate: it extracts a bearer token
/// from the request, verifies it with the [`TokenService`], and attaches the
/// resulting [`AuthContext`] to the request extensions.
///
/// The gate only establishes identity. Whether that identity may touch a
/// particular task is decided by [`super::authorization`].
///
/// # Request Extensions
///
/// After successful authentication, middleware adds:
/// - `AuthContext`: Contains user_id, email and role
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Router};
/// use taskdesk_shared::auth::jwt::TokenService;
/// use taskdesk_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
///
/// async fn protected_handler(auth: AuthContext) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// let tokens = Arc::new(TokenService::new("your-jwt-secret-at-least-32-bytes"));
/// let app: Router = Router::new()
///     .route("/protected", get(protected_handler))
///     .layer(middleware::from_fn_with_state(tokens, jwt_auth_middleware));
/// ```

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{JwtError, TokenService, VerifiedIdentity};
use crate::models::user::Role;

/// Authentication context added to request extensions
///
/// Handlers receive it either as an extractor argument or via
/// `Extension<AuthContext>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated identity ID
    pub user_id: Uuid,

    /// Email embedded in the token
    pub email: String,

    /// Role embedded in the token
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: Uuid, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<VerifiedIdentity> for AuthContext {
    fn from(identity: VerifiedIdentity) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
            role: identity.role,
        }
    }
}

/// Error type for authentication middleware
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Authorization header absent or not a bearer credential
    #[error("No token provided. Authorization denied.")]
    MissingCredential,

    /// Token was presented but did not verify
    #[error("{}", unauthenticated_message(.0))]
    Unauthenticated(JwtError),
}

fn unauthenticated_message(err: &JwtError) -> &'static str {
    match err {
        JwtError::ExpiredToken => "Token expired. Please login again.",
        JwtError::InvalidToken(_) | JwtError::CreateError(_) => "Invalid token",
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "message": self.to_string(),
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
///
/// Returns `AuthError::MissingCredential` if the header is absent, not valid
/// UTF-8 or lacks the `Bearer ` prefix.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingCredential)
}

/// Runs the full gate against a set of request headers
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthContext, AuthError> {
    let token = extract_bearer(headers)?;

    match tokens.verify(token) {
        Ok(identity) => Ok(identity.into()),
        Err(err) => {
            // Diagnostic only; the unverified payload never becomes an identity.
            match tokens.decode(token) {
                Some(claims) => tracing::debug!(
                    sub = claims.sub.as_deref().unwrap_or("-"),
                    exp = claims.exp,
                    error = %err,
                    "Rejected bearer token"
                ),
                None => tracing::debug!(error = %err, "Rejected malformed bearer token"),
            }
            Err(AuthError::Unauthenticated(err))
        }
    }
}

/// JWT authentication middleware
///
/// Validates JWT tokens from the `Authorization: Bearer <token>` header.
///
/// # Errors
///
/// Returns 401 Unauthorized if:
/// - Authorization header is missing or not a bearer credential
/// - Token signature or issuer is invalid
/// - Token has expired
pub async fn jwt_auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_context = authenticate(req.headers(), &tokens)?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredential)
    }
}
