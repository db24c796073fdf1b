/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Register a USER
/// - `POST /api/v1/auth/register-admin` - Register an ADMIN with the admin secret
/// - `POST /api/v1/auth/login` - Exchange credentials for a token
/// - `GET /api/v1/auth/me` - Profile of the authenticated caller

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ApiJson,
    response::ApiResponse,
};
use axum::extract::State;
use serde::Serialize;
use taskdesk_shared::{
    auth::middleware::AuthContext,
    models::user::UserProfile,
    services::accounts::{self, AuthResult, LoginInput, RegisterAdminInput, RegisterInput},
};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "jane@example.com",
///   "password": "Secret123",
///   "name": "Jane Doe"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "success": true,
///   "message": "User registered successfully",
///   "data": { "token": "eyJ...", "user": { "id": "uuid", "role": "USER", ... } }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterInput>,
) -> ApiResult<ApiResponse<AuthResult>> {
    let result = accounts::register(state.store.as_ref(), &state.tokens, req).await?;

    Ok(ApiResponse::created(result).with_message("User registered successfully"))
}

/// Register a new admin
///
/// Same body as `register` plus `adminSecret`.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
/// - `403 Forbidden`: Admin secret does not match, or no admin secret is configured
/// - `429 Too Many Requests`: Admin registration rate limit exceeded
pub async fn register_admin(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterAdminInput>,
) -> ApiResult<ApiResponse<AuthResult>> {
    let result =
        accounts::register_admin(state.store.as_ref(), &state.tokens, &state.accounts, req).await?;

    Ok(ApiResponse::created(result).with_message("Admin user registered successfully"))
}

/// Login with email and password
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid email or password
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginInput>,
) -> ApiResult<ApiResponse<AuthResult>> {
    let result = accounts::login(state.store.as_ref(), &state.tokens, req).await?;

    Ok(ApiResponse::ok(result).with_message("Login successful"))
}

/// Current user profile
///
/// # Errors
///
/// - `401 Unauthorized`: Missing, invalid or expired token
/// - `404 Not Found`: The identity behind the token no longer exists
pub async fn me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<ApiResponse<MeResponse>> {
    let user = accounts::current_user(state.store.as_ref(), &auth).await?;

    Ok(ApiResponse::ok(MeResponse { user }))
}
