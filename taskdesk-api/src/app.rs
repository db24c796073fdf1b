/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdesk_api::{app::{build_router, AppState}, config::Config};
/// use taskdesk_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        error_detail::error_detail_layer,
        rate_limit::{admin_rate_limit_layer, rate_limit_layer, RateLimiter},
        security::SecurityHeadersLayer,
    },
    routes,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use taskdesk_shared::{
    auth::{jwt::TokenService, middleware::jwt_auth_middleware},
    services::accounts::AccountSettings,
    store::Store,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Maximum accepted request body
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Identity and task storage
    pub store: Arc<dyn Store>,

    /// Token issuing and verification
    pub tokens: Arc<TokenService>,

    pub accounts: Arc<AccountSettings>,

    /// Per-client request buckets
    pub limiter: RateLimiter,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        // Config caps JWT_EXPIRE well inside chrono's range
        let ttl = chrono::Duration::from_std(config.jwt.expires_in).unwrap_or_else(|_| {
            tracing::warn!("JWT_EXPIRE out of range, using the default lifetime");
            TokenService::default_ttl()
        });

        Self {
            store,
            tokens: Arc::new(TokenService::with_ttl(&config.jwt.secret, ttl)),
            accounts: Arc::new(AccountSettings {
                admin_secret: config.auth.admin_secret.clone(),
            }),
            limiter: RateLimiter::new(&config.rate_limit),
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                     # Health check (public)
/// └── /api/v1                     # API v1 (rate limited)
///     ├── GET /                   # Welcome
///     ├── /auth/
///     │   ├── POST /register
///     │   ├── POST /register-admin    (stricter rate limit)
///     │   ├── POST /login
///     │   └── GET  /me                (authenticated)
///     └── /tasks/                     (authenticated)
///         ├── POST   /
///         ├── GET    /
///         ├── GET    /:id
///         ├── PUT    /:id
///         └── DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Body size limit
/// 5. Development error detail
/// 6. Rate limiting (`/api/v1` only)
/// 7. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    let jwt = || from_fn_with_state(state.tokens.clone(), jwt_auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route(
            "/register-admin",
            post(routes::auth::register_admin)
                .route_layer(from_fn_with_state(state.clone(), admin_rate_limit_layer)),
        )
        .route("/login", post(routes::auth::login))
        .route("/me", get(routes::auth::me).route_layer(jwt()));

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route_layer(jwt());

    let v1_routes = Router::new()
        .route("/", get(routes::health::api_info))
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .route_layer(from_fn_with_state(state.clone(), rate_limit_layer));

    let cors = cors_layer(&state.config.api.cors_origins);
    let environment = state.config.api.environment;
    let production = state.config.is_production();

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", v1_routes)
        .fallback(route_not_found)
        .layer(from_fn_with_state(environment, error_detail_layer))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Configure CORS from the allowed origin list
fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
