/// Middleware modules for the API server
///
/// This module contains custom middleware for:
/// - Security headers
/// - Per-client rate limiting
/// - Development-mode error detail

pub mod error_detail;
pub mod rate_limit;
pub mod security;
