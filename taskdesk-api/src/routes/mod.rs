/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check and API info endpoints
/// - `auth`: Account endpoints (register, register-admin, login, me)
/// - `tasks`: Task CRUD endpoints

pub mod auth;
pub mod health;
pub mod tasks;
