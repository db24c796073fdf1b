//! # Taskdesk Shared Library
//!
//! This crate contains the domain types, authentication primitives, storage
//! backends and business operations used by the Taskdesk API server.
//!
//! ## Module Organization
//!
//! - `models`: Users, tasks and their persistence queries
//! - `auth`: Token service, password hashing, access policy and request gate
//! - `store`: Storage traits with PostgreSQL and in-memory backends
//! - `db`: Connection pool and migration helpers
//! - `services`: Account and task operations built on the pieces above

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Taskdesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
