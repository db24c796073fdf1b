/// PostgreSQL plumbing
///
/// - `pool`: connection pool construction and the health probe
/// - `migrations`: embedded schema migrations
///
/// The queries themselves live next to their records in [`crate::models`].

pub mod migrations;
pub mod pool;
