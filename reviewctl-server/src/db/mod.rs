//! Data store - trait plus PostgreSQL and in-memory implementations
//!
//! # Design Principles
//!
//! - Multi-row writes run inside one transaction, committed on success only
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Reviewer lists come back sorted by user ID from every implementation

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use pool::create_pool;
pub use postgres::PgStore;
pub use store::{NewPullRequest, ReviewStore};
