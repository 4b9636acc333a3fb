//! Core business logic module
//!
//! This module contains the economy subsystem and its storage backends:
//! - `traits` - Trait abstractions for interchangeable store backends
//! - `economy` - Transfer orchestration and balance queries
//! - `memory` - In-memory backend (DashMap), used locally and in tests
//! - `postgres` - Relational backend (sqlx/PostgreSQL)

pub mod economy;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use economy::Economy;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use traits::{AccountStore, SettingsStore};
