//! Database layer: pool, the account store trait, and its PostgreSQL and
//! in-memory implementations.

mod memory;
mod pool;
mod repositories;

pub use memory::MemoryAccountStore;
pub use pool::{create_pool, run_migrations, DbPool};
pub use repositories::*;
