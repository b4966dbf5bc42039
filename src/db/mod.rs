//! sqlx-backed database layer.
//!
//! - Driver-name mapping
//! - Connection pools (the shared handle type)
//! - Transactions (rollback only)
//! - Dispatch macros over the pool variants

pub mod driver;
#[macro_use]
pub mod macros;
pub mod pool;
pub mod transaction;

pub use driver::DatabaseType;
pub use pool::DbPool;
pub use transaction::DbTransaction;
