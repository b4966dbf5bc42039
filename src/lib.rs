//! sqltest
//!
//! Convenience for integration tests that need a real database: one place to
//! configure the data source, one lazily opened handle shared by every test
//! in the binary, and per-test transactions that are always rolled back.
//!
//! ```ignore
//! use std::sync::LazyLock;
//! use sqltest::{DataSourceConfig, SqlTest};
//!
//! static SUITE: LazyLock<SqlTest> = LazyLock::new(|| {
//!     let mut config = DataSourceConfig::new();
//!     config
//!         .setup("postgres", "postgres://localhost/test")
//!         .env_setup("", "TEST_DATABASE_URL");
//!     SqlTest::new(config)
//! });
//!
//! #[tokio::test]
//! async fn inserts_user() {
//!     let mut tx = sqltest::scoped_tx!(SUITE);
//!     let conn = tx.as_postgres().unwrap();
//!     sqlx::query("INSERT INTO users (name) VALUES ('x')").execute(conn).await.unwrap();
//!     tx.finish().await;
//! }
//! ```
//!
//! Tests are skipped when `SQLTEST_SHORT` is set.
//!
//! Caveats:
//! - On engines where schema statements commit implicitly (MySQL, Oracle),
//!   DDL run inside a scoped transaction persists after the rollback.
//! - A sqlx pool belongs to the Tokio runtime that opened it. A suite kept
//!   in a `static` should be driven from a single runtime; each
//!   `#[tokio::test]` builds its own.

pub mod config;
pub mod connector;
pub mod db;
pub mod error;
pub mod logging;
pub mod scoped;
pub mod shared;
pub mod suite;

pub use config::{DataSourceConfig, SuiteOptions, TestMode};
pub use connector::{Connector, DataSource, EnvSource, ProcessEnv, SqlxConnector};
pub use error::{SqlTestError, SqlTestResult};
pub use scoped::{Rollback, ScopedTransaction, Transactional};
pub use shared::SharedHandle;
pub use suite::{SqlTest, TransactionOf};
