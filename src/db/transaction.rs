//! Database-specific transaction wrapper.
//!
//! There is deliberately no commit: a test transaction only ever rolls back.

use crate::db::driver::DatabaseType;
use crate::scoped::Rollback;
use futures_util::future::BoxFuture;
use sqlx::{MySql, MySqlConnection, PgConnection, Postgres, Sqlite, SqliteConnection, Transaction};

pub enum DbTransaction {
    MySql(Transaction<'static, MySql>),
    Postgres(Transaction<'static, Postgres>),
    SQLite(Transaction<'static, Sqlite>),
}

impl DbTransaction {
    /// Get the database type for this transaction.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbTransaction::MySql(_) => DatabaseType::MySQL,
            DbTransaction::Postgres(_) => DatabaseType::PostgreSQL,
            DbTransaction::SQLite(_) => DatabaseType::SQLite,
        }
    }

    /// Connection to run MySQL statements on, if this is a MySQL transaction.
    pub fn as_mysql(&mut self) -> Option<&mut MySqlConnection> {
        match self {
            DbTransaction::MySql(tx) => Some(&mut **tx),
            _ => None,
        }
    }

    /// Connection to run PostgreSQL statements on, if this is a PostgreSQL transaction.
    pub fn as_postgres(&mut self) -> Option<&mut PgConnection> {
        match self {
            DbTransaction::Postgres(tx) => Some(&mut **tx),
            _ => None,
        }
    }

    /// Connection to run SQLite statements on, if this is a SQLite transaction.
    pub fn as_sqlite(&mut self) -> Option<&mut SqliteConnection> {
        match self {
            DbTransaction::SQLite(tx) => Some(&mut **tx),
            _ => None,
        }
    }
}

impl std::fmt::Debug for DbTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbTransaction")
            .field("db_type", &self.db_type())
            .finish()
    }
}

impl Rollback for DbTransaction {
    type Error = sqlx::Error;

    fn rollback(self) -> BoxFuture<'static, Result<(), sqlx::Error>> {
        Box::pin(async move {
            match self {
                DbTransaction::MySql(tx) => tx.rollback().await,
                DbTransaction::Postgres(tx) => tx.rollback().await,
                DbTransaction::SQLite(tx) => tx.rollback().await,
            }
        })
    }
}
