//! Per-test transactions that always roll back.
//!
//! A [`ScopedTransaction`] is `Active` from creation until it is consumed by
//! [`rollback`](ScopedTransaction::rollback) or
//! [`finish`](ScopedTransaction::finish), or dropped. There is no commit:
//! everything a test writes through it is undone.
//!
//! Dropping an unfinished transaction hands it back to the driver, whose
//! transaction type rolls back on drop (sqlx does). Use `finish` or
//! `SqlTest::with_scoped_transaction` to have rollback failures reported.
//!
//! Schema statements on engines that commit DDL implicitly (MySQL, for one)
//! are not undone.

use crate::error::{SqlTestError, SqlTestResult};
use futures_util::future::BoxFuture;
use std::ops::{Deref, DerefMut};
use tracing::{debug, error};

/// A handle that can begin transactions.
pub trait Transactional: Send + Sync {
    type Transaction: Rollback;
    type Error: std::fmt::Display + Send;

    fn begin(&self) -> BoxFuture<'_, Result<Self::Transaction, Self::Error>>;
}

/// A transaction that can be rolled back.
pub trait Rollback: Send {
    type Error: std::fmt::Display + Send;

    fn rollback(self) -> BoxFuture<'static, Result<(), Self::Error>>;
}

/// A transaction owned by one test, rolled back exactly once.
///
/// Derefs to the underlying transaction; pass `&mut` to helpers that need to
/// run statements in the same transaction.
pub struct ScopedTransaction<T: Rollback> {
    id: String,
    inner: Option<T>,
}

impl<T: Rollback> ScopedTransaction<T> {
    pub fn new(transaction: T) -> Self {
        let id = generate_transaction_id();
        debug!(transaction_id = %id, "Scoped transaction started");
        Self {
            id,
            inner: Some(transaction),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Roll back now, returning any failure.
    pub async fn rollback(mut self) -> SqlTestResult<()> {
        let Some(transaction) = self.inner.take() else {
            return Ok(());
        };
        transaction
            .rollback()
            .await
            .map_err(|e| SqlTestError::rollback(&self.id, e))?;
        debug!(transaction_id = %self.id, "Scoped transaction rolled back");
        Ok(())
    }

    /// Roll back now and fail the calling test if that does not work.
    ///
    /// When the thread is already panicking the failure is logged instead,
    /// so the original panic is the one reported.
    pub async fn finish(self) {
        if let Err(err) = self.rollback().await {
            report_rollback_failure(err);
        }
    }

    fn active(&self) -> &T {
        self.inner
            .as_ref()
            .expect("scoped transaction is active until consumed")
    }

    fn active_mut(&mut self) -> &mut T {
        self.inner
            .as_mut()
            .expect("scoped transaction is active until consumed")
    }
}

pub(crate) fn report_rollback_failure(err: SqlTestError) {
    if std::thread::panicking() {
        error!(error = %err, "Automatic rollback failed");
    } else {
        crate::error::fail(err);
    }
}

impl<T: Rollback> Deref for ScopedTransaction<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.active()
    }
}

impl<T: Rollback> DerefMut for ScopedTransaction<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.active_mut()
    }
}

impl<T: Rollback> Drop for ScopedTransaction<T> {
    fn drop(&mut self) {
        if let Some(transaction) = self.inner.take() {
            debug!(
                transaction_id = %self.id,
                "Scoped transaction dropped, driver rolls back"
            );
            drop(transaction);
        }
    }
}

impl<T: Rollback> std::fmt::Debug for ScopedTransaction<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedTransaction")
            .field("id", &self.id)
            .field("active", &self.inner.is_some())
            .finish()
    }
}

fn generate_transaction_id() -> String {
    format!("tx_{}", uuid::Uuid::new_v4().simple())
}

/// Begin a scoped transaction, or return from the enclosing test when the
/// suite is in reduced mode.
///
/// ```ignore
/// #[tokio::test]
/// async fn inserts_user() {
///     let mut tx = sqltest::scoped_tx!(SUITE);
///     // ...
///     tx.finish().await;
/// }
/// ```
#[macro_export]
macro_rules! scoped_tx {
    ($suite:expr) => {
        match $suite.scoped_transaction().await {
            Some(tx) => tx,
            None => return,
        }
    };
}
