//! The test-suite facade.
//!
//! A [`SqlTest`] owns the data source configuration, the environment it
//! resolves overrides from, the reduced-mode switch, a [`Connector`] and the
//! shared handle. Test binaries usually keep one in a `static`.

use crate::config::{DataSourceConfig, SuiteOptions, TestMode};
use crate::connector::{Connector, DataSource, EnvSource, ProcessEnv, SqlxConnector, resolve};
use crate::db::DbPool;
use crate::error::{SqlTestError, SqlTestResult, fail};
use crate::scoped::{ScopedTransaction, Transactional, report_rollback_failure};
use crate::shared::SharedHandle;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info};

/// Transaction type handed out by a suite using connector `C`.
pub type TransactionOf<C> = <<C as Connector>::Handle as Transactional>::Transaction;

pub struct SqlTest<C: Connector = SqlxConnector> {
    config: DataSourceConfig,
    env: Box<dyn EnvSource>,
    mode: TestMode,
    connector: C,
    handle: SharedHandle<C::Handle>,
}

impl SqlTest<SqlxConnector> {
    /// Suite using sqlx, the process environment, and `SQLTEST_SHORT`.
    pub fn new(config: DataSourceConfig) -> Self {
        Self::with_connector(config, SqlxConnector::new())
    }

    /// The shared pool, for setup outside any transaction.
    pub async fn pool(&self) -> &DbPool {
        self.shared_handle().await
    }

    /// Close the shared pool, if it was created.
    pub async fn close(&self) {
        if let Some(pool) = self.handle.get() {
            info!(db_type = %pool.db_type(), "Closing shared database handle");
            pool.close().await;
        }
    }
}

impl<C: Connector> SqlTest<C> {
    pub fn with_connector(config: DataSourceConfig, connector: C) -> Self {
        Self {
            config,
            env: Box::new(ProcessEnv),
            mode: SuiteOptions::from_env().mode(),
            connector,
            handle: SharedHandle::new(),
        }
    }

    /// Resolve override variables from `env` instead of the process environment.
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn with_mode(mut self, mode: TestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    pub fn mode(&self) -> TestMode {
        self.mode
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Resolve the driver name and connect string as of now.
    pub fn resolve(&self) -> SqlTestResult<DataSource> {
        resolve(&self.config, self.env.as_ref())
    }

    /// Open a fresh handle, not shared with anyone.
    pub async fn try_open(&self) -> SqlTestResult<C::Handle> {
        let source = self.resolve()?;
        self.connector.open(&source).await
    }

    /// Open a fresh handle; a misconfiguration or an unreachable database
    /// fails the calling test.
    pub async fn open(&self) -> C::Handle {
        self.try_open().await.unwrap_or_else(|err| fail(err))
    }

    /// The shared handle, created on first use.
    pub async fn try_shared_handle(&self) -> SqlTestResult<&C::Handle> {
        self.handle.get_or_try_init(|| self.try_open()).await
    }

    /// The shared handle; failure to create it fails the calling test.
    pub async fn shared_handle(&self) -> &C::Handle {
        self.try_shared_handle().await.unwrap_or_else(|err| fail(err))
    }

    /// Whether the shared handle exists yet.
    pub fn has_shared_handle(&self) -> bool {
        self.handle.is_initialized()
    }
}

impl<C> SqlTest<C>
where
    C: Connector,
    C::Handle: Transactional,
{
    /// Begin a transaction on the shared handle.
    ///
    /// Returns `Ok(None)` in reduced mode, before any connection attempt.
    pub async fn try_scoped_transaction(
        &self,
    ) -> SqlTestResult<Option<ScopedTransaction<TransactionOf<C>>>> {
        if self.mode.is_short() {
            info!("sqltest: no DB in short mode, skipping");
            return Ok(None);
        }

        let handle = self.try_shared_handle().await?;
        let transaction = handle.begin().await.map_err(SqlTestError::begin)?;
        Ok(Some(ScopedTransaction::new(transaction)))
    }

    /// Begin a transaction that is rolled back at the end of the test.
    ///
    /// `None` means the test should be skipped (reduced mode); see
    /// [`scoped_tx!`](crate::scoped_tx). Any other failure fails the test.
    pub async fn scoped_transaction(&self) -> Option<ScopedTransaction<TransactionOf<C>>> {
        self.try_scoped_transaction()
            .await
            .unwrap_or_else(|err| fail(err))
    }

    /// Run `body` inside a scoped transaction and roll it back on every exit
    /// path, including a panicking body.
    ///
    /// Returns `None` without running `body` in reduced mode. A rollback
    /// failure fails the test after `body` has completed; if `body`
    /// panicked, its panic is re-raised and the rollback failure is logged.
    pub async fn with_scoped_transaction<F, R>(&self, body: F) -> Option<R>
    where
        F: AsyncFnOnce(&mut ScopedTransaction<TransactionOf<C>>) -> R,
    {
        let mut tx = self.scoped_transaction().await?;
        let id = tx.id().to_string();

        let outcome = AssertUnwindSafe(body(&mut tx)).catch_unwind().await;
        let rolled_back = tx.rollback().await;

        match outcome {
            Ok(value) => {
                if let Err(err) = rolled_back {
                    report_rollback_failure(err);
                }
                Some(value)
            }
            Err(panic) => {
                match rolled_back {
                    Ok(()) => debug!(transaction_id = %id, "Rolled back after panicking test body"),
                    Err(err) => error!(error = %err, "Automatic rollback failed"),
                }
                std::panic::resume_unwind(panic)
            }
        }
    }
}

impl<C: Connector> std::fmt::Debug for SqlTest<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlTest")
            .field("driver_name", &self.config.driver_name())
            .field("driver_env_var", &self.config.driver_env_var())
            .field("data_source_env_var", &self.config.data_source_env_var())
            .field("mode", &self.mode)
            .field("has_shared_handle", &self.has_shared_handle())
            .finish()
    }
}
