//! Stub connector shared by the integration tests.

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use sqltest::{
    Connector, DataSource, DataSourceConfig, Rollback, SqlTest, SqlTestResult, TestMode,
    Transactional,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Counters observed by the tests.
#[derive(Debug, Default)]
pub struct Counters {
    pub opens: AtomicUsize,
    pub begins: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub opened: Mutex<Vec<DataSource>>,
}

impl Counters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

/// Connector that counts calls instead of talking to a database.
#[derive(Debug, Default)]
pub struct StubConnector {
    pub counters: Arc<Counters>,
    /// Number of initial `open` calls that fail.
    pub fail_opens: usize,
    pub open_delay: Option<Duration>,
    pub fail_begin: bool,
    pub fail_rollback: bool,
    /// Panic if `open` is ever called.
    pub forbid_open: bool,
}

impl Connector for StubConnector {
    type Handle = StubHandle;

    fn open<'a>(&'a self, source: &'a DataSource) -> BoxFuture<'a, SqlTestResult<StubHandle>> {
        Box::pin(async move {
            assert!(!self.forbid_open, "connector must not be invoked");
            if let Some(delay) = self.open_delay {
                tokio::time::sleep(delay).await;
            }

            let attempt = self.counters.opens.fetch_add(1, Ordering::SeqCst);
            self.counters.opened.lock().unwrap().push(source.clone());
            if attempt < self.fail_opens {
                return Err(source.connection_error("connection refused"));
            }

            Ok(StubHandle {
                id: attempt,
                counters: self.counters.clone(),
                fail_begin: self.fail_begin,
                fail_rollback: self.fail_rollback,
            })
        })
    }
}

#[derive(Debug)]
pub struct StubHandle {
    pub id: usize,
    counters: Arc<Counters>,
    fail_begin: bool,
    fail_rollback: bool,
}

impl Transactional for StubHandle {
    type Transaction = StubTx;
    type Error = String;

    fn begin(&self) -> BoxFuture<'_, Result<StubTx, String>> {
        Box::pin(async move {
            if self.fail_begin {
                return Err("too many connections".to_string());
            }
            let seq = self.counters.begins.fetch_add(1, Ordering::SeqCst);
            Ok(StubTx {
                seq,
                handle_id: self.id,
                writes: Vec::new(),
                counters: self.counters.clone(),
                fail_rollback: self.fail_rollback,
            })
        })
    }
}

#[derive(Debug)]
pub struct StubTx {
    pub seq: usize,
    pub handle_id: usize,
    pub writes: Vec<String>,
    counters: Arc<Counters>,
    fail_rollback: bool,
}

impl Rollback for StubTx {
    type Error = String;

    fn rollback(self) -> BoxFuture<'static, Result<(), String>> {
        Box::pin(async move {
            self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
            if self.fail_rollback {
                Err("connection reset by peer".to_string())
            } else {
                Ok(())
            }
        })
    }
}

/// A suite over `connector` with a fixed environment and full mode.
pub fn stub_suite(connector: StubConnector) -> SqlTest<StubConnector> {
    let mut config = DataSourceConfig::new();
    config.setup("pg", "host=x dbname=y");
    SqlTest::with_connector(config, connector)
        .with_env(HashMap::<String, String>::new())
        .with_mode(TestMode::Full)
}
