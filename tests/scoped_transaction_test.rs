//! Integration tests for scoped transactions against a stub connector.

mod common;

use common::{StubConnector, stub_suite};
use futures_util::FutureExt;
use sqltest::{SqlTestError, TestMode};
use std::panic::AssertUnwindSafe;

#[tokio::test]
async fn test_short_mode_skips_before_connecting() {
    let suite = stub_suite(StubConnector {
        forbid_open: true,
        ..StubConnector::default()
    })
    .with_mode(TestMode::Short);

    assert!(suite.scoped_transaction().await.is_none());
    assert!(suite.try_scoped_transaction().await.unwrap().is_none());

    let ran = suite.with_scoped_transaction(async |_tx| true).await;
    assert!(ran.is_none());

    assert!(!suite.has_shared_handle());
    assert_eq!(suite.connector().counters.opens(), 0);
}

#[tokio::test]
async fn test_scoped_tx_macro_returns_early_in_short_mode() {
    async fn body(reached: &mut bool) {
        let suite = stub_suite(StubConnector {
            forbid_open: true,
            ..StubConnector::default()
        })
        .with_mode(TestMode::Short);

        let tx = sqltest::scoped_tx!(suite);
        *reached = true;
        tx.finish().await;
    }

    let mut reached = false;
    body(&mut reached).await;
    assert!(!reached);
}

#[tokio::test]
async fn test_sequential_transactions_share_handle() {
    let suite = stub_suite(StubConnector::default());

    let first = suite.scoped_transaction().await.unwrap();
    let first_id = first.id().to_string();
    let (first_seq, first_handle) = (first.seq, first.handle_id);
    first.finish().await;

    let second = suite.scoped_transaction().await.unwrap();
    assert_ne!(second.id(), first_id);
    assert_ne!(second.seq, first_seq);
    assert_eq!(second.handle_id, first_handle);
    second.finish().await;

    let counters = &suite.connector().counters;
    assert_eq!(counters.opens(), 1);
    assert_eq!(counters.begins(), 2);
    assert_eq!(counters.rollbacks(), 2);
}

#[tokio::test]
async fn test_independent_transactions_in_one_test() {
    let suite = stub_suite(StubConnector::default());

    let mut outer = suite.scoped_transaction().await.unwrap();
    let mut inner = suite.scoped_transaction().await.unwrap();
    outer.writes.push("outer".to_string());
    inner.writes.push("inner".to_string());
    assert_ne!(outer.seq, inner.seq);

    inner.finish().await;
    outer.finish().await;
    assert_eq!(suite.connector().counters.rollbacks(), 2);
}

#[tokio::test]
async fn test_with_scoped_transaction_rolls_back() {
    let suite = stub_suite(StubConnector::default());

    let writes = suite
        .with_scoped_transaction(async |tx| {
            tx.writes.push("INSERT".to_string());
            tx.writes.len()
        })
        .await;

    assert_eq!(writes, Some(1));
    assert_eq!(suite.connector().counters.rollbacks(), 1);
}

#[tokio::test]
async fn test_with_scoped_transaction_rolls_back_on_panic() {
    let suite = stub_suite(StubConnector::default());

    let result = AssertUnwindSafe(suite.with_scoped_transaction(async |tx| {
        tx.writes.push("INSERT".to_string());
        if tx.writes.len() == 1 {
            panic!("assertion in test body");
        }
        tx.writes.len()
    }))
    .catch_unwind()
    .await;

    assert!(result.is_err());
    assert_eq!(suite.connector().counters.rollbacks(), 1);
}

#[tokio::test]
#[should_panic(expected = "automatic rollback")]
async fn test_rollback_failure_fails_test() {
    let suite = stub_suite(StubConnector {
        fail_rollback: true,
        ..StubConnector::default()
    });

    suite.with_scoped_transaction(async |_tx| ()).await;
}

#[tokio::test]
async fn test_begin_failure_is_reported() {
    let suite = stub_suite(StubConnector {
        fail_begin: true,
        ..StubConnector::default()
    });

    let err = suite.try_scoped_transaction().await.unwrap_err();
    assert!(matches!(err, SqlTestError::Begin { .. }));
    assert!(err.is_fatal());
    assert!(err.to_string().contains("too many connections"));
}

#[tokio::test]
#[should_panic(expected = "transaction launch")]
async fn test_begin_failure_fails_test() {
    let suite = stub_suite(StubConnector {
        fail_begin: true,
        ..StubConnector::default()
    });
    suite.scoped_transaction().await;
}
