//! Tracing setup for test binaries.

use crate::config::SuiteOptions;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a subscriber configured from `SQLTEST_LOG_LEVEL` / `SQLTEST_JSON_LOGS`.
///
/// Safe to call from every test: only the first call in a process installs
/// anything. Output goes through the test harness capture.
pub fn init_test_tracing() -> bool {
    init_tracing(&SuiteOptions::from_env())
}

/// Install a subscriber for `options`. Returns false when one was already set.
pub fn init_tracing(options: &SuiteOptions) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&options.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let result = if options.json_logs {
        subscriber
            .with(fmt::layer().json().with_test_writer())
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_test_writer())
            .try_init()
    };
    result.is_ok()
}
