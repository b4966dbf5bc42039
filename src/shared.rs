//! Lazily created, process-shared database handle.

use crate::error::SqlTestResult;
use std::future::Future;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// A handle created at most once and then shared by reference.
///
/// Initialization is serialized: concurrent callers wait for the single
/// running initializer. Once set, reads take no lock. A failed
/// initialization stores nothing, so the next caller tries again.
#[derive(Debug)]
pub struct SharedHandle<H> {
    cell: OnceCell<H>,
}

impl<H> SharedHandle<H> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// The handle, if it has been created.
    pub fn get(&self) -> Option<&H> {
        self.cell.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Return the handle, creating it with `init` if there is none yet.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> SqlTestResult<&H>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SqlTestResult<H>>,
    {
        if let Some(handle) = self.cell.get() {
            return Ok(handle);
        }

        self.cell
            .get_or_try_init(|| async move {
                debug!("Creating shared database handle");
                let handle = init().await?;
                info!("Shared database handle created");
                Ok(handle)
            })
            .await
    }
}

impl<H> Default for SharedHandle<H> {
    fn default() -> Self {
        Self::new()
    }
}
