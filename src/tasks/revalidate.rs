//! Revalidation Queue
//!
//! Work queue for stale-while-revalidate refreshes. A refresh is spawned and
//! forgotten by the request that started it; its only observable effect is
//! the cache write a later lookup sees. The queue keeps the handles so the
//! host can wait for or abort outstanding refreshes on shutdown.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct RevalidationQueue {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl RevalidationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a refresh on the runtime. Finished handles are pruned on the way.
    pub fn spawn<F>(&self, refresh: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(refresh);
        match self.handles.lock() {
            Ok(mut handles) => {
                handles.retain(|h| !h.is_finished());
                handles.push(handle);
            }
            // Untracked but still running
            Err(_) => warn!("revalidation queue lock poisoned"),
        }
    }

    /// Number of refreshes that have not finished yet.
    pub fn pending(&self) -> usize {
        self.handles
            .lock()
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    fn take(&self) -> Vec<JoinHandle<()>> {
        match self.handles.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(_) => Vec::new(),
        }
    }

    /// Waits for every refresh queued so far to finish.
    pub async fn drain(&self) {
        let handles = self.take();
        let count = handles.len();
        join_all(handles).await;
        if count > 0 {
            debug!("drained {} revalidation tasks", count);
        }
    }

    /// Gives queued refreshes up to `grace` to finish, then aborts the rest.
    /// Returns the number of refreshes aborted.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let handles = self.take();
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        match tokio::time::timeout(grace, join_all(handles)).await {
            Ok(()) => 0,
            Err(_) => {
                let unfinished: Vec<_> = aborts.into_iter().filter(|a| !a.is_finished()).collect();
                warn!(
                    "aborting {} revalidations still running after {:?}",
                    unfinished.len(),
                    grace
                );
                for abort in &unfinished {
                    abort.abort();
                }
                unfinished.len()
            }
        }
    }
}

async fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            if !e.is_cancelled() {
                warn!("revalidation task failed: {}", e);
            }
        }
    }
}
