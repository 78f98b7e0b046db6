//! Serialized write-through persistence for the post list
//!
//! Callers `stage` a snapshot while they still hold the feed state lock, so the
//! staged snapshot is always the newest in-memory list. `drain` then writes it
//! with at most one write in flight. A caller whose snapshot was already picked
//! up by an earlier writer returns that write's outcome instead of writing again.

use std::sync::atomic::{AtomicBool, Ordering};

use kv_store::Storage;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::model::Post;

pub(crate) struct WriteThrough {
    storage: Storage,
    key: String,
    pending: Mutex<Option<Vec<Post>>>,
    gate: tokio::sync::Mutex<()>,
    last_ok: AtomicBool,
}

impl WriteThrough {
    pub(crate) fn new(storage: Storage, key: String) -> Self {
        Self {
            storage,
            key,
            pending: Mutex::new(None),
            gate: tokio::sync::Mutex::new(()),
            last_ok: AtomicBool::new(true),
        }
    }

    /// Replace whatever snapshot is waiting with a newer one
    pub(crate) fn stage(&self, snapshot: Vec<Post>) {
        if self.pending.lock().replace(snapshot).is_some() {
            debug!(key = %self.key, "Coalesced pending post snapshot");
        }
    }

    /// Write the staged snapshot, if any is still waiting
    pub(crate) async fn drain(&self) -> bool {
        let _in_flight = self.gate.lock().await;

        let staged = self.pending.lock().take();
        let Some(snapshot) = staged else {
            return self.last_ok.load(Ordering::Acquire);
        };

        let ok = self.storage.save(&self.key, &snapshot).await;
        if ok {
            debug!(key = %self.key, posts = snapshot.len(), "Persisted post snapshot");
        } else {
            warn!(
                key = %self.key,
                posts = snapshot.len(),
                "Post snapshot not persisted; in-memory feed stays authoritative"
            );
        }
        self.last_ok.store(ok, Ordering::Release);
        ok
    }

    /// Wait until every snapshot staged before this call is written.
    /// Returns `false` while the store is behind memory because the latest
    /// write failed; the next staged snapshot is the retry.
    pub(crate) async fn flush(&self) -> bool {
        self.drain().await
    }
}
