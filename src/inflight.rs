//! In-flight request registry: one entry per request currently being
//! worked on, keyed by the textual JSON form of its id.
//!
//! Generalizes the teacher's `pending: PendingMap` (a map from request id to
//! a oneshot response channel) into a map from request id to a cancellation
//! flag plus an observed child pid — the two signals a `$/cancelRequest`
//! needs to reach a running search child (spec §3, §5).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

/// Sentinel meaning "no child currently running for this request".
pub const NO_CHILD: i32 = -1;

/// A single in-flight request's cancellation state.
pub struct InFlightEntry {
    cancelled: AtomicBool,
    child_pid: AtomicI32,
}

impl Default for InFlightEntry {
    fn default() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            child_pid: AtomicI32::new(NO_CHILD),
        }
    }
}

impl InFlightEntry {
    pub fn set_cancelled(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn set_child_pid(&self, pid: i32) {
        self.child_pid.store(pid, Ordering::SeqCst);
    }

    pub fn clear_child_pid(&self) {
        self.child_pid.store(NO_CHILD, Ordering::SeqCst);
    }

    #[must_use]
    pub fn child_pid(&self) -> Option<i32> {
        let pid = self.child_pid.load(Ordering::SeqCst);
        (pid > 0).then_some(pid)
    }
}

#[derive(Default)]
pub struct InFlightRegistry {
    entries: Mutex<HashMap<String, Arc<InFlightEntry>>>,
}

impl InFlightRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new in-flight entry for `id_key`, overwriting any stale
    /// entry for the same key (the spec's id uniqueness invariant means
    /// this should not normally happen, but a client reusing an id after
    /// a cancel-then-resend should not wedge the table).
    pub async fn register(&self, id_key: String) -> Arc<InFlightEntry> {
        let entry = Arc::new(InFlightEntry::default());
        self.entries.lock().await.insert(id_key, Arc::clone(&entry));
        entry
    }

    /// Remove the in-flight entry for `id_key`. Idempotent.
    pub async fn remove(&self, id_key: &str) {
        self.entries.lock().await.remove(id_key);
    }

    /// Look up the entry for `id_key`, if a worker is still processing it.
    pub async fn get(&self, id_key: &str) -> Option<Arc<InFlightEntry>> {
        self.entries.lock().await.get(id_key).cloned()
    }
}

/// Deliver `SIGTERM` to `pid`. A process that has already exited (ESRCH) is
/// treated as success: the cancel race between "child already finished" and
/// "cancel request arrives" is expected and benign (SPEC_FULL §9).
pub fn terminate_pid(pid: i32) {
    // SAFETY: libc::kill with SIGTERM is a standard, non-memory-unsafe
    // syscall wrapper; `pid` is an OS process id we observed ourselves.
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }
}
