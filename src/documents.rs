//! In-memory open-document registry.
//!
//! Keyed by URI, full-sync only: `didChange` wholly replaces the stored
//! text, there is no per-document versioning. Writes happen exclusively on
//! the main dispatch thread (see `session::Session`); background workers
//! only ever read a snapshot, tolerating the documented race where the
//! entry may have changed or disappeared by the time they look (spec
//! §4.E) — this module itself just guards the map, it does not try to
//! prevent that race.

use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct DocumentStore {
    inner: Mutex<HashMap<String, String>>,
}

impl DocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, uri: String, text: String) {
        self.inner.lock().await.insert(uri, text);
    }

    pub async fn change(&self, uri: &str, text: String) {
        // Full-sync mode: wholly replace, whether or not it existed before.
        self.inner.lock().await.insert(uri.to_string(), text);
    }

    pub async fn close(&self, uri: &str) {
        self.inner.lock().await.remove(uri);
    }

    /// Snapshot the current text of `uri`, or `None` if it is not open.
    pub async fn get(&self, uri: &str) -> Option<String> {
        self.inner.lock().await.get(uri).cloned()
    }
}
