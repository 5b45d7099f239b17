use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

use crate::gateway::VocabGateway;

pub const COUNT_FAILED: &str = "Failed to load dictionary count";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountSnapshot {
    /// `None` while nobody is signed in.
    pub count: Option<u64>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Shared saved-word count for every view of one session.
///
/// Only the methods here write to the count; views observe it through
/// [`DictionaryCountStore::subscribe`]. Local adjustments are optimistic and
/// [`DictionaryCountStore::refresh`] re-reads the authoritative value.
#[derive(Clone)]
pub struct DictionaryCountStore {
    state: Arc<watch::Sender<CountSnapshot>>,
}

impl Default for DictionaryCountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DictionaryCountStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(CountSnapshot::default());
        Self {
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CountSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CountSnapshot {
        self.state.borrow().clone()
    }

    pub fn count(&self) -> Option<u64> {
        self.state.borrow().count
    }

    pub fn increment(&self) {
        self.state.send_if_modified(|snapshot| match snapshot.count.as_mut() {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        });
    }

    /// Never goes below zero.
    pub fn decrement(&self) {
        self.state.send_if_modified(|snapshot| match snapshot.count.as_mut() {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        });
    }

    /// Replaces the cached count with the collaborator's value.
    ///
    /// A failed fetch keeps the last known count and records an error.
    pub async fn refresh(&self, gateway: &VocabGateway) {
        self.state.send_if_modified(|snapshot| {
            let changed = !snapshot.loading;
            snapshot.loading = true;
            changed
        });
        let outcome = gateway.count().await;
        self.state.send_modify(|snapshot| {
            snapshot.loading = false;
            match outcome {
                Ok(count) => {
                    snapshot.count = count;
                    snapshot.error = None;
                }
                Err(err) => {
                    warn!(error = %err, "Dictionary count refresh failed");
                    snapshot.error = Some(COUNT_FAILED.to_string());
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::{CountingStore, hello, signed_in, signed_out};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn counts_are_null_until_signed_in() {
        let store = DictionaryCountStore::new();
        store.increment();
        store.decrement();
        assert_eq!(store.count(), None);

        store
            .refresh(&signed_out(Arc::new(MemoryStore::new())))
            .await;
        assert_eq!(store.count(), None);
        store.increment();
        assert_eq!(store.count(), None);
    }

    #[tokio::test]
    async fn decrement_floors_at_zero() {
        let store = DictionaryCountStore::new();
        store.refresh(&signed_in(Arc::new(MemoryStore::new()))).await;
        assert_eq!(store.count(), Some(0));
        store.decrement();
        assert_eq!(store.count(), Some(0));
        store.increment();
        store.increment();
        store.decrement();
        assert_eq!(store.count(), Some(1));
    }

    #[tokio::test]
    async fn save_then_refresh_counts_one_more() {
        let gateway = signed_in(Arc::new(MemoryStore::new()));
        let store = DictionaryCountStore::new();
        store.refresh(&gateway).await;
        let before = store.count().unwrap();
        gateway.save(&hello()).await.unwrap();
        store.refresh(&gateway).await;
        assert_eq!(store.count(), Some(before + 1));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_count() {
        let store = DictionaryCountStore::new();
        let gateway = signed_in(Arc::new(MemoryStore::new()));
        gateway.save(&hello()).await.unwrap();
        store.refresh(&gateway).await;

        store.refresh(&signed_in(Arc::new(CountingStore::broken()))).await;
        let snapshot = store.snapshot();
        assert_eq!(snapshot.count, Some(1));
        assert_eq!(snapshot.error.as_deref(), Some(COUNT_FAILED));
        assert!(!snapshot.loading);

        store.refresh(&gateway).await;
        assert_eq!(store.snapshot().error, None);
    }

    #[tokio::test]
    async fn subscribers_share_one_value() {
        let store = DictionaryCountStore::new();
        let badge = store.subscribe();
        let mut header = store.clone().subscribe();
        store.refresh(&signed_in(Arc::new(MemoryStore::new()))).await;
        store.increment();
        assert!(header.has_changed().unwrap());
        assert_eq!(header.borrow_and_update().count, Some(1));
        assert_eq!(badge.borrow().count, Some(1));

        store.decrement();
        store.decrement();
        assert_eq!(header.borrow_and_update().count, Some(0));
        store.decrement();
        assert!(!header.has_changed().unwrap());
    }
}
