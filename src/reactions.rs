//! Per-provider reaction tallies.
//!
//! The store is an external collaborator in production (any key-value
//! service with change notification will do); [`MemoryReactionStore`] is
//! the in-process implementation the gateway ships with.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{RwLock, watch};
use tracing::debug;

/// Reaction kind -> count.
pub type ReactionRecord = BTreeMap<String, u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Good,
    Meh,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 3] = [ReactionKind::Like, ReactionKind::Good, ReactionKind::Meh];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Good => "good",
            ReactionKind::Meh => "meh",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

/// All kinds at zero; what a key reads as before anyone reacted.
pub fn empty_record() -> ReactionRecord {
    ReactionKind::ALL
        .iter()
        .map(|k| (k.as_str().to_string(), 0))
        .collect()
}

/// Receiver side of a subscription. Holds `None` until the key is first written.
pub type ReactionSubscription = watch::Receiver<Option<ReactionRecord>>;

#[async_trait]
pub trait ReactionStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<ReactionRecord>;

    /// With `merge`, fields in `record` overwrite stored fields and the rest are
    /// kept; without it the stored record is replaced. Last writer wins per field.
    async fn set(&self, key: &str, record: ReactionRecord, merge: bool);

    /// The receiver sees the current record immediately and every later change.
    async fn subscribe(&self, key: &str) -> ReactionSubscription;
}

/// Read-modify-write increment.
///
/// Not atomic across `get` and `set`: two writers racing on the same key
/// can lose an increment. Counts are approximate by contract.
pub async fn add_reaction(store: &dyn ReactionStore, key: &str, kind: ReactionKind) -> ReactionRecord {
    let mut record = store.get(key).await.unwrap_or_else(empty_record);
    *record.entry(kind.as_str().to_string()).or_insert(0) += 1;
    store.set(key, record.clone(), true).await;
    debug!("reaction {} on {} -> {:?}", kind.as_str(), key, record);
    record
}

#[derive(Debug, Default)]
pub struct MemoryReactionStore {
    // The watch sender doubles as the storage cell for its key
    records: RwLock<HashMap<String, watch::Sender<Option<ReactionRecord>>>>,
}

impl MemoryReactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReactionStore for MemoryReactionStore {
    async fn get(&self, key: &str) -> Option<ReactionRecord> {
        let records = self.records.read().await;
        records.get(key).and_then(|tx| tx.borrow().clone())
    }

    async fn set(&self, key: &str, record: ReactionRecord, merge: bool) {
        let mut records = self.records.write().await;
        let tx = records
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(None).0);
        tx.send_modify(|current| {
            if merge {
                if let Some(existing) = current.as_mut() {
                    existing.extend(record);
                    return;
                }
            }
            *current = Some(record);
        });
    }

    async fn subscribe(&self, key: &str) -> ReactionSubscription {
        let mut records = self.records.write().await;
        records
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_unknown_key_is_absent() {
        let store = MemoryReactionStore::new();
        assert_eq!(store.get("gemini").await, None);
    }

    #[tokio::test]
    async fn test_add_reaction_counts() {
        let store = MemoryReactionStore::new();
        add_reaction(&store, "gemini", ReactionKind::Like).await;
        add_reaction(&store, "gemini", ReactionKind::Like).await;
        let record = add_reaction(&store, "gemini", ReactionKind::Meh).await;

        assert_eq!(record["like"], 2);
        assert_eq!(record["good"], 0);
        assert_eq!(record["meh"], 1);
        assert_eq!(store.get("gemini").await, Some(record));
        assert_eq!(store.get("groq").await, None);
    }

    #[tokio::test]
    async fn test_set_merge_and_replace() {
        let store = MemoryReactionStore::new();
        store.set("openai", empty_record(), false).await;
        store
            .set("openai", BTreeMap::from([("good".to_string(), 7)]), true)
            .await;
        let merged = store.get("openai").await.unwrap();
        assert_eq!(merged["good"], 7);
        assert_eq!(merged["like"], 0);

        store
            .set("openai", BTreeMap::from([("meh".to_string(), 1)]), false)
            .await;
        let replaced = store.get("openai").await.unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced["meh"], 1);
    }

    #[tokio::test]
    async fn test_subscriber_sees_changes() {
        let store = Arc::new(MemoryReactionStore::new());
        let mut rx = store.subscribe("groq").await;
        assert_eq!(*rx.borrow_and_update(), None);

        add_reaction(store.as_ref(), "groq", ReactionKind::Good).await;
        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone().unwrap();
        assert_eq!(seen["good"], 1);

        // Late subscribers start from the current record
        let late = store.subscribe("groq").await;
        assert_eq!(late.borrow().as_ref().unwrap()["good"], 1);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ReactionKind::from_name("meh"), Some(ReactionKind::Meh));
        assert_eq!(ReactionKind::from_name("love"), None);
        assert_eq!(empty_record().len(), 3);
    }
}
