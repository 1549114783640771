//! # In-Memory MVCC Ledger
//!
//! Committed state is a `BTreeMap` from key to `(version, bytes)` behind a
//! `parking_lot::RwLock`. A transaction records the version of every key it
//! reads; `commit` takes the write lock, re-checks those versions, and
//! applies the staged writes under a fresh version number.
//!
//! The lock is never held across `.await` and never held between `begin`
//! and `commit`: transactions run optimistically.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use educert_core::{LedgerKey, Timestamp};
use parking_lot::RwLock;

use crate::error::LedgerError;
use crate::query::{KeyValue, QueryPage, Selector};
use crate::store::{LedgerStore, Transaction};

/// Source of transaction timestamps.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    value: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, Versioned>,
    last_version: u64,
}

/// Thread-safe, cloneable in-memory ledger.
#[derive(Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<State>>,
    clock: Clock,
}

impl InMemoryLedger {
    /// An empty ledger stamping transactions with the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Timestamp::now))
    }

    /// An empty ledger with an injected clock.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            clock,
        }
    }

    /// Number of committed keys.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("keys", &self.len())
            .finish_non_exhaustive()
    }
}

impl LedgerStore for InMemoryLedger {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, LedgerError> {
        Ok(Box::new(MemoryTransaction {
            ledger: self,
            timestamp: (self.clock)(),
            reads: HashMap::new(),
            writes: BTreeMap::new(),
        }))
    }
}

struct MemoryTransaction<'a> {
    ledger: &'a InMemoryLedger,
    timestamp: Timestamp,
    /// Key → version observed (`None` = absent at read time).
    reads: HashMap<String, Option<u64>>,
    writes: BTreeMap<String, Vec<u8>>,
}

impl Transaction for MemoryTransaction<'_> {
    fn get(&mut self, key: &LedgerKey) -> Result<Option<Vec<u8>>, LedgerError> {
        if let Some(staged) = self.writes.get(key.as_str()) {
            return Ok(Some(staged.clone()));
        }
        let state = self.ledger.state.read();
        let entry = state.entries.get(key.as_str());
        self.reads
            .entry(key.as_str().to_string())
            .or_insert(entry.map(|e| e.version));
        Ok(entry.map(|e| e.value.clone()))
    }

    fn put(&mut self, key: &LedgerKey, value: Vec<u8>) -> Result<(), LedgerError> {
        self.writes.insert(key.as_str().to_string(), value);
        Ok(())
    }

    fn query_by_selector(
        &mut self,
        selector: &Selector,
        page_size: usize,
        bookmark: Option<&str>,
    ) -> Result<QueryPage, LedgerError> {
        if page_size == 0 {
            return Err(LedgerError::InvalidPageSize);
        }
        let start = match bookmark {
            None | Some("") => Bound::Unbounded,
            Some(b) => Bound::Excluded(b.to_string()),
        };

        let state = self.ledger.state.read();
        let mut matching = state
            .entries
            .range::<String, _>((start, Bound::Unbounded))
            .filter(|(_, e)| selector.matches(&e.value));

        let results: Vec<KeyValue> = matching
            .by_ref()
            .take(page_size)
            .map(|(k, e)| KeyValue {
                key: k.clone(),
                value: e.value.clone(),
            })
            .collect();
        let more = matching.next().is_some();
        let bookmark = match results.last() {
            Some(last) if more => Some(last.key.clone()),
            _ => None,
        };
        Ok(QueryPage {
            count: results.len(),
            results,
            bookmark,
        })
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let MemoryTransaction {
            ledger,
            reads,
            writes,
            ..
        } = *self;
        let mut state = ledger.state.write();
        for (key, seen) in reads {
            let current = state.entries.get(&key).map(|e| e.version);
            if current != seen {
                tracing::debug!(key = %key, "ledger commit rejected: read set is stale");
                return Err(LedgerError::Conflict { key });
            }
        }
        if writes.is_empty() {
            return Ok(());
        }
        state.last_version += 1;
        let version = state.last_version;
        for (key, value) in writes {
            state.entries.insert(key, Versioned { version, value });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use educert_core::{CredentialId, SchemaVersion};

    fn key(n: u8) -> LedgerKey {
        LedgerKey::from_raw(format!("K{n:02}"))
    }

    fn put_committed(ledger: &InMemoryLedger, k: &LedgerKey, v: &[u8]) {
        let mut tx = ledger.begin().unwrap();
        tx.put(k, v.to_vec()).unwrap();
        tx.commit().unwrap();
    }

    #[test]
    fn uncommitted_writes_are_invisible() {
        let ledger = InMemoryLedger::new();
        let k = LedgerKey::schema(&SchemaVersion::new("v1").unwrap());
        {
            let mut tx = ledger.begin().unwrap();
            tx.put(&k, b"x".to_vec()).unwrap();
            assert_eq!(tx.get(&k).unwrap(), Some(b"x".to_vec()));
        }
        let mut tx = ledger.begin().unwrap();
        assert_eq!(tx.get(&k).unwrap(), None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn racing_writers_on_same_key_one_wins() {
        let ledger = InMemoryLedger::new();
        let k = LedgerKey::credential(&CredentialId::new());

        let mut a = ledger.begin().unwrap();
        let mut b = ledger.begin().unwrap();
        assert_eq!(a.get(&k).unwrap(), None);
        assert_eq!(b.get(&k).unwrap(), None);
        a.put(&k, b"a".to_vec()).unwrap();
        b.put(&k, b"b".to_vec()).unwrap();

        a.commit().unwrap();
        assert_eq!(
            b.commit().unwrap_err(),
            LedgerError::Conflict { key: k.as_str().to_string() }
        );

        let mut check = ledger.begin().unwrap();
        assert_eq!(check.get(&k).unwrap(), Some(b"a".to_vec()));
    }

    #[test]
    fn disjoint_transactions_both_commit() {
        let ledger = InMemoryLedger::new();
        let mut a = ledger.begin().unwrap();
        let mut b = ledger.begin().unwrap();
        a.get(&key(1)).unwrap();
        b.get(&key(2)).unwrap();
        a.put(&key(1), b"1".to_vec()).unwrap();
        b.put(&key(2), b"2".to_vec()).unwrap();
        a.commit().unwrap();
        b.commit().unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn concurrent_threads_single_winner() {
        let ledger = InMemoryLedger::new();
        let k = key(7);
        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let ledger = &ledger;
                    let k = &k;
                    s.spawn(move || {
                        let mut tx = ledger.begin().unwrap();
                        if tx.get(k).unwrap().is_some() {
                            return 0;
                        }
                        tx.put(k, vec![i]).unwrap();
                        usize::from(tx.commit().is_ok())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(winners, 1);
    }

    #[test]
    fn pagination_walks_all_matches() {
        let ledger = InMemoryLedger::new();
        for n in 0..7u8 {
            let doc = serde_json::json!({"kind": if n % 2 == 0 { "even" } else { "odd" }, "n": n});
            put_committed(&ledger, &key(n), &serde_json::to_vec(&doc).unwrap());
        }
        let sel = Selector::all().eq("kind", "even");

        let mut tx = ledger.begin().unwrap();
        let first = tx.query_by_selector(&sel, 2, None).unwrap();
        assert_eq!(first.count, 2);
        assert_eq!(first.bookmark.as_deref(), Some("K02"));

        let second = tx.query_by_selector(&sel, 2, first.bookmark.as_deref()).unwrap();
        let keys: Vec<_> = second.results.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["K04", "K06"]);
        assert_eq!(second.bookmark, None);
    }

    #[test]
    fn zero_page_size_rejected() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin().unwrap();
        assert_eq!(
            tx.query_by_selector(&Selector::all(), 0, None).unwrap_err(),
            LedgerError::InvalidPageSize
        );
    }

    #[test]
    fn timestamp_comes_from_clock() {
        let fixed = Timestamp::parse("2024-06-01T09:30:00Z").unwrap();
        let ledger = InMemoryLedger::with_clock(Arc::new(move || fixed));
        let tx = ledger.begin().unwrap();
        assert_eq!(tx.timestamp(), fixed);
    }
}
