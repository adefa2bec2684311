use crate::models::AdRecord;
use std::sync::{Arc, RwLock};

/// Holds the most recent successful dataset, served when remote sources fail.
pub trait DatasetStore: Send + Sync {
    fn get(&self) -> Arc<Vec<AdRecord>>;

    /// Swap in a fully built dataset.
    fn replace(&self, records: Vec<AdRecord>);
}

/// Process-local store. Readers clone the `Arc` and never see a partial swap.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Arc<Vec<AdRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<AdRecord>) -> Self {
        Self {
            records: RwLock::new(Arc::new(records)),
        }
    }
}

impl DatasetStore for InMemoryStore {
    fn get(&self) -> Arc<Vec<AdRecord>> {
        // A poisoned lock still guards a whole Arc, so the value is usable
        let guard = self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    fn replace(&self, records: Vec<AdRecord>) {
        let next = Arc::new(records);
        let mut guard = self.records.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Brand;
    use chrono::NaiveDate;

    fn record(id: &str) -> AdRecord {
        AdRecord {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            brand: Brand::Ram,
            account: "Ram".to_string(),
            campaign_name: "Ram Rampage".to_string(),
            ad_set_name: "N/A".to_string(),
            ad_name: "N/A".to_string(),
            investment: 10.0,
            leads: 1,
            impressions: 100,
            clicks: 5,
            cpl: 10.0,
            cpc: 2.0,
        }
    }

    #[test]
    fn test_replace_swaps_whole_dataset() {
        let store = InMemoryStore::with_records(vec![record("a"), record("b")]);
        let before = store.get();

        store.replace(vec![record("c")]);

        // Earlier readers keep their snapshot
        assert_eq!(before.len(), 2);
        let after = store.get();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, "c");
    }

    #[test]
    fn test_empty_by_default() {
        assert!(InMemoryStore::new().get().is_empty());
    }

    #[test]
    fn test_concurrent_readers_see_complete_snapshots() {
        let store = Arc::new(InMemoryStore::new());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for n in 1..=50 {
                    store.replace((0..n).map(|i| record(&i.to_string())).collect());
                }
            })
        };
        for _ in 0..200 {
            let snapshot = store.get();
            // Ids are always 0..len
            for (i, r) in snapshot.iter().enumerate() {
                assert_eq!(r.id, i.to_string());
            }
        }
        writer.join().unwrap();
        assert_eq!(store.get().len(), 50);
    }
}
