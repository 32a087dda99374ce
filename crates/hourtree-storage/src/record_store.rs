// Record store boundary
//
// Adapter over the store that persists raw records keyed by
// (region, bucket, category). The in-memory implementation backs tests
// and local dry runs; production deployments supply their own.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use hourtree_core::{Category, HourBucket, Record, Region};
use parking_lot::Mutex;
use thiserror::Error;

/// Store failures are surfaced to the export driver's caller as a run
/// failure; retrying is the caller's policy.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable ({operation}): {reason}")]
    Unavailable { operation: String, reason: String },
}

impl StoreError {
    pub fn unavailable(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// Adapter over the persistence layer holding raw records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Regions that currently hold records for the category.
    async fn regions(&self, category: &Category) -> Result<Vec<Region>, StoreError>;

    /// Buckets holding persisted records for (region, category).
    async fn list_buckets(
        &self,
        region: &Region,
        category: &Category,
    ) -> Result<BTreeSet<HourBucket>, StoreError>;

    /// Records stored under (region, bucket, category), in store order.
    async fn fetch_records(
        &self,
        region: &Region,
        bucket: HourBucket,
        category: &Category,
    ) -> Result<Vec<Record>, StoreError>;
}

type StoreKey = (Region, HourBucket, Category);

/// In-memory record store keyed by (region, bucket, category), keeping
/// records in insertion order.
#[derive(Default)]
pub struct MemoryRecordStore {
    entries: Mutex<BTreeMap<StoreKey, Vec<Record>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a batch of records under the given bucket and category.
    /// Each record lands under its own region, mirroring how the real
    /// store keys by (region, bucket, category).
    pub fn save_records(&self, records: Vec<Record>, bucket: HourBucket, category: &Category) {
        let mut entries = self.entries.lock();
        for record in records {
            let key = (record.region().clone(), bucket, category.clone());
            entries.entry(key).or_default().push(record);
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn regions(&self, category: &Category) -> Result<Vec<Region>, StoreError> {
        let entries = self.entries.lock();
        let regions: BTreeSet<Region> = entries
            .keys()
            .filter(|(_, _, cat)| cat == category)
            .map(|(region, _, _)| region.clone())
            .collect();
        Ok(regions.into_iter().collect())
    }

    async fn list_buckets(
        &self,
        region: &Region,
        category: &Category,
    ) -> Result<BTreeSet<HourBucket>, StoreError> {
        let entries = self.entries.lock();
        Ok(entries
            .keys()
            .filter(|(reg, _, cat)| reg == region && cat == category)
            .map(|(_, bucket, _)| *bucket)
            .collect())
    }

    async fn fetch_records(
        &self,
        region: &Region,
        bucket: HourBucket,
        category: &Category,
    ) -> Result<Vec<Record>, StoreError> {
        let entries = self.entries.lock();
        Ok(entries
            .get(&(region.clone(), bucket, category.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(region: &str, payload: &[u8]) -> Record {
        Record::new(Region::new(region), payload.to_vec())
    }

    #[tokio::test]
    async fn save_splits_records_by_region() {
        let store = MemoryRecordStore::new();
        let category = Category::new("pcr");
        let bucket = HourBucket::from_index(473_702);

        store.save_records(
            vec![record("DE", b"a"), record("FR", b"b"), record("DE", b"c")],
            bucket,
            &category,
        );

        let regions = store.regions(&category).await.unwrap();
        assert_eq!(
            regions,
            vec![Region::new("DE"), Region::new("FR")]
        );

        let de_records = store
            .fetch_records(&Region::new("DE"), bucket, &category)
            .await
            .unwrap();
        assert_eq!(de_records.len(), 2);
        assert_eq!(de_records[0].payload(), b"a");
        assert_eq!(de_records[1].payload(), b"c");
    }

    #[tokio::test]
    async fn list_buckets_is_scoped_to_region_and_category() {
        let store = MemoryRecordStore::new();
        let pcr = Category::new("pcr");
        let rapid = Category::new("rapid");

        store.save_records(vec![record("DE", b"a")], HourBucket::from_index(100), &pcr);
        store.save_records(vec![record("DE", b"b")], HourBucket::from_index(101), &pcr);
        store.save_records(vec![record("DE", b"c")], HourBucket::from_index(102), &rapid);
        store.save_records(vec![record("FR", b"d")], HourBucket::from_index(103), &pcr);

        let buckets = store
            .list_buckets(&Region::new("DE"), &pcr)
            .await
            .unwrap();
        let indices: Vec<i64> = buckets.iter().map(|b| b.index()).collect();
        assert_eq!(indices, vec![100, 101]);
    }

    #[tokio::test]
    async fn fetch_for_unknown_bucket_is_empty() {
        let store = MemoryRecordStore::new();
        let records = store
            .fetch_records(
                &Region::new("DE"),
                HourBucket::from_index(1),
                &Category::new("pcr"),
            )
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}
