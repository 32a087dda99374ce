// Partition tree assembly
//
// Turns stored records into the published tree:
//
//   country/<REGION>/hour/<BUCKET>            leaf payload
//   country/<REGION>/hour/index[.checksum]    bucket listing + checksum
//   country/index[.checksum]                  region listing + checksum
//
// The current (still open) bucket never appears: a published bucket's
// content is immutable and complete for all time after publication.

use hourtree_core::{Category, DirectoryNode, FileNode, HourBucket, Node, Region};
use hourtree_storage::RecordStore;
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::payload::encode_payload;

pub const COUNTRY_DIRECTORY: &str = "country";
pub const HOUR_DIRECTORY: &str = "hour";

/// Assembles the region/hour partition tree for one export run.
pub struct PartitionTreeBuilder<'a> {
    store: &'a dyn RecordStore,
    category: Category,
    region_filter: Option<Vec<Region>>,
}

impl<'a> PartitionTreeBuilder<'a> {
    pub fn new(store: &'a dyn RecordStore, category: Category) -> Self {
        Self {
            store,
            category,
            region_filter: None,
        }
    }

    /// Restrict the run to an allow-list of regions. Regions the store
    /// reports outside the list are skipped entirely.
    pub fn with_region_filter(mut self, regions: Vec<Region>) -> Self {
        self.region_filter = Some(regions);
        self
    }

    /// Build the `country` subtree, excluding `current` everywhere.
    ///
    /// Regions left with no eligible bucket are omitted: no empty region
    /// directories, and the country index lists only regions that
    /// actually publish data this run.
    pub async fn build(&self, current: HourBucket) -> Result<Node> {
        let mut country = DirectoryNode::indexed(COUNTRY_DIRECTORY);

        let regions = self
            .store
            .regions(&self.category)
            .await
            .map_err(|source| ExportError::Regions { source })?;

        for region in regions {
            if let Some(filter) = &self.region_filter {
                if !filter.contains(&region) {
                    debug!(region = %region, "region outside allow-list, skipping");
                    continue;
                }
            }

            let buckets = self
                .store
                .list_buckets(&region, &self.category)
                .await
                .map_err(|source| ExportError::ListBuckets {
                    region: region.clone(),
                    source,
                })?;

            let eligible: Vec<HourBucket> =
                buckets.into_iter().filter(|b| *b != current).collect();
            if eligible.is_empty() {
                debug!(region = %region, "no complete buckets, omitting region");
                continue;
            }

            let mut hour = DirectoryNode::indexed(HOUR_DIRECTORY);
            for bucket in eligible {
                let records = self
                    .store
                    .fetch_records(&region, bucket, &self.category)
                    .await
                    .map_err(|source| ExportError::FetchRecords {
                        region: region.clone(),
                        bucket,
                        source,
                    })?;
                hour.push(FileNode::new(bucket.to_string(), encode_payload(&records)));
            }

            let mut region_dir = DirectoryNode::new(region.as_str());
            region_dir.push(hour);
            country.push(region_dir);
        }

        Ok(country.into())
    }
}
