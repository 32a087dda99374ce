//! Error types for export runs
//!
//! Any store or sink failure aborts the whole run: a tree with a
//! silently missing bucket is indistinguishable from data loss to
//! downstream consumers, so nothing is published instead.

use hourtree_core::{CoreError, HourBucket, Region};
use hourtree_storage::{SinkError, StoreError};
use thiserror::Error;

/// Failure of one export run, with enough context to tell collaborator
/// failures apart from programming errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Region enumeration failed at the record store boundary.
    #[error("record store failed enumerating regions: {source}")]
    Regions {
        #[source]
        source: StoreError,
    },

    /// Bucket listing failed for one region.
    #[error("record store failed listing buckets for region '{region}': {source}")]
    ListBuckets {
        region: Region,
        #[source]
        source: StoreError,
    },

    /// Record fetch failed for one (region, bucket).
    #[error("record store failed fetching region '{region}' bucket {bucket}: {source}")]
    FetchRecords {
        region: Region,
        bucket: HourBucket,
        #[source]
        source: StoreError,
    },

    /// Sink write failed while materializing.
    #[error("sink write failed: {source}")]
    Sink {
        #[source]
        source: SinkError,
    },

    /// The assembled tree was structurally invalid (duplicate or
    /// reserved child names).
    #[error("export tree invalid: {source}")]
    Tree {
        #[source]
        source: CoreError,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;
