// Export driver
//
// One run = assemble, prepare, materialize, reported as a unit. Either
// the whole tree reaches the sink or the run fails and nothing new
// counts as published. The sink owns not exposing half-written trees.

use futures_util::future::{try_join_all, BoxFuture, FutureExt};
use hourtree_core::{Category, DirectoryNode, HourBucket, Node, PathContext, PreparedNode, Region};
use hourtree_storage::{RecordStore, Sink};
use tracing::info;

use crate::builder::{PartitionTreeBuilder, HOUR_DIRECTORY};
use crate::error::{ExportError, Result};

/// Outcome of one completed export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Regions that published at least one bucket.
    pub regions: usize,
    /// Leaf payload files across all regions.
    pub leaves: usize,
    /// Total files written to the sink, artifacts included.
    pub files_written: usize,
}

/// Runs one export: builds the partition tree under the namespace root,
/// prepares it, and materializes it to the sink.
pub struct ExportDriver<'a> {
    store: &'a dyn RecordStore,
    sink: &'a dyn Sink,
    namespace: String,
    category: Category,
    region_filter: Option<Vec<Region>>,
}

impl<'a> ExportDriver<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        sink: &'a dyn Sink,
        namespace: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            store,
            sink,
            namespace: namespace.into(),
            category,
            region_filter: None,
        }
    }

    pub fn with_region_filter(mut self, regions: Vec<Region>) -> Self {
        self.region_filter = Some(regions);
        self
    }

    /// Run one export. The current bucket is sampled exactly once here,
    /// so every exclusion decision in the run shares the same basis.
    pub async fn run(&self) -> Result<ExportSummary> {
        self.run_at(HourBucket::current()).await
    }

    /// Run with an explicit current bucket (what [`run`](Self::run)
    /// samples for you). Exposed so callers and tests can pin the
    /// exclusion boundary.
    pub async fn run_at(&self, current: HourBucket) -> Result<ExportSummary> {
        info!(namespace = %self.namespace, category = %self.category, current = %current, "export run starting");

        let mut builder = PartitionTreeBuilder::new(self.store, self.category.clone());
        if let Some(filter) = &self.region_filter {
            builder = builder.with_region_filter(filter.clone());
        }
        let country = builder.build(current).await?;
        let (regions, leaves) = count_partitions(&country);

        let mut root = DirectoryNode::new(&self.namespace);
        root.push(country);

        let prepared = Node::from(root)
            .prepare(&PathContext::root())
            .map_err(|source| ExportError::Tree { source })?;

        let files_written = materialize(prepared, self.sink).await?;

        info!(regions, leaves, files_written, "export run complete");
        Ok(ExportSummary {
            regions,
            leaves,
            files_written,
        })
    }
}

fn count_partitions(country: &Node) -> (usize, usize) {
    let Some(country) = country.as_directory() else {
        return (0, 0);
    };
    let regions = country.children().len();
    let leaves = country
        .children()
        .iter()
        .filter_map(Node::as_directory)
        .flat_map(|region| region.children())
        .filter(|child| child.name() == HOUR_DIRECTORY)
        .filter_map(Node::as_directory)
        .map(|hour| hour.children().len())
        .sum();
    (regions, leaves)
}

/// Write a prepared subtree. Sibling subtrees go out concurrently; a
/// directory counts as done only after all of its children are written.
fn materialize(node: PreparedNode, sink: &dyn Sink) -> BoxFuture<'_, Result<usize>> {
    async move {
        match node {
            PreparedNode::File(file) => {
                sink.write(&file.path, file.bytes)
                    .await
                    .map_err(|source| ExportError::Sink { source })?;
                Ok(1)
            }
            PreparedNode::Directory(dir) => {
                let written = try_join_all(
                    dir.children
                        .into_iter()
                        .map(|child| materialize(child, sink)),
                )
                .await?;
                Ok(written.into_iter().sum())
            }
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hourtree_core::Record;
    use hourtree_storage::{MemoryRecordStore, SinkError};
    use parking_lot::Mutex;
    use std::collections::BTreeMap;

    /// Sink double capturing every write.
    #[derive(Default)]
    struct CaptureSink {
        writes: Mutex<BTreeMap<String, Vec<u8>>>,
    }

    impl CaptureSink {
        fn paths(&self) -> Vec<String> {
            self.writes.lock().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl Sink for CaptureSink {
        async fn write(&self, path: &str, bytes: Vec<u8>) -> std::result::Result<(), SinkError> {
            self.writes.lock().insert(path.to_string(), bytes);
            Ok(())
        }
    }

    /// Sink double that always fails.
    struct BrokenSink;

    #[async_trait]
    impl Sink for BrokenSink {
        async fn write(&self, path: &str, _bytes: Vec<u8>) -> std::result::Result<(), SinkError> {
            Err(SinkError::unavailable(
                path,
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "gone"),
            ))
        }
    }

    fn populated_store(category: &Category, current: HourBucket) -> MemoryRecordStore {
        let store = MemoryRecordStore::new();
        store.save_records(
            vec![Record::new(Region::new("DE"), b"old".to_vec())],
            HourBucket::from_index(current.index() - 10),
            category,
        );
        store.save_records(
            vec![Record::new(Region::new("DE"), b"new".to_vec())],
            HourBucket::from_index(current.index() - 1),
            category,
        );
        store.save_records(
            vec![Record::new(Region::new("DE"), b"open".to_vec())],
            current,
            category,
        );
        store
    }

    #[tokio::test]
    async fn run_materializes_the_full_tree() {
        let category = Category::new("pcr");
        let current = HourBucket::from_index(473_702);
        let store = populated_store(&category, current);
        let sink = CaptureSink::default();

        let summary = ExportDriver::new(&store, &sink, "export", category)
            .run_at(current)
            .await
            .unwrap();

        assert_eq!(summary.regions, 1);
        assert_eq!(summary.leaves, 2);
        assert_eq!(summary.files_written, 6);

        let paths = sink.paths();
        assert_eq!(
            paths,
            vec![
                "export/country/DE/hour/473692".to_string(),
                "export/country/DE/hour/473701".to_string(),
                "export/country/DE/hour/index".to_string(),
                "export/country/DE/hour/index.checksum".to_string(),
                "export/country/index".to_string(),
                "export/country/index.checksum".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn empty_store_publishes_only_country_artifacts() {
        let store = MemoryRecordStore::new();
        let sink = CaptureSink::default();

        let summary = ExportDriver::new(&store, &sink, "export", Category::new("pcr"))
            .run_at(HourBucket::from_index(473_702))
            .await
            .unwrap();

        assert_eq!(summary.regions, 0);
        assert_eq!(summary.leaves, 0);
        assert_eq!(
            sink.paths(),
            vec![
                "export/country/index".to_string(),
                "export/country/index.checksum".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn sink_failure_fails_the_run() {
        let category = Category::new("pcr");
        let current = HourBucket::from_index(473_702);
        let store = populated_store(&category, current);

        let err = ExportDriver::new(&store, &BrokenSink, "export", category)
            .run_at(current)
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Sink { .. }));
    }

    #[tokio::test]
    async fn region_filter_reaches_the_builder() {
        let category = Category::new("pcr");
        let current = HourBucket::from_index(473_702);
        let store = MemoryRecordStore::new();
        store.save_records(
            vec![
                Record::new(Region::new("DE"), b"a".to_vec()),
                Record::new(Region::new("FR"), b"b".to_vec()),
            ],
            HourBucket::from_index(current.index() - 1),
            &category,
        );
        let sink = CaptureSink::default();

        let summary = ExportDriver::new(&store, &sink, "export", category)
            .with_region_filter(vec![Region::new("FR")])
            .run_at(current)
            .await
            .unwrap();

        assert_eq!(summary.regions, 1);
        assert!(sink.paths().iter().all(|p| !p.contains("/DE/")));
    }
}
