// hourtree - hierarchical time-partitioned export assembly
//
// Converts timestamped, region-tagged records into a published directory
// tree of payload files with index and checksum artifacts, withholding
// the still-open hour bucket. This crate re-exports the public surface
// of the workspace crates.

pub use hourtree_assembly::{ExportDriver, ExportError, ExportSummary, PartitionTreeBuilder};
pub use hourtree_config::{ExportConfig, StorageBackend};
pub use hourtree_core::{
    Category, Checksum, DirectoryNode, FileNode, HourBucket, Node, PathContext, PreparedNode,
    Record, Region,
};
pub use hourtree_storage::{MemoryRecordStore, OperatorSink, RecordStore, Sink};
