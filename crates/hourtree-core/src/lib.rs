// hourtree-core - pure assembly logic
//
// Time bucketing, index checksums, and the two-phase export tree.
// No I/O, no async, no runtime dependencies: everything in this crate
// is deterministic for the same input, which is what makes two export
// runs over the same stored data byte-identical.

pub mod bucket;
pub mod checksum;
pub mod error;
pub mod node;
pub mod types;

// Re-export commonly used types
pub use bucket::HourBucket;
pub use checksum::Checksum;
pub use error::CoreError;
pub use node::{
    DirectoryNode, FileNode, Node, PathContext, PreparedDirectory, PreparedFile, PreparedNode,
    CHECKSUM_FILE_NAME, INDEX_FILE_NAME,
};
pub use types::{Category, Record, Region};
