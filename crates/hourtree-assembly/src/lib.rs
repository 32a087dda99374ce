// hourtree-assembly - export run orchestration
//
// PartitionTreeBuilder turns stored records into the published
// region/hour tree; ExportDriver runs the two-phase build (prepare,
// then materialize) against a sink, as a unit with no partial success.

pub mod builder;
pub mod driver;
pub mod error;
pub mod payload;

pub use builder::PartitionTreeBuilder;
pub use driver::{ExportDriver, ExportSummary};
pub use error::ExportError;
