// hourtree-storage - I/O boundaries
//
// The assembly engine never touches persistence or object storage
// directly; it consumes these two seams:
// - Sink: destination for materialized trees (OpenDAL: fs/s3/memory)
// - RecordStore: adapter over the store holding raw records

pub mod record_store;
pub mod sink;

pub use record_store::{MemoryRecordStore, RecordStore, StoreError};
pub use sink::{OperatorSink, Sink, SinkError};
