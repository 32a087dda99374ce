// Sink boundary for materialized trees
//
// Implementations:
// - OperatorSink (OpenDAL: filesystem, S3, memory)
// - test doubles in the assembly crate

use async_trait::async_trait;
use opendal::Operator;
use thiserror::Error;
use tracing::trace;

/// Error kind for unreachable or failing sinks. Retry policy lives with
/// the caller of the export driver, not here.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink unavailable writing '{path}': {source}")]
    Unavailable {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SinkError {
    pub fn unavailable(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unavailable {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

/// Destination for materialized export trees.
///
/// Writes must have idempotent overwrite semantics: a rerun may publish
/// the same path again with identical bytes.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn write(&self, path: &str, bytes: Vec<u8>) -> Result<(), SinkError>;
}

/// Sink over an OpenDAL operator, covering every backend the operator
/// was built for.
pub struct OperatorSink {
    operator: Operator,
}

impl OperatorSink {
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }
}

#[async_trait]
impl Sink for OperatorSink {
    async fn write(&self, path: &str, bytes: Vec<u8>) -> Result<(), SinkError> {
        trace!(path, len = bytes.len(), "sink write");
        self.operator
            .write(path, bytes)
            .await
            .map_err(|source| SinkError::unavailable(path, source))?;
        Ok(())
    }
}
