//! Error types for tree assembly

use thiserror::Error;

/// Errors raised while preparing an export tree.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two children under one directory resolved to the same name. The
    /// index for that directory would be ambiguous, so prepare refuses
    /// the tree.
    #[error("duplicate child name '{name}' under '{parent}'")]
    DuplicateChild { parent: String, name: String },

    /// A child collides with a reserved artifact name (`index` or
    /// `index.checksum`) of an indexed directory.
    #[error("child name '{name}' under '{parent}' is reserved for index artifacts")]
    ReservedChildName { parent: String, name: String },
}
