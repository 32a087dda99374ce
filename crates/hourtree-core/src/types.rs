//! Shared domain types

use std::fmt;

/// First-level partition key: an opaque short code (ISO country style).
///
/// Immutable once attached to a record; syntax validation happens
/// upstream of this crate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Region(String);

impl Region {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Label partitioning records orthogonally to region and bucket, e.g. a
/// submission type. Opaque key throughout the builder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category(String);

impl Category {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unit of raw input data: opaque payload bytes tagged with a region.
///
/// Created by an external producer, persisted by the record store, never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    region: Region,
    payload: Vec<u8>,
}

impl Record {
    pub fn new(region: Region, payload: Vec<u8>) -> Self {
        Self { region, payload }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
