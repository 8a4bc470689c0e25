//! The storage engine API for the [`densearr`](https://docs.rs/densearr/latest/densearr/index.html) crate.
//!
//! A storage engine persists array objects and exposes a small set of atomic-per-call primitives:
//! object creation and description, open/close, a *range write* committed at a logical timestamp,
//! and a *range read as of a logical timestamp*.
//! Engines also hold per-object key/value metadata versioned by the same timestamps.
//!
//! This crate includes an in-memory engine, [`MemoryEngine`](store::MemoryEngine).
//!
//! ## Licence
//! `densearr_storage` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod config;
mod engine;
mod metadata_value;
mod object;
pub mod storage_adapter;
pub mod store;
mod version_chain;

use std::ops::RangeInclusive;

use thiserror::Error;

pub use config::{EngineConfig, PlatformConfig, PlatformCreateConfig, PlatformDimensionConfig};
pub use engine::StorageEngine;
pub use metadata_value::MetadataValue;
pub use object::{
    DimensionDescriptor, DimensionLayout, EngineHandle, ObjectDescriptor, ObjectKind,
    ObjectLayout, OpenMode,
};
pub use version_chain::VersionChain;

/// A logical timestamp.
///
/// Every write commits as of exactly one timestamp, and every read observes the writes with a timestamp less than or equal to its own.
pub type Timestamp = u64;

/// The type for bytes used in range reads and writes.
///
/// An alias for [`bytes::Bytes`].
pub type Bytes = bytes::Bytes;

/// An inclusive range of cell coordinates along one dimension.
///
/// Coordinates are signed so that invalid (negative) coordinates reach the engine and are rejected there.
pub type CellRange = RangeInclusive<i64>;

/// An iterator over the chunks of a range read.
///
/// Each chunk holds the next run of cells of the region in row-major (C) order.
pub type ReadChunks<'a> = Box<dyn Iterator<Item = Result<Bytes, StorageError>> + Send + 'a>;

/// Return the current wall-clock time as a [`Timestamp`] in milliseconds since the Unix epoch.
#[must_use]
pub fn wall_clock_timestamp() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |duration| {
            Timestamp::try_from(duration.as_millis()).unwrap_or(Timestamp::MAX)
        })
}

/// A storage error.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// No object exists at the URI.
    #[error("no object exists at {0}")]
    NotFound(String),
    /// An object already exists at the URI.
    #[error("an object of kind {1} already exists at {0}")]
    AlreadyExists(String, ObjectKind),
    /// A coordinate is outside of the domain of a dimension.
    #[error("coordinates {lo}..={hi} are out of the domain 0..={max} of dimension {dimension}")]
    OutOfDomain {
        /// The dimension name.
        dimension: String,
        /// The requested lower bound.
        lo: i64,
        /// The requested upper bound.
        hi: i64,
        /// The largest valid coordinate.
        max: i64,
    },
    /// A region with an unexpected dimensionality.
    #[error("region has dimensionality {0}, expected {1}")]
    IncompatibleDimensionality(usize, usize),
    /// The number of bytes written does not match the region.
    #[error("got {0} bytes for a region of {1} bytes")]
    InvalidWriteSize(usize, u64),
    /// Another write handle is open on the object.
    #[error("a writer is already open on {0}")]
    WriterConflict(String),
    /// The operation is not permitted by the open mode of the handle.
    #[error("operation requires {expected} mode, the handle is open in {actual} mode")]
    InvalidMode {
        /// The mode required by the operation.
        expected: OpenMode,
        /// The mode of the handle.
        actual: OpenMode,
    },
    /// The handle is not open.
    #[error("handle {0} is not open")]
    HandleClosed(u64),
    /// An invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An error parsing a persisted document.
    #[error("error parsing metadata for {0}: {1}")]
    InvalidMetadata(String, String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
