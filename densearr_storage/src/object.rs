use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// The kind of an object held by a storage engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A dense array: every coordinate of the domain is addressable.
    #[display("dense array")]
    DenseArray,
    /// A sparse array: only written coordinates are stored.
    #[display("sparse array")]
    SparseArray,
    /// A collection of other objects.
    #[display("collection")]
    Collection,
}

/// The mode an object is opened in.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Read mode.
    #[display("read")]
    Read,
    /// Write mode.
    #[display("write")]
    Write,
}

/// The requested layout of one dimension of a new object.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DimensionLayout {
    /// The dimension name.
    pub name: String,
    /// The number of cells along the dimension. Valid coordinates are `0..size`.
    pub size: u64,
}

/// The requested layout of a new object.
///
/// `document` is opaque to the engine: it is persisted at creation and returned verbatim by
/// [`describe_object`](crate::StorageEngine::describe_object).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectLayout {
    /// The object kind.
    pub kind: ObjectKind,
    /// The dimensions.
    pub dimensions: Vec<DimensionLayout>,
    /// The size in bytes of one cell.
    pub cell_size: usize,
    /// The caller's schema document.
    pub document: serde_json::Value,
}

/// A dimension of a persisted object.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DimensionDescriptor {
    /// The dimension name.
    pub name: String,
    /// The number of cells along the dimension.
    pub size: u64,
    /// The tile extent chosen by the engine.
    pub tile: u64,
}

impl DimensionDescriptor {
    /// Return the largest valid coordinate along this dimension.
    #[must_use]
    pub fn max_coordinate(&self) -> i64 {
        i64::try_from(self.size).map_or(i64::MAX, |size| size - 1)
    }
}

/// A persisted object as described by a storage engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// The object kind.
    pub kind: ObjectKind,
    /// The dimensions.
    pub dimensions: Vec<DimensionDescriptor>,
    /// The size in bytes of one cell.
    pub cell_size: usize,
    /// The caller's schema document.
    pub document: serde_json::Value,
    /// The timestamp the object was created at.
    pub created_at: Timestamp,
}

/// An engine-side handle to an open object.
///
/// A handle is bound to a single timestamp: reads observe writes committed at or before it, and writes commit at it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineHandle {
    id: u64,
    uri: String,
    mode: OpenMode,
    timestamp: Timestamp,
    read_buffer_bytes: u64,
}

impl EngineHandle {
    /// Create a new engine handle.
    ///
    /// This is intended for [`StorageEngine`](crate::StorageEngine) implementations.
    #[must_use]
    pub fn new(
        id: u64,
        uri: String,
        mode: OpenMode,
        timestamp: Timestamp,
        read_buffer_bytes: u64,
    ) -> Self {
        Self {
            id,
            uri,
            mode,
            timestamp,
            read_buffer_bytes,
        }
    }

    /// Return the engine-assigned handle identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Return the URI of the object.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Return the open mode.
    #[must_use]
    pub const fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Return the bound timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Return the byte budget of a single read pass.
    #[must_use]
    pub const fn read_buffer_bytes(&self) -> u64 {
        self.read_buffer_bytes
    }
}
